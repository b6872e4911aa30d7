use courier::files::FileStore;
use courier::http::request::{Body, Method, Request, RequestBuilder};
use courier::http::response::StatusCode;
use courier::http::router::{Route, Router};
use courier::http::writer::serialize_response;
use flate2::read::GzDecoder;
use std::io::Read;
use tempfile::TempDir;

fn router() -> (Router, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let router = Router::new(FileStore::new(dir.path()).unwrap());
    (router, dir)
}

fn get(path: &str) -> RequestBuilder {
    RequestBuilder::new().method(Method::GET).path(path)
}

fn post(path: &str, body: Body) -> Request {
    RequestBuilder::new()
        .method(Method::POST)
        .path(path)
        .body(body)
        .build()
        .unwrap()
}

#[test]
fn test_route_table() {
    assert_eq!(Route::resolve(&Method::GET, "/"), Route::Home);
    assert_eq!(Route::resolve(&Method::GET, "/echo/abc"), Route::Echo("abc"));
    assert_eq!(Route::resolve(&Method::GET, "/echo/"), Route::Echo(""));
    assert_eq!(Route::resolve(&Method::GET, "/user-agent"), Route::UserAgent);
    assert_eq!(Route::resolve(&Method::GET, "/files/a.txt"), Route::ReadFile("a.txt"));
    assert_eq!(Route::resolve(&Method::POST, "/files/a.txt"), Route::WriteFile("a.txt"));
    assert_eq!(Route::resolve(&Method::POST, "/"), Route::Unmatched);
    assert_eq!(Route::resolve(&Method::GET, "/echo"), Route::Unmatched);
    assert_eq!(Route::resolve(&Method::GET, "/user-agent/x"), Route::Unmatched);
    assert_eq!(Route::resolve(&Method::PUT, "/files/a.txt"), Route::Unmatched);
    assert_eq!(
        Route::resolve(&Method::Other("BREW".into()), "/"),
        Route::Unmatched
    );
}

#[tokio::test]
async fn test_home() {
    let (router, _dir) = router();
    let response = router.handle(&get("/").build().unwrap()).await;

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body, b"Welcome Home...".to_vec());
    assert_eq!(response.header("Content-Type"), Some("text/plain"));
    assert!(!response.close);
}

#[tokio::test]
async fn test_echo_plain() {
    let (router, _dir) = router();
    let response = router.handle(&get("/echo/hello%20world!").build().unwrap()).await;

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.body, b"hello%20world!".to_vec());
    assert_eq!(response.header("Content-Encoding"), None);
}

#[tokio::test]
async fn test_echo_empty_value() {
    let (router, _dir) = router();
    let response = router.handle(&get("/echo/").build().unwrap()).await;

    assert_eq!(response.status, StatusCode::Ok);
    assert!(response.body.is_empty());

    let wire = String::from_utf8(serialize_response(&response)).unwrap();
    assert!(wire.contains("Content-Length: 0\r\n"));
    assert!(wire.ends_with("\r\n\r\n"));
}

#[tokio::test]
async fn test_echo_gzip() {
    let (router, _dir) = router();
    let req = get("/echo/banana")
        .header("Accept-Encoding", "deflate, gzip")
        .build()
        .unwrap();
    let response = router.handle(&req).await;

    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.header("Content-Encoding"), Some("gzip"));
    assert_eq!(response.header("Content-Type"), Some("text/plain"));

    let mut decoded = String::new();
    GzDecoder::new(&response.body[..])
        .read_to_string(&mut decoded)
        .unwrap();
    assert_eq!(decoded, "banana");
}

#[tokio::test]
async fn test_echo_unsupported_encoding() {
    let (router, _dir) = router();
    let req = get("/echo/banana")
        .header("Accept-Encoding", "invalid-encoding")
        .build()
        .unwrap();
    let response = router.handle(&req).await;

    assert_eq!(response.header("Content-Encoding"), None);
    assert_eq!(response.body, b"banana".to_vec());
}

#[tokio::test]
async fn test_user_agent_any_case() {
    let (router, _dir) = router();

    for name in ["User-Agent", "USER-AGENT", "user-agent"] {
        let req = get("/user-agent").header(name, "foobar/1.2.3").build().unwrap();
        let response = router.handle(&req).await;
        assert_eq!(response.body, b"foobar/1.2.3".to_vec());
    }
}

#[tokio::test]
async fn test_user_agent_missing() {
    let (router, _dir) = router();
    let response = router.handle(&get("/user-agent").build().unwrap()).await;

    assert_eq!(response.status, StatusCode::Ok);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_post_then_get_file() {
    let (router, dir) = router();

    let created = router
        .handle(&post("/files/foo.txt", Body::Complete(b"file body".to_vec())))
        .await;
    assert_eq!(created.status, StatusCode::Created);
    assert!(created.body.is_empty());
    assert!(!created.close);
    assert!(dir.path().join("foo.txt").exists());

    let fetched = router.handle(&get("/files/foo.txt").build().unwrap()).await;
    assert_eq!(fetched.status, StatusCode::Ok);
    assert_eq!(fetched.body, b"file body".to_vec());
    assert_eq!(
        fetched.header("Content-Type"),
        Some("application/octet-stream")
    );
}

#[tokio::test]
async fn test_get_missing_file() {
    let (router, _dir) = router();
    let response = router.handle(&get("/files/nothing_here").build().unwrap()).await;

    assert_eq!(response.status, StatusCode::NotFound);
    assert!(response.body.is_empty());
    assert!(!response.close);
}

#[tokio::test]
async fn test_get_traversal_is_not_found() {
    let (router, _dir) = router();
    let response = router.handle(&get("/files/../../etc/passwd").build().unwrap()).await;

    assert_eq!(response.status, StatusCode::NotFound);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_post_invalid_content_length() {
    let (router, _dir) = router();

    for body in [Body::InvalidLength("abc".into()), Body::Absent] {
        let response = router.handle(&post("/files/x", body)).await;
        assert_eq!(response.status, StatusCode::BadRequest);
        assert_eq!(response.body, b"Invalid Content-Length".to_vec());
        assert!(response.close);
    }
}

#[tokio::test]
async fn test_post_short_body() {
    let (router, dir) = router();
    let response = router
        .handle(&post("/files/x", Body::Truncated { expected: 10, received: 2 }))
        .await;

    assert_eq!(response.status, StatusCode::BadRequest);
    assert!(response.close);
    assert!(!dir.path().join("x").exists());
}

#[tokio::test]
async fn test_post_traversal_is_bad_request() {
    let (router, _dir) = router();
    let response = router
        .handle(&post("/files/../escape", Body::Complete(b"x".to_vec())))
        .await;

    assert_eq!(response.status, StatusCode::BadRequest);
    assert_eq!(response.body, b"Invalid file name".to_vec());
    assert!(response.close);
}

#[tokio::test]
async fn test_post_write_failure() {
    let (router, _dir) = router();
    let response = router
        .handle(&post("/files/no/such/dir.txt", Body::Complete(b"x".to_vec())))
        .await;

    assert_eq!(response.status, StatusCode::InternalServerError);
    assert!(response.close);
}

#[tokio::test]
async fn test_unmatched_route() {
    let (router, _dir) = router();
    let response = router.handle(&get("/nowhere").build().unwrap()).await;

    assert_eq!(response.status, StatusCode::NotFound);
    assert_eq!(response.body, b"Not found".to_vec());
    assert!(!response.close);
}

#[tokio::test]
async fn test_unmatched_route_can_close() {
    let (router, _dir) = router();
    let router = router.close_on_not_found(true);
    let response = router.handle(&get("/nowhere").build().unwrap()).await;

    assert!(response.close);

    // Missing files are not unmatched routes
    let response = router.handle(&get("/files/missing").build().unwrap()).await;
    assert!(!response.close);
}

#[tokio::test]
async fn test_connection_close_header() {
    let (router, _dir) = router();

    for path in ["/", "/echo/x", "/user-agent", "/files/missing", "/nowhere"] {
        let req = get(path).header("Connection", "close").build().unwrap();
        assert!(router.handle(&req).await.close, "{path} should close");
    }
}

#[tokio::test]
async fn test_framing_error_closes_any_route() {
    let (router, _dir) = router();
    let req = get("/")
        .body(Body::InvalidLength("zz".into()))
        .build()
        .unwrap();
    let response = router.handle(&req).await;

    assert_eq!(response.status, StatusCode::Ok);
    assert!(response.close);
}
