//! Request routing and the fixed handler set.
//!
//! [`Route::resolve`] is the routing table; [`Router::handle`] runs the
//! matched handler and then decides whether the connection survives.

use crate::files::FileStore;
use crate::http::encoding::{self, ContentEncoding};
use crate::http::request::{Body, Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};

const GREETING: &str = "Welcome Home...";

/// A matched entry of the routing table, borrowing path captures from the
/// request target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// GET `/`
    Home,
    /// GET `/echo/{value}`
    Echo(&'a str),
    /// GET `/user-agent`
    UserAgent,
    /// GET `/files/{name}`
    ReadFile(&'a str),
    /// POST `/files/{name}`
    WriteFile(&'a str),
    /// Anything else
    Unmatched,
}

impl<'a> Route<'a> {
    /// Matches a method and target against the routing table, first match
    /// wins.
    pub fn resolve(method: &Method, path: &'a str) -> Self {
        match method {
            Method::GET => {
                if path == "/" {
                    Route::Home
                } else if let Some(value) = path.strip_prefix("/echo/") {
                    Route::Echo(value)
                } else if path == "/user-agent" {
                    Route::UserAgent
                } else if let Some(name) = path.strip_prefix("/files/") {
                    Route::ReadFile(name)
                } else {
                    Route::Unmatched
                }
            }
            Method::POST => match path.strip_prefix("/files/") {
                Some(name) => Route::WriteFile(name),
                None => Route::Unmatched,
            },
            _ => Route::Unmatched,
        }
    }
}

/// Dispatches parsed requests to handlers.
#[derive(Debug, Clone)]
pub struct Router {
    store: FileStore,
    close_on_not_found: bool,
}

impl Router {
    pub fn new(store: FileStore) -> Self {
        Self {
            store,
            close_on_not_found: false,
        }
    }

    /// Whether an unmatched route also ends the connection.
    pub fn close_on_not_found(mut self, close: bool) -> Self {
        self.close_on_not_found = close;
        self
    }

    /// Produces exactly one response for `req`. Never fails: every error
    /// path is answered with a status code.
    pub async fn handle(&self, req: &Request) -> Response {
        let route = Route::resolve(&req.method, &req.path);

        let mut response = match route {
            Route::Home => Response::ok(GREETING),
            Route::Echo(value) => self.echo(req, value),
            Route::UserAgent => Response::ok(req.header("user-agent").unwrap_or_default()),
            Route::ReadFile(name) => self.read_file(name).await,
            Route::WriteFile(name) => self.write_file(req, name).await,
            Route::Unmatched => Response::not_found(),
        };

        response.close = response.close
            || req.wants_close()
            || req.body.is_framing_error()
            || response.status.forces_close()
            || (route == Route::Unmatched && self.close_on_not_found);

        tracing::debug!(
            method = ?req.method,
            path = %req.path,
            status = response.status.as_u16(),
            close = response.close,
            "Request handled"
        );

        response
    }

    fn echo(&self, req: &Request, value: &str) -> Response {
        match encoding::negotiate(req.header("accept-encoding")) {
            Some(encoding) => encoded_text(encoding, value.as_bytes()),
            None => Response::ok(value),
        }
    }

    async fn read_file(&self, name: &str) -> Response {
        match self.store.read(name).await {
            Ok(data) => ResponseBuilder::new(StatusCode::Ok)
                .header("Content-Type", "application/octet-stream")
                .body(data)
                .build(),
            Err(e) => {
                tracing::debug!(file = name, error = %e, "File read failed");
                ResponseBuilder::new(StatusCode::NotFound).build()
            }
        }
    }

    async fn write_file(&self, req: &Request, name: &str) -> Response {
        let data = match &req.body {
            Body::Complete(data) => data,
            Body::Absent | Body::InvalidLength(_) => {
                return Response::bad_request("Invalid Content-Length");
            }
            Body::TooLarge(_) | Body::Truncated { .. } => {
                return Response::bad_request("Failed to read body");
            }
        };

        match self.store.write(name, data).await {
            Ok(()) => {
                tracing::info!(file = name, bytes = data.len(), "File written");
                ResponseBuilder::new(StatusCode::Created).build()
            }
            Err(e) if e.is_rejected_name() => {
                tracing::warn!(file = name, error = %e, "Rejected file name");
                Response::bad_request("Invalid file name")
            }
            Err(e) => {
                tracing::error!(file = name, error = %e, "File write failed");
                Response::internal_error("Failed to write file")
            }
        }
    }
}

/// Builds a 200 text response whose body is encoded with `encoding`.
fn encoded_text(encoding: ContentEncoding, body: &[u8]) -> Response {
    match encoding.encode(body) {
        Ok(encoded) => ResponseBuilder::new(StatusCode::Ok)
            .header("Content-Type", "text/plain")
            .header("Content-Encoding", encoding.as_str())
            .body(encoded)
            .build(),
        Err(e) => {
            tracing::error!(encoding = encoding.as_str(), error = %e, "Body encoding failed");
            Response::internal_error("Failed to encode body")
        }
    }
}
