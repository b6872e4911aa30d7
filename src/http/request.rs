use std::collections::HashMap;

/// HTTP request methods.
///
/// Only GET and POST are routed to handlers. `PUT`, `DELETE` and `HEAD` are
/// named so logs and callers can match on them, but the router answers them
/// exactly like `Other`: with a 404. Unknown tokens are kept as `Other`
/// instead of failing the parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// Any method token the server does not know about
    Other(String),
}

impl Method {
    /// Parses an HTTP method token.
    ///
    /// Matching is case-sensitive, as method tokens are.
    ///
    /// # Example
    ///
    /// ```
    /// # use courier::http::request::Method;
    /// assert_eq!(Method::parse("GET"), Method::GET);
    /// assert_eq!(Method::parse("get"), Method::Other("get".to_string()));
    /// ```
    pub fn parse(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "HEAD" => Method::HEAD,
            other => Method::Other(other.to_string()),
        }
    }
}

/// What the `content-length` header declared, before any body was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentLength {
    /// No `content-length` header
    Absent,
    /// A non-negative integer length
    Valid(usize),
    /// Header present but not a non-negative integer (raw value kept)
    Invalid(String),
}

/// Outcome of reading a request body off the connection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Body {
    /// No `content-length` header was sent
    #[default]
    Absent,
    /// Exactly the declared number of bytes
    Complete(Vec<u8>),
    /// `content-length` was not a non-negative integer
    InvalidLength(String),
    /// Declared length exceeds the configured body limit; nothing was read
    TooLarge(usize),
    /// The stream ended before the declared length arrived
    Truncated { expected: usize, received: usize },
}

impl Body {
    /// Body bytes, if the full declared body was read.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Body::Complete(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// True when the connection can no longer be trusted to start the next
    /// request at a message boundary.
    pub fn is_framing_error(&self) -> bool {
        matches!(
            self,
            Body::InvalidLength(_) | Body::TooLarge(_) | Body::Truncated { .. }
        )
    }
}

/// Represents a parsed HTTP request from a client.
///
/// Header names are lower-cased when the request is parsed, so every lookup
/// through [`Request::header`] is case-insensitive.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request target, verbatim (no percent-decoding)
    pub path: String,
    /// HTTP version token (typically "HTTP/1.1")
    pub version: String,
    /// Request headers keyed by lower-cased name
    pub headers: HashMap<String, String>,
    /// Request body, filled in by the connection after the head is parsed
    pub body: Body,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Option<Method>,
    path: Option<String>,
    version: Option<String>,
    headers: HashMap<String, String>,
    body: Body,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            path: None,
            version: None,
            headers: HashMap::new(),
            body: Body::Absent,
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Adds a header; the name is lower-cased like the parser does.
    pub fn header(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(key.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            path: self.path.ok_or("path missing")?,
            version: self.version.unwrap_or_else(|| "HTTP/1.1".to_string()),
            headers: self.headers,
            body: self.body,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    /// Retrieves a header value by name, ignoring case.
    ///
    /// # Example
    ///
    /// ```
    /// # use courier::http::request::{Method, RequestBuilder};
    /// let req = RequestBuilder::new()
    ///     .method(Method::GET)
    ///     .path("/")
    ///     .header("User-Agent", "curl/8.0")
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(req.header("USER-AGENT"), Some("curl/8.0"));
    /// ```
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// Interprets the `content-length` header.
    pub fn content_length(&self) -> ContentLength {
        match self.header("content-length") {
            None => ContentLength::Absent,
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) => ContentLength::Valid(n),
                Err(_) => ContentLength::Invalid(raw.to_string()),
            },
        }
    }

    /// True when the client asked for `Connection: close`.
    ///
    /// HTTP/1.1 connections are persistent by default, so anything else
    /// (including a missing header) keeps the connection open.
    pub fn wants_close(&self) -> bool {
        self.header("connection")
            .map(|v| v.eq_ignore_ascii_case("close"))
            .unwrap_or(false)
    }
}
