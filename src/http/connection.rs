use anyhow::Context;
use bytes::{Buf, BytesMut};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::time::timeout;

use crate::http::parser::{parse_request_head, ParseError};
use crate::http::request::{Body, ContentLength, Request};
use crate::http::router::Router;
use crate::http::writer::ResponseWriter;

/// Per-connection limits and deadlines.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Deadline for each read from the client; `None` waits forever
    pub read_timeout: Option<Duration>,
    /// Deadline for writing one whole response; `None` waits forever
    pub write_timeout: Option<Duration>,
    /// Largest request head accepted before the connection is dropped
    pub max_header_bytes: usize,
    /// Largest declared body that will be read
    pub max_body_bytes: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            read_timeout: None,
            write_timeout: None,
            max_header_bytes: 8 * 1024,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    router: Arc<Router>,
    settings: ConnectionSettings,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter, bool), // bool = keep_alive?
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, router: Arc<Router>, settings: ConnectionSettings) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(4096),
            router,
            settings,
            state: ConnectionState::Reading,
        }
    }

    /// Serves requests until the client closes, asks to close, or a
    /// connection-level failure occurs.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => match self.read_request().await? {
                    Some(req) => {
                        self.state = ConnectionState::Processing(req);
                    }
                    None => {
                        self.state = ConnectionState::Closed;
                    }
                },

                ConnectionState::Processing(req) => {
                    let response = self.router.handle(req).await;

                    let writer = ResponseWriter::new(&response);
                    self.state = ConnectionState::Writing(writer, !response.close);
                }

                ConnectionState::Writing(writer, keep_alive) => {
                    let write = writer.write_to_stream(&mut self.stream);
                    match self.settings.write_timeout {
                        Some(limit) => timeout(limit, write).await.context("Write timeout")??,
                        None => write.await?,
                    }

                    if *keep_alive {
                        self.state = ConnectionState::Reading; // go back for next request
                    } else {
                        self.state = ConnectionState::Closed;
                    }
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Reads one request: the head, then whatever body `content-length`
    /// declares.
    ///
    /// Returns `Ok(None)` when the client closed, or went idle past the read
    /// deadline, between requests.
    /// A head that is malformed, too large, or cut off is an error and no
    /// response is attempted.
    pub async fn read_request(&mut self) -> anyhow::Result<Option<Request>> {
        let mut request = loop {
            // Try parsing whatever we already have
            match parse_request_head(&self.buffer) {
                Ok((request, consumed)) => {
                    self.buffer.advance(consumed);
                    break request;
                }

                Err(ParseError::Incomplete) => {
                    if self.buffer.len() > self.settings.max_header_bytes {
                        return Err(ParseError::HeadTooLarge(self.settings.max_header_bytes))
                            .context("HTTP parse error");
                    }
                }

                Err(e) => {
                    return Err(e).context("HTTP parse error");
                }
            }

            match self.fill_buffer().await? {
                Some(0) if self.buffer.is_empty() => {
                    // Client closed connection
                    return Ok(None);
                }
                Some(0) => anyhow::bail!(
                    "connection closed mid-request with {} bytes buffered",
                    self.buffer.len()
                ),
                Some(_) => {}
                None if self.buffer.is_empty() => {
                    tracing::debug!("Idle connection timed out");
                    return Ok(None);
                }
                None => anyhow::bail!("Read timeout"),
            }
        };

        request.body = self.read_body(request.content_length()).await?;
        Ok(Some(request))
    }

    async fn read_body(&mut self, length: ContentLength) -> anyhow::Result<Body> {
        let expected = match length {
            ContentLength::Absent => return Ok(Body::Absent),
            ContentLength::Invalid(raw) => return Ok(Body::InvalidLength(raw)),
            ContentLength::Valid(n) => n,
        };

        if expected > self.settings.max_body_bytes {
            return Ok(Body::TooLarge(expected));
        }

        while self.buffer.len() < expected {
            match self.fill_buffer().await? {
                Some(0) => {
                    let received = self.buffer.len();
                    self.buffer.clear();
                    return Ok(Body::Truncated { expected, received });
                }
                Some(_) => {}
                None => anyhow::bail!("Read timeout"),
            }
        }

        Ok(Body::Complete(self.buffer.split_to(expected).to_vec()))
    }

    /// Reads more bytes from the stream into the buffer.
    ///
    /// `Some(0)` means EOF and `None` means the read deadline passed.
    async fn fill_buffer(&mut self) -> anyhow::Result<Option<usize>> {
        self.buffer.reserve(1024);

        let read = self.stream.read_buf(&mut self.buffer);
        let n = match self.settings.read_timeout {
            Some(limit) => match timeout(limit, read).await {
                Ok(n) => n?,
                Err(_) => return Ok(None),
            },
            None => read.await?,
        };

        Ok(Some(n))
    }
}
