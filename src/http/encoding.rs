//! Content-encoding negotiation and body encoders.
//!
//! Negotiation looks only at the `Accept-Encoding` value and returns at most
//! one encoding; any handler can consult it before building its body.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;

/// Encodings the server can apply to a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Gzip,
}

/// Encodings offered during negotiation, in server preference order.
pub const SUPPORTED: &[ContentEncoding] = &[ContentEncoding::Gzip];

impl ContentEncoding {
    /// Token used in `Accept-Encoding` and `Content-Encoding`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentEncoding::Gzip => "gzip",
        }
    }

    /// Encodes `body` with this encoding.
    pub fn encode(&self, body: &[u8]) -> std::io::Result<Vec<u8>> {
        match self {
            ContentEncoding::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(body)?;
                encoder.finish()
            }
        }
    }
}

/// Picks the encoding to apply given a client's `Accept-Encoding` value.
///
/// The value is split on commas and each token trimmed; a token must equal a
/// supported encoding exactly (case-sensitive, no `;q=` parameters).
///
/// ```
/// # use courier::http::encoding::{negotiate, ContentEncoding};
/// assert_eq!(negotiate(Some("deflate, gzip")), Some(ContentEncoding::Gzip));
/// assert_eq!(negotiate(Some("br")), None);
/// assert_eq!(negotiate(None), None);
/// ```
pub fn negotiate(accept_encoding: Option<&str>) -> Option<ContentEncoding> {
    let accepted = accept_encoding?;

    SUPPORTED.iter().copied().find(|encoding| {
        accepted
            .split(',')
            .any(|token| token.trim() == encoding.as_str())
    })
}
