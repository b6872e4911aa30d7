use crate::http::request::{Body, Method, Request};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("request line needs method, target and version")]
    InvalidRequestLine,
    #[error("request head exceeds {0} bytes")]
    HeadTooLarge(usize),
    #[error("request head is incomplete")]
    Incomplete,
}

/// Parses the request line and header block at the start of `buf`.
///
/// Returns the request (with [`Body::Absent`]) and the number of bytes the
/// head occupied, so the caller can read the body from what follows.
/// Header lines without a colon are skipped rather than rejected, and bytes
/// that are not UTF-8 are decoded lossily instead of failing the request.
pub fn parse_request_head(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let mut pos = 0;

    // Request line
    let request_line = next_line(buf, &mut pos).ok_or(ParseError::Incomplete)?;
    let request_line = String::from_utf8_lossy(request_line);

    let parts: Vec<&str> = request_line.trim().split(' ').collect();
    if parts.len() < 3 {
        return Err(ParseError::InvalidRequestLine);
    }

    let method = Method::parse(parts[0]);
    let path = parts[1];
    let version = parts[2];

    // Headers
    let mut headers = HashMap::new();

    loop {
        let line = next_line(buf, &mut pos)
            .ok_or(ParseError::Incomplete)?
            .trim_ascii();

        if line.is_empty() {
            break;
        }

        // Split on the raw bytes; obs-text values are kept, not rejected
        match line.iter().position(|&b| b == b':') {
            Some(colon) => {
                let key = String::from_utf8_lossy(&line[..colon]);
                let value = String::from_utf8_lossy(&line[colon + 1..]);
                headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
            }
            None => tracing::trace!(
                line = %String::from_utf8_lossy(line),
                "Skipping header line without colon"
            ),
        }
    }

    let request = Request {
        method,
        path: path.to_string(),
        version: version.to_string(),
        headers,
        body: Body::Absent,
    };

    Ok((request, pos))
}

/// Returns the next `\n`-terminated line starting at `pos`, without the
/// terminator or a trailing `\r`, and advances `pos` past it.
fn next_line<'a>(buf: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
    let rest = &buf[*pos..];
    let end = rest.iter().position(|&b| b == b'\n')?;
    *pos += end + 1;

    let line = &rest[..end];
    Some(line.strip_suffix(b"\r").unwrap_or(line))
}
