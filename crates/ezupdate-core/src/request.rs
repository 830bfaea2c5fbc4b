//! Capacity-tracking request assembly
//!
//! Requests are built into a fixed-capacity buffer. A piece that does not fit
//! fails the whole request with [`Error::RequestTooLarge`] instead of being
//! truncated, so a provider never receives a clipped host name or address.

use crate::error::{Error, Result};

/// Capacity used for every request unless a driver asks otherwise
pub const REQUEST_BUFFER_SIZE: usize = 4 * 1024 - 1;

/// Append-only request buffer with a hard capacity
///
/// ```rust
/// use ezupdate_core::RequestBuilder;
///
/// let mut request = RequestBuilder::new(64);
/// request.raw("GET /update?")?.param("host", "a.example.com")?.raw(" HTTP/1.0")?;
/// assert_eq!(request.as_str(), "GET /update?host=a.example.com& HTTP/1.0");
/// # Ok::<(), ezupdate_core::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    buf: String,
    capacity: usize,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new(REQUEST_BUFFER_SIZE)
    }
}

impl RequestBuilder {
    /// Create an empty builder holding at most `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: String::new(),
            capacity,
        }
    }

    /// Append text verbatim
    pub fn raw(&mut self, text: &str) -> Result<&mut Self> {
        self.push("request", &[text])
    }

    /// Append `key=value&`
    pub fn param(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        self.push(key, &[key, "=", value, "&"])
    }

    /// Append `key=value` with no trailing separator
    pub fn param_last(&mut self, key: &str, value: &str) -> Result<&mut Self> {
        self.push(key, &[key, "=", value])
    }

    /// Append `text` followed by CRLF
    pub fn line(&mut self, text: &str) -> Result<&mut Self> {
        self.push(first_word(text), &[text, "\r\n"])
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes still available
    pub fn remaining(&self) -> usize {
        self.capacity - self.buf.len()
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Consume the builder, returning the request text
    pub fn finish(self) -> String {
        self.buf
    }

    fn push(&mut self, field: &str, pieces: &[&str]) -> Result<&mut Self> {
        let needed: usize = pieces.iter().map(|p| p.len()).sum();
        if needed > self.remaining() {
            return Err(Error::RequestTooLarge {
                field: field.to_string(),
                capacity: self.capacity,
            });
        }

        for piece in pieces {
            self.buf.push_str(piece);
        }
        Ok(self)
    }
}

fn first_word(line: &str) -> &str {
    line.split(|c: char| c == ' ' || c == ':')
        .next()
        .filter(|word| !word.is_empty())
        .unwrap_or("line")
}
