// # HTTP/1.0 Helpers
//
// Shared by the EZIP, DynDNS and DHS dialects.
//
// Requests are written by hand and replies are read until the server closes
// the connection. Only the first reply line is interpreted; there is no
// Content-Length handling.

use ezupdate_core::{ConnectionState, Error, RequestBuilder, Result, Transport, UpdateConfig};

use crate::user_agent;

/// Reply whose first line is not an HTTP status line
pub const STRANGE_RESPONSE: &str =
    "strange server response, are you connecting to the right server?";

/// Longest reason phrase kept from a status line
const MAX_REASON_LEN: usize = 255;

/// Numeric status and reason phrase of an HTTP reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub code: u16,
    pub reason: String,
}

/// Parse `HTTP/1.x NNN reason` from the start of a reply
///
/// Leading whitespace is skipped, the minor version may be any single
/// character, and at most three digits are read for the code.
pub fn parse_status_line(reply: &[u8]) -> Option<StatusLine> {
    let text = String::from_utf8_lossy(reply);
    let rest = text.trim_start().strip_prefix("HTTP/1.")?;

    let mut chars = rest.chars();
    chars.next()?;
    let rest = chars.as_str().trim_start();

    let digits: String = rest.chars().take(3).take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let code = digits.parse().ok()?;

    let reason: String = rest[digits.len()..]
        .trim_start_matches([' ', '\t'])
        .chars()
        .take_while(|&c| c != '\r' && c != '\n')
        .take(MAX_REASON_LEN)
        .collect();

    Some(StatusLine { code, reason })
}

/// Map a reply onto success, authentication failure or protocol error
///
/// Only 200 is a success; dialects with stricter criteria check the body
/// afterwards.
pub fn check_status(reply: &[u8]) -> Result<StatusLine> {
    let Some(status) = parse_status_line(reply) else {
        tracing::warn!("{}", STRANGE_RESPONSE);
        return Err(Error::protocol(None, STRANGE_RESPONSE));
    };

    tracing::debug!(code = status.code, reason = %status.reason, "server replied");

    match status.code {
        200 => Ok(status),
        401 => Err(Error::auth("authentication failure")),
        code => {
            tracing::warn!(code, "unknown return code, server response: {}", status.reason);
            Err(Error::protocol(
                Some(code),
                format!("{} {}", code, status.reason).trim_end().to_string(),
            ))
        }
    }
}

/// Append the headers every dialect sends
///
/// `Authorization`, `User-Agent` and `Host`, in that order. The blank line
/// ending the header block is left to the caller.
pub fn write_headers(request: &mut RequestBuilder, config: &UpdateConfig) -> Result<()> {
    request
        .line(&format!(
            "Authorization: Basic {}",
            config.credentials.basic_token()
        ))?
        .line(&format!("User-Agent: {}", user_agent()))?
        .line(&format!("Host: {}", config.server))?;
    Ok(())
}

/// Send a complete request and read the reply until the server closes
pub async fn exchange(
    transport: &dyn Transport,
    config: &UpdateConfig,
    request: &str,
) -> Result<Vec<u8>> {
    let mut conn = ConnectionState::open(transport, config).await?;

    // The request line never carries credentials; headers do
    let request_line = request.lines().next().unwrap_or_default();
    tracing::debug!(peer = conn.peer(), "sending {}", request_line);

    conn.send(request.as_bytes()).await?;
    let reply = conn.read_to_close().await?;

    tracing::trace!(bytes = reply.len(), "server output: {}", String::from_utf8_lossy(reply));
    Ok(reply.to_vec())
}
