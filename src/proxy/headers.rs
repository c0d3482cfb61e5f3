//! Client header intake and outbound request construction.

use std::io::{BufRead, Read};

use super::uri::ParsedUri;
use crate::error::{ProxyError, Result};

/// Longest accepted request or header line, terminator included.
pub const MAX_LINE: usize = 8192;

/// Most header lines accepted in one request.
pub const MAX_HEADER_LINES: usize = 100;

/// Fixed agent header sent on every forwarded request.
pub const USER_AGENT_HDR: &str =
    "User-Agent: Mozilla/5.0 (X11; Linux x86_64; rv:10.0.3) Gecko/20120305 Firefox/10.0.3\r\n";

/// Client headers replaced by the proxy's own values.
const REPLACED_HEADERS: [&str; 4] = ["host", "connection", "proxy-connection", "user-agent"];

fn is_replaced(line: &str) -> bool {
    line.split_once(':').is_some_and(|(name, _)| {
        REPLACED_HEADERS
            .iter()
            .any(|replaced| name.trim().eq_ignore_ascii_case(replaced))
    })
}

/// Reads one line of at most [`MAX_LINE`] bytes, keeping its terminator.
///
/// Returns an empty string at end of stream. Longer lines and non UTF-8
/// lines are malformed; nothing past the limit is buffered.
pub fn read_line<R: BufRead>(client: &mut R) -> Result<String> {
    let mut raw = Vec::new();
    client
        .by_ref()
        .take(MAX_LINE as u64 + 1)
        .read_until(b'\n', &mut raw)?;
    if raw.len() > MAX_LINE {
        return Err(ProxyError::MalformedRequest(format!(
            "line exceeds {MAX_LINE} bytes"
        )));
    }
    String::from_utf8(raw)
        .map_err(|_| ProxyError::MalformedRequest("line is not valid UTF-8".to_string()))
}

/// Reads header lines up to the blank line ending the block, or end of
/// stream. Lines keep their terminators.
pub fn read_headers<R: BufRead>(client: &mut R) -> Result<Vec<String>> {
    let mut headers = Vec::new();
    loop {
        let line = read_line(client)?;
        if line.is_empty() || line == "\r\n" || line == "\n" {
            return Ok(headers);
        }
        if headers.len() == MAX_HEADER_LINES {
            return Err(ProxyError::MalformedRequest(format!(
                "more than {MAX_HEADER_LINES} header lines"
            )));
        }
        headers.push(line);
    }
}

/// Builds the HTTP/1.0 request sent to the origin.
///
/// Client headers other than the replaced ones follow the proxy's fixed
/// headers verbatim.
pub fn build_request(uri: &ParsedUri, client_headers: &[String]) -> String {
    let mut request = format!(
        "GET {} HTTP/1.0\r\nHost: {}\r\nConnection: close\r\nProxy-Connection: close\r\n{}",
        uri.path, uri.host, USER_AGENT_HDR
    );
    for line in client_headers.iter().filter(|line| !is_replaced(line)) {
        request.push_str(line);
    }
    request.push_str("\r\n");
    request
}
