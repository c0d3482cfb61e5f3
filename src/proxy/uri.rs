//! Request-target decomposition into origin host, port and path.

/// Default origin port when the target names none.
pub const DEFAULT_PORT: &str = "80";

/// Origin coordinates extracted from a proxy request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUri {
    pub host: String,
    pub port: String,
    pub path: String,
}

/// Splits an absolute (or scheme-less) URL into host, port and path.
///
/// `http://example.com:8080/page.html` yields host `example.com`, port
/// `8080`, path `/page.html`. Port defaults to `80` and path to `/`.
pub fn parse_uri(uri: &str) -> ParsedUri {
    let rest = match uri.find("//") {
        Some(pos) => &uri[pos + 2..],
        None => uri,
    };

    let (authority, path) = match rest.find('/') {
        Some(pos) => (&rest[..pos], &rest[pos..]),
        None => (rest, "/"),
    };

    let (host, port) = match authority.split_once(':') {
        Some((host, port)) if !port.is_empty() => (host, port),
        Some((host, _)) => (host, DEFAULT_PORT),
        None => (authority, DEFAULT_PORT),
    };

    ParsedUri {
        host: host.to_string(),
        port: port.to_string(),
        path: path.to_string(),
    }
}
