//! Request Pipeline
//!
//! Per-connection state machine:
//!
//! ```text
//! RECEIVE_REQUEST -> CACHE_LOOKUP -+-> hit:  SERVE_FROM_CACHE ---------------------------+-> DONE
//!                                  +-> miss: CONNECT_ORIGIN -> FORWARD_REQUEST          |
//!                                            -> STREAM_RESPONSE -> MAYBE_CACHE_INSERT --+
//! ```
//!
//! Protocol and upstream failures short-circuit to an error page; malformed
//! requests and socket failures close the connection silently.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error_page::client_error;
use super::headers::{build_request, read_headers, read_line};
use super::uri::parse_uri;
use crate::cache::CacheStore;
use crate::error::{ProxyError, Result};

/// Chunk size for relaying origin responses.
const RELAY_CHUNK: usize = 8192;

// == Outcome ==
/// How a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Served from the cache without contacting the origin
    CacheHit { bytes: usize },
    /// Relayed from the origin; `cached` tells whether it was stored
    Forwarded { bytes: usize, cached: bool },
    /// Answered with an error page
    Rejected { code: u16 },
    /// Closed without a response
    Closed,
}

/// Parsed request line.
#[derive(Debug)]
struct RequestLine {
    method: String,
    target: String,
}

/// Reads and parses the request line; end of stream counts as malformed.
fn read_request_line<R: BufRead>(client: &mut R) -> Result<RequestLine> {
    let line = read_line(client)?;
    if line.is_empty() {
        return Err(ProxyError::MalformedRequest("empty request".to_string()));
    }
    parse_request_line(&line)
}

fn parse_request_line(line: &str) -> Result<RequestLine> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(target), Some(_version)) => Ok(RequestLine {
            method: method.to_string(),
            target: target.to_string(),
        }),
        _ => Err(ProxyError::MalformedRequest(line.trim_end().to_string())),
    }
}

// == Pipeline ==
/// Request handler shared by all workers.
#[derive(Debug, Clone)]
pub struct Pipeline {
    cache: Arc<CacheStore>,
}

impl Pipeline {
    pub fn new(cache: Arc<CacheStore>) -> Self {
        Self { cache }
    }

    // == Handle ==
    /// Serves one client connection to completion and closes it.
    ///
    /// Never fails: errors are reported to the client where the protocol
    /// calls for it and folded into the returned [`Outcome`].
    pub fn handle(&self, client: TcpStream) -> Outcome {
        match self.serve(&client) {
            Ok(outcome) => outcome,
            Err(err) => match err.client_status() {
                Some(status) => {
                    warn!(error = %err, code = status.code, "Rejecting request");
                    if let Err(write_err) = client_error(&mut &client, &err.cause(), status) {
                        debug!(error = %write_err, "Failed to deliver error page");
                    }
                    Outcome::Rejected { code: status.code }
                }
                None => {
                    debug!(error = %err, "Closing connection");
                    Outcome::Closed
                }
            },
        }
    }

    fn serve(&self, client: &TcpStream) -> Result<Outcome> {
        // RECEIVE_REQUEST
        let mut reader = BufReader::new(client);
        let request = read_request_line(&mut reader)?;
        let headers = read_headers(&mut reader);

        if !request.method.eq_ignore_ascii_case("GET") {
            return Err(ProxyError::NotImplemented(request.method));
        }
        let headers = headers?;

        // CACHE_LOOKUP / SERVE_FROM_CACHE
        let mut writer = client;
        let served = self.cache.fetch(&request.target, |object| {
            writer.write_all(object).map(|_| object.len())
        });
        if let Some(sent) = served {
            let bytes = sent?;
            info!(uri = %request.target, bytes, "Served from cache");
            return Ok(Outcome::CacheHit { bytes });
        }

        // CONNECT_ORIGIN
        let uri = parse_uri(&request.target);
        let bad_gateway = || ProxyError::BadGateway {
            host: uri.host.clone(),
            port: uri.port.clone(),
        };
        let port: u16 = uri.port.parse().map_err(|_| bad_gateway())?;
        let mut origin = TcpStream::connect((uri.host.as_str(), port)).map_err(|err| {
            debug!(error = %err, host = %uri.host, port, "Origin connect failed");
            bad_gateway()
        })?;

        // FORWARD_REQUEST
        origin.write_all(build_request(&uri, &headers).as_bytes())?;

        // STREAM_RESPONSE
        let limit = self.cache.max_object_size();
        let mut object = Vec::new();
        let mut total = 0usize;
        let mut chunk = [0u8; RELAY_CHUNK];
        loop {
            let n = origin.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            writer.write_all(&chunk[..n])?;
            total += n;
            if total < limit {
                object.extend_from_slice(&chunk[..n]);
            }
        }

        // MAYBE_CACHE_INSERT
        let cached = if total < limit {
            self.cache.insert(&request.target, &object).is_ok()
        } else {
            self.cache.record_uncacheable();
            false
        };
        info!(uri = %request.target, bytes = total, cached, "Forwarded from origin");

        Ok(Outcome::Forwarded {
            bytes: total,
            cached,
        })
    }
}
