//! Error types for the caching proxy
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Proxy Error Enum ==
/// Errors raised while serving a single client connection.
///
/// None of these are fatal to the process: a failing connection is answered
/// (or silently closed) and the worker moves on to the next one.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Request line missing, truncated or unparsable
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Any method other than GET
    #[error("Method not implemented: {0}")]
    NotImplemented(String),

    /// Origin server could not be reached
    #[error("Cannot connect to origin {host}:{port}")]
    BadGateway { host: String, port: String },

    /// Response too large to fit in a cache slot
    #[error("Object of {size} bytes exceeds cache ceiling of {limit} bytes")]
    ObjectTooLarge { size: usize, limit: usize },

    /// Socket level failure on either side of the proxy
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// == Client Status ==
/// Status line and messages sent back to the client for a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientStatus {
    pub code: u16,
    pub short_msg: &'static str,
    pub long_msg: &'static str,
}

impl ProxyError {
    /// Returns the error page to emit, or `None` when the connection should
    /// simply be closed.
    pub fn client_status(&self) -> Option<ClientStatus> {
        match self {
            ProxyError::NotImplemented(_) => Some(ClientStatus {
                code: 501,
                short_msg: "Not Implemented",
                long_msg: "Proxy does not implement this method",
            }),
            ProxyError::BadGateway { .. } => Some(ClientStatus {
                code: 502,
                short_msg: "Bad Gateway",
                long_msg: "Cannot connect to server",
            }),
            ProxyError::MalformedRequest(_)
            | ProxyError::ObjectTooLarge { .. }
            | ProxyError::Io(_) => None,
        }
    }

    /// The offending token echoed in the error page body.
    pub fn cause(&self) -> String {
        match self {
            ProxyError::NotImplemented(method) => method.clone(),
            ProxyError::BadGateway { host, .. } => host.clone(),
            other => other.to_string(),
        }
    }
}

// == Config Error Enum ==
/// Startup configuration errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Wrong number of command line arguments
    #[error("usage: {program} <port>")]
    Usage { program: String },

    /// Listen port is not a valid u16
    #[error("Invalid port: {0}")]
    InvalidPort(String),

    /// An environment override is out of range
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    /// Cache budget smaller than a single object
    #[error("Cache size {cache_size} cannot hold an object of {object_size} bytes")]
    InvalidCacheGeometry { cache_size: usize, object_size: usize },
}

// == Result Type Alias ==
/// Convenience Result type for the proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;
