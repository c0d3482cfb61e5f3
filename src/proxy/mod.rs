//! Proxy Module
//!
//! The per-connection request pipeline and the HTTP text handling it calls
//! into: request-target parsing, outbound header construction and error
//! pages.

pub mod error_page;
pub mod headers;
pub mod pipeline;
pub mod uri;

pub use error_page::client_error;
pub use headers::{
    build_request, read_headers, read_line, MAX_HEADER_LINES, MAX_LINE, USER_AGENT_HDR,
};
pub use pipeline::{Outcome, Pipeline};
pub use uri::{parse_uri, ParsedUri};
