//! Minimal HTML error responses sent to the client.

use std::io::{self, Write};

use crate::error::ClientStatus;

/// Writes a status line and a small HTML body describing the failure.
pub fn client_error<W: Write>(out: &mut W, cause: &str, status: ClientStatus) -> io::Result<()> {
    let body = format!(
        "<html><title>Proxy Error</title><body bgcolor=\"ffffff\">\r\n\
         {code}: {short}\r\n\
         <p>{long}: {cause}\r\n\
         <hr><em>The caching proxy</em>\r\n",
        code = status.code,
        short = status.short_msg,
        long = status.long_msg,
    );
    write!(
        out,
        "HTTP/1.0 {} {}\r\nContent-type: text/html\r\nContent-length: {}\r\n\r\n{}",
        status.code,
        status.short_msg,
        body.len(),
        body
    )?;
    out.flush()
}
