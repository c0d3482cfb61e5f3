//! Connection Listener
//!
//! Accepts client connections and hands them to the worker queue.

use std::net::{TcpListener, TcpStream};

use tracing::{info, warn};

use crate::queue::BoundedQueue;

/// Accepts connections forever, pushing each one onto `queue`.
///
/// Blocks whenever the queue is full, which holds further clients in the
/// kernel's accept backlog. Accept errors are logged and skipped.
pub fn accept_loop(listener: &TcpListener, queue: &BoundedQueue<TcpStream>) -> ! {
    loop {
        match listener.accept() {
            Ok((stream, peer)) => {
                info!("Accepted connection from ({}, {})", peer.ip(), peer.port());
                queue.insert(stream);
            }
            Err(err) => {
                warn!(error = %err, "Failed to accept connection");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_accepted_connections_reach_queue() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let queue = Arc::new(BoundedQueue::new(4));

        {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                accept_loop(&listener, &queue);
            });
        }

        let mut client = TcpStream::connect(addr).unwrap();
        client.write_all(b"ping").unwrap();

        let mut accepted = queue.remove();
        let mut buf = [0u8; 4];
        accepted.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");
    }
}
