//! API Module
//!
//! Read-only admin HTTP API exposing cache diagnostics.
//!
//! # Endpoints
//! - `GET /stats` - Cache statistics
//! - `GET /cache` - Occupied cache slots
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};

use tracing::{error, info};

/// Serves the admin API on its own thread with a dedicated tokio runtime.
///
/// The listener is bound before returning so callers can read the actual
/// address (useful with port 0).
pub fn spawn_admin_server(
    addr: SocketAddr,
    state: AppState,
) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(addr)?;
    listener.set_nonblocking(true)?;
    let local_addr = listener.local_addr()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("admin-api")
        .enable_all()
        .build()?;

    let handle = thread::Builder::new()
        .name("admin-api".to_string())
        .spawn(move || {
            let result = runtime.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener)?;
                info!("Admin API listening on http://{}", local_addr);
                axum::serve(listener, create_router(state)).await
            });
            if let Err(err) = result {
                error!(error = %err, "Admin API stopped");
            }
        })?;

    Ok((local_addr, handle))
}
