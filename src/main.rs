//! Cache Proxy - A multi-threaded forwarding HTTP proxy
//!
//! Usage: `cache_proxy <port>`

use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cache_proxy::api::spawn_admin_server;
use cache_proxy::{AppState, CacheStore, Config, ProxyServer};

/// Main entry point for the caching proxy.
///
/// # Startup Sequence
/// 1. Parse the listen port and environment overrides
/// 2. Initialize tracing subscriber for logging
/// 3. Create the shared cache store
/// 4. Optionally start the admin API
/// 5. Bind the listener and start the worker pool
/// 6. Accept connections forever
fn main() {
    let config = match Config::from_env_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    };

    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cache_proxy=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run(config) {
        tracing::error!("{:#}", err);
        process::exit(1);
    }
}

fn run(config: Config) -> anyhow::Result<()> {
    info!("Starting caching proxy");
    info!(
        "Configuration loaded: port={}, threads={}, queue_capacity={}, slots={}, max_object_size={}",
        config.port,
        config.threads,
        config.queue_capacity,
        config.slot_count(),
        config.max_object_size
    );

    let cache = Arc::new(CacheStore::from_config(&config));
    info!("Cache store initialized");

    if let Some(admin_port) = config.admin_port {
        let addr = SocketAddr::from(([0, 0, 0, 0], admin_port));
        spawn_admin_server(addr, AppState::new(Arc::clone(&cache)))
            .context("failed to start admin API")?;
    }

    let server = ProxyServer::bind(&config, cache)
        .with_context(|| format!("failed to listen on port {}", config.port))?;
    info!("Proxy listening on {}", server.local_addr()?);

    server.run()
}
