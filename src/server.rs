//! Proxy Server
//!
//! Wires the listener, the bounded queue, the worker pool and the request
//! pipeline around one shared cache.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;

use tracing::{debug, info, info_span};

use crate::cache::CacheStore;
use crate::config::Config;
use crate::proxy::Pipeline;
use crate::queue::BoundedQueue;
use crate::tasks::{accept_loop, spawn_worker_pool, WorkerPool};

/// A bound proxy with its workers already running.
#[derive(Debug)]
pub struct ProxyServer {
    listener: TcpListener,
    queue: Arc<BoundedQueue<TcpStream>>,
    pool: WorkerPool,
}

impl ProxyServer {
    /// Binds the configured port on all interfaces and starts the workers.
    pub fn bind(config: &Config, cache: Arc<CacheStore>) -> io::Result<Self> {
        let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], config.port)))?;
        Self::from_listener(listener, config, cache)
    }

    /// Starts workers serving an already bound listener.
    pub fn from_listener(
        listener: TcpListener,
        config: &Config,
        cache: Arc<CacheStore>,
    ) -> io::Result<Self> {
        let queue = Arc::new(BoundedQueue::new(config.queue_capacity));
        let pipeline = Pipeline::new(Arc::clone(&cache));

        let pool = spawn_worker_pool(config.threads, Arc::clone(&queue), move |worker, client| {
            serve_client(&pipeline, worker, client)
        })?;

        Ok(Self {
            listener,
            queue,
            pool,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop on the calling thread; never returns.
    pub fn run(self) -> ! {
        info!(
            workers = self.pool.size(),
            queue_capacity = self.queue.capacity(),
            "Accepting connections"
        );
        accept_loop(&self.listener, &self.queue)
    }
}

fn serve_client(pipeline: &Pipeline, worker: usize, client: TcpStream) {
    let peer = client
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    let span = info_span!("connection", worker, peer = %peer);
    let _enter = span.enter();

    let outcome = pipeline.handle(client);
    debug!(?outcome, "Connection finished");
}
