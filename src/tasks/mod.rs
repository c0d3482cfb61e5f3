//! Background Tasks Module
//!
//! Long-running threads that keep the proxy serving.
//!
//! # Tasks
//! - Listener: accepts clients and enqueues them
//! - Worker pool: drains the queue, one connection per worker at a time

mod listener;
mod workers;

pub use listener::accept_loop;
pub use workers::{spawn_worker_pool, WorkerPool};
