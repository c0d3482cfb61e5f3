//! Cache Proxy - A multi-threaded forwarding HTTP proxy
//!
//! Relays GET requests to origin servers and keeps small responses in a
//! fixed-slot in-memory cache shared by a pool of worker threads.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod proxy;
pub mod queue;
pub mod server;
pub mod sync;
pub mod tasks;

pub use api::AppState;
pub use cache::CacheStore;
pub use config::Config;
pub use queue::BoundedQueue;
pub use server::ProxyServer;
