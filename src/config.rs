//! Configuration Module
//!
//! Loads the listen port from the command line and tuning knobs from
//! environment variables.

use std::env;

use crate::error::ConfigError;

// == Defaults ==
/// Recommended aggregate cache budget in bytes
pub const DEFAULT_MAX_CACHE_SIZE: usize = 1_049_000;
/// Recommended per-object ceiling in bytes
pub const DEFAULT_MAX_OBJECT_SIZE: usize = 102_400;
/// Worker threads draining the connection queue
pub const DEFAULT_THREADS: usize = 8;
/// Pending connections held before the listener blocks
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Proxy configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Port the proxy listens on
    pub port: u16,
    /// Number of worker threads
    pub threads: usize,
    /// Capacity of the bounded connection queue
    pub queue_capacity: usize,
    /// Aggregate cache budget in bytes
    pub max_cache_size: usize,
    /// Largest cacheable response in bytes (exclusive)
    pub max_object_size: usize,
    /// Port for the admin API, disabled when None
    pub admin_port: Option<u16>,
}

impl Config {
    /// Builds the configuration from process arguments and environment.
    ///
    /// # Environment Variables
    /// - `PROXY_THREADS` - Worker threads (default: 8)
    /// - `PROXY_QUEUE_CAPACITY` - Queue capacity (default: 16)
    /// - `PROXY_MAX_CACHE_SIZE` - Cache budget in bytes (default: 1049000)
    /// - `PROXY_MAX_OBJECT_SIZE` - Object ceiling in bytes (default: 102400)
    /// - `ADMIN_PORT` - Admin API port (default: disabled)
    pub fn from_env_args() -> Result<Self, ConfigError> {
        Self::load(env::args(), |name| env::var(name).ok())
    }

    /// Builds the configuration from an argument list and a variable lookup.
    ///
    /// The first argument is the program name; exactly one more (the port)
    /// is required.
    pub fn load<I, F>(args: I, var: F) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let args: Vec<String> = args.into_iter().collect();
        if args.len() != 2 {
            let program = args
                .first()
                .cloned()
                .unwrap_or_else(|| "cache_proxy".to_string());
            return Err(ConfigError::Usage { program });
        }

        let port = args[1]
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(args[1].clone()))?;

        let parse = |name: &str, default: usize| -> usize {
            var(name).and_then(|v| v.parse().ok()).unwrap_or(default)
        };

        let config = Self {
            port,
            threads: parse("PROXY_THREADS", DEFAULT_THREADS),
            queue_capacity: parse("PROXY_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY),
            max_cache_size: parse("PROXY_MAX_CACHE_SIZE", DEFAULT_MAX_CACHE_SIZE),
            max_object_size: parse("PROXY_MAX_OBJECT_SIZE", DEFAULT_MAX_OBJECT_SIZE),
            admin_port: var("ADMIN_PORT").and_then(|v| v.parse().ok()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would leave the proxy unable to serve.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::InvalidValue {
                name: "PROXY_THREADS",
                value: self.threads.to_string(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                name: "PROXY_QUEUE_CAPACITY",
                value: self.queue_capacity.to_string(),
            });
        }
        if self.max_object_size == 0 || self.slot_count() == 0 {
            return Err(ConfigError::InvalidCacheGeometry {
                cache_size: self.max_cache_size,
                object_size: self.max_object_size,
            });
        }
        Ok(())
    }

    /// Number of cache slots the budget allows.
    pub fn slot_count(&self) -> usize {
        self.max_cache_size
            .checked_div(self.max_object_size)
            .unwrap_or(0)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            threads: DEFAULT_THREADS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_cache_size: DEFAULT_MAX_CACHE_SIZE,
            max_object_size: DEFAULT_MAX_OBJECT_SIZE,
            admin_port: None,
        }
    }
}
