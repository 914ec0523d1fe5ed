//! Configuration for TierKV
//!
//! Centralized configuration with sensible defaults.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::protocol::UDP_PORT;

/// Main configuration shared by the server, the cache surrogate and the client
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Server Configuration
    // -------------------------------------------------------------------------
    /// UDP listen address
    pub listen_addr: SocketAddr,

    /// Worker threads handling datagrams (0 = handle on the receive thread)
    pub workers: usize,

    /// How often the receive loop wakes up to check for shutdown (milliseconds)
    pub poll_interval_ms: u64,

    // -------------------------------------------------------------------------
    // Client Configuration
    // -------------------------------------------------------------------------
    /// How long a lookup waits for its reply (milliseconds)
    pub client_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Cache Tier Configuration
    // -------------------------------------------------------------------------
    /// Max number of dynamically memoized keys (None = unbounded)
    pub memo_capacity: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, UDP_PORT)),
            workers: 0,
            poll_interval_ms: 200,
            client_timeout_ms: 2000,
            memo_capacity: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_millis(self.client_timeout_ms)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the UDP listen address
    pub fn listen_addr(mut self, addr: SocketAddr) -> Self {
        self.config.listen_addr = addr;
        self
    }

    /// Set the number of worker threads
    pub fn workers(mut self, count: usize) -> Self {
        self.config.workers = count;
        self
    }

    /// Set the shutdown poll interval (in milliseconds)
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// Set the client reply timeout (in milliseconds)
    pub fn client_timeout_ms(mut self, ms: u64) -> Self {
        self.config.client_timeout_ms = ms;
        self
    }

    /// Bound the cache tier's memo table
    pub fn memo_capacity(mut self, capacity: usize) -> Self {
        self.config.memo_capacity = Some(capacity);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
