//! Pool configuration

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{Error, Result};

/// Pool configuration
///
/// Immutable once the pool is built. `driver` and `connection_args` are
/// opaque to the pool and forwarded verbatim to [`Driver::connect`].
///
/// [`Driver::connect`]: crate::driver::Driver::connect
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Opaque driver identifier passed to `Driver::connect`
    pub driver: String,
    /// Opaque key/value bag forwarded verbatim to `Driver::connect`
    pub connection_args: HashMap<String, String>,
    /// Connections started at boot by the maintainer
    pub initial_size: usize,
    /// Hard ceiling on total connections (idle + starting + inuse + scrub)
    pub max_connections: usize,
    /// Idle floor maintained by the injector and respected by the trimmer
    pub min_spare_connections: usize,
    /// Prune tick interval and idle threshold for the maintainer
    pub max_idle_duration: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            driver: String::new(),
            connection_args: HashMap::new(),
            initial_size: 1,
            max_connections: 10,
            min_spare_connections: 1,
            max_idle_duration: Duration::from_secs(60),
        }
    }
}

impl PoolConfig {
    /// Create a configuration for the named driver with default sizing
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            ..Default::default()
        }
    }

    /// Set the number of connections started at boot
    pub fn with_initial_size(mut self, size: usize) -> Self {
        self.initial_size = size;
        self
    }

    /// Set the hard ceiling on total connections
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the idle floor maintained by the injector
    pub fn with_min_spare_connections(mut self, spares: usize) -> Self {
        self.min_spare_connections = spares;
        self
    }

    /// Set the prune tick interval and idle threshold
    pub fn with_max_idle_duration(mut self, duration: Duration) -> Self {
        self.max_idle_duration = duration;
        self
    }

    /// Add a single connection argument
    pub fn with_connection_arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.connection_args.insert(key.into(), value.into());
        self
    }

    /// Replace the connection argument bag
    pub fn with_connection_args(mut self, args: HashMap<String, String>) -> Self {
        self.connection_args = args;
        self
    }

    /// Validate the configuration.
    ///
    /// `initial_size` must be at least 1 and, for a pool with any capacity,
    /// must not exceed `max_connections`. A pool with `max_connections == 0`
    /// is accepted: nothing ever opens and every acquisition blocks until the
    /// pool is disposed.
    pub fn validate(&self) -> Result<()> {
        if self.initial_size == 0 {
            return Err(Error::config("initial_size must be at least 1"));
        }
        if self.max_connections > 0 && self.initial_size > self.max_connections {
            return Err(Error::config(format!(
                "initial_size ({}) exceeds max_connections ({})",
                self.initial_size, self.max_connections
            )));
        }
        Ok(())
    }
}
