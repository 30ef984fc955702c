//! # aquifer
//!
//! A bounded, concurrent cache of live database connections shared by many
//! client threads and tasks.
//!
//! ## Features
//!
//! - **Bounded concurrency**: a hard ceiling on total connections, enforced
//!   across handouts, background injection, and reuse
//! - **Sync and async acquisition**: block the calling thread, or take a
//!   future fulfilled by a handout worker
//! - **Health validation on handout**: dead connections are discarded and
//!   replaced transparently
//! - **Connection reuse**: session state is scrubbed on a background worker
//!   before a connection serves an unrelated client
//! - **Idle trimming with hysteresis**: a low-water mark guarantees only
//!   capacity the pool provably did not need is retired
//! - **Monitoring**: a serializable snapshot of the pool counters
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use aquifer::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let config = PoolConfig::new("postgres")
//!     .with_connection_arg("host", "localhost")
//!     .with_initial_size(2)
//!     .with_max_connections(10)
//!     .with_min_spare_connections(1)
//!     .with_max_idle_duration(Duration::from_secs(60));
//!
//! let pool = Pool::new(config, Arc::new(PgDriver))?;
//!
//! let conn = pool.get()?;          // blocking
//! // ... use the connection ...
//! conn.dispose();                  // back to the pool for scrub + reuse
//!
//! let fut = pool.get_async();      // future-returning
//! ```
//!
//! The underlying database client is abstracted behind the [`Driver`] and
//! [`Connection`] traits; aquifer carries no wire protocol of its own.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod conn;
pub mod counters;
pub mod driver;
pub mod error;
pub mod pool;

mod maintain;
mod queue;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::PoolConfig;
    pub use crate::conn::PooledConnection;
    pub use crate::counters::StatsSnapshot;
    pub use crate::driver::{Connection, Driver};
    pub use crate::error::{Error, Result};
    pub use crate::pool::{ConnectionFuture, Pool};
}

pub use config::PoolConfig;
pub use conn::PooledConnection;
pub use counters::StatsSnapshot;
pub use driver::{Connection, Driver};
pub use error::{Error, Result};
pub use pool::{ConnectionFuture, Pool};
