//! Driver traits for aquifer
//!
//! The boundary between the pool and the database client library. The pool
//! never speaks a wire protocol; it asks a [`Driver`] to open connections and
//! asks each [`Connection`] about liveness and reuse. Everything else the
//! driver exposes (queries, transactions, prepared statements) is outside the
//! pool's contract and reached through the connection object itself.

use std::collections::HashMap;

use crate::error::Result;

/// Opens new database connections on behalf of the pool.
///
/// Implementations are shared across the maintainer, injector workers, and
/// async handout workers, so they must be thread-safe. A failed `connect` is
/// fatal only to that attempt: background injection logs and retries on the
/// next trigger, while an inline async attempt rejects the caller's future.
pub trait Driver: Send + Sync {
    /// Open a new connection for `name`, forwarding `args` verbatim.
    ///
    /// `name` is the opaque driver identifier from the pool configuration;
    /// `args` is the configuration's opaque key/value bag. Neither is
    /// interpreted by the pool.
    fn connect(&self, name: &str, args: &HashMap<String, String>) -> Result<Box<dyn Connection>>;
}

/// A live database session owned by the pool or a borrowing client.
pub trait Connection: Send {
    /// Cheap liveness check, run on every handout and before every reuse.
    ///
    /// Must not panic; report failure by returning `false`.
    fn ping(&mut self) -> bool;

    /// Whether this connection can survive dispose and serve future clients.
    ///
    /// Connections reporting `false` are disconnected on their first dispose.
    fn supports_reuse(&self) -> bool;

    /// Reset session state (temp tables, prepared statements, session
    /// variables) so the connection is safe to hand to an unrelated client.
    ///
    /// Idempotent. An `Err` marks the connection unreusable; the pool retires
    /// it and replaces the capacity.
    fn scrub_for_reuse(&mut self) -> Result<()>;

    /// Immediately release the underlying driver resources.
    fn disconnect(self: Box<Self>);
}
