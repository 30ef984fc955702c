//! Pooled connection wrapper

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::driver::Connection;
use crate::pool::PoolCore;

/// A connection borrowed from the pool.
///
/// Delegates the driver surface through `Deref`/`DerefMut`; the one operation
/// it overrides is teardown. [`dispose`](Self::dispose) hands the connection
/// back to the pool, which decides between reuse (background scrub, then back
/// to the idle queue) and retirement. Dropping the wrapper without calling
/// `dispose` disconnects the raw connection and is counted as a diagnostic;
/// the pool replaces the lost capacity on its own.
pub struct PooledConnection {
    conn: Option<Box<dyn Connection>>,
    pool: Arc<PoolCore>,
}

impl PooledConnection {
    pub(crate) fn new(conn: Box<dyn Connection>, pool: Arc<PoolCore>) -> Self {
        Self {
            conn: Some(conn),
            pool,
        }
    }

    /// Get the underlying connection
    pub fn connection(&self) -> &(dyn Connection + 'static) {
        self.conn
            .as_deref()
            .expect("connection already returned to pool")
    }

    /// Get mutable reference to the underlying connection
    pub fn connection_mut(&mut self) -> &mut (dyn Connection + 'static) {
        self.conn
            .as_deref_mut()
            .expect("connection already returned to pool")
    }

    /// Return the connection to the pool.
    ///
    /// Never blocks on session scrubbing: the pool either schedules the scrub
    /// on a background worker and re-queues the connection afterwards, or
    /// retires it (reuse unsupported, liveness check failed, pool
    /// terminating) and replaces the capacity.
    pub fn dispose(mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.reuse(conn);
        }
    }
}

impl Deref for PooledConnection {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        self.connection()
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.connection_mut()
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.finalize_undisposed(conn);
        }
    }
}
