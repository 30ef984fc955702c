//! Connection pool facade
//!
//! Orchestrates the full handout cycle: poll the idle queue, arrange a
//! producer when capacity remains, block in receive, validate liveness, and
//! wrap for the client. Dispose routes every connection back through the
//! reuse path, which decides between background scrub + re-queue and
//! retirement + replacement.
//!
//! One lock exists in the whole pool: the connect mutex serializing
//! connection opens. It is never held across a blocking receive, and no
//! counter update happens under it that a waiter depends on.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::config::PoolConfig;
use crate::conn::PooledConnection;
use crate::counters::{Counters, StatsSnapshot};
use crate::driver::{Connection, Driver};
use crate::error::{Error, Result};
use crate::maintain;
use crate::queue::IdleQueue;

/// Shared pool state: everything the facade, the maintainer, and the
/// short-lived workers (injectors, scrubbers, async handouts) operate on.
pub(crate) struct PoolCore {
    pub(crate) config: PoolConfig,
    driver: Arc<dyn Driver>,
    pub(crate) queue: IdleQueue,
    pub(crate) counters: Counters,
    /// Serializes connection opens; guards against thundering herds when
    /// many waiters arrive at once.
    connect_lock: Mutex<()>,
    terminated: AtomicBool,
    /// Dropping the sender wakes every blocked receive and the maintainer.
    stop_tx: Mutex<Option<Sender<()>>>,
    pub(crate) stop_rx: Receiver<()>,
    /// Whether any opened connection ever reported reuse support; gates the
    /// teardown advisory about undisposed drops.
    reuse_seen: AtomicBool,
}

impl PoolCore {
    pub(crate) fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Single-attempt-loop acquisition; repeats until a healthy connection is
    /// returned or the pool terminates.
    pub(crate) fn acquire(core: &Arc<Self>, inline_inject: bool) -> Result<PooledConnection> {
        if core.is_terminated() {
            return Err(Error::Terminated);
        }
        core.counters.waiting_inc();
        let result = Self::acquire_loop(core, inline_inject);
        core.counters.waiting_dec();
        result
    }

    fn acquire_loop(core: &Arc<Self>, inline_inject: bool) -> Result<PooledConnection> {
        loop {
            if core.is_terminated() {
                return Err(Error::Terminated);
            }
            let mut conn = match core.queue.poll() {
                Some(conn) => {
                    core.counters.note_handout();
                    conn
                }
                None => {
                    // Arrange a producer before blocking, or a sole waiter
                    // could sleep forever with the queue empty but under cap.
                    if core.counters.total() < core.config.max_connections {
                        if inline_inject {
                            core.inject_one()?;
                        } else {
                            core.spawn_injector();
                        }
                    }
                    match core.queue.receive(&core.stop_rx) {
                        Some(conn) => {
                            core.counters.note_handout();
                            conn
                        }
                        None => return Err(Error::Terminated),
                    }
                }
            };
            if conn.ping() {
                return Ok(PooledConnection::new(conn, Arc::clone(core)));
            }
            // Dead on handout: the reuse path re-checks liveness, retires the
            // connection, and replaces the capacity. Transparent to the caller.
            debug!("connection failed liveness check on handout, discarding");
            core.reuse(conn);
        }
    }

    /// Open connections while demand holds: a waiter exists or spares are
    /// below the floor, and the total is under the ceiling. Runs under the
    /// connect mutex; stops at the first open failure, which the caller
    /// logs (background) or propagates (inline async).
    pub(crate) fn inject_connections(self: &Arc<Self>) -> Result<()> {
        let _guard = self.connect_lock.lock();
        loop {
            if self.is_terminated() {
                return Ok(());
            }
            let demand = self.counters.waiting() > 0
                || self.counters.idle() < self.config.min_spare_connections;
            if !demand || self.counters.total() >= self.config.max_connections {
                return Ok(());
            }
            self.open_one()?;
        }
    }

    /// Open a single connection for an async handout worker. The worker
    /// consumes from the queue itself right after, so the demand loop of
    /// [`inject_connections`] would overshoot here.
    fn inject_one(self: &Arc<Self>) -> Result<()> {
        let _guard = self.connect_lock.lock();
        if self.is_terminated() {
            return Err(Error::Terminated);
        }
        if self.counters.total() >= self.config.max_connections {
            // Raced with another producer; the queue will be served anyway.
            return Ok(());
        }
        self.open_one()
    }

    /// Fill the queue with the configured boot-time connections. Called once
    /// by the maintainer; an open failure abandons the fill until the next
    /// maintenance tick.
    pub(crate) fn initial_fill(self: &Arc<Self>) {
        {
            let _guard = self.connect_lock.lock();
            for _ in 0..self.config.initial_size {
                if self.is_terminated() || self.counters.total() >= self.config.max_connections {
                    break;
                }
                if let Err(err) = self.open_one() {
                    warn!("initial connection setup failed: {}", err);
                    break;
                }
            }
        }
        self.counters.reset_idle_floor();
    }

    fn open_one(&self) -> Result<()> {
        self.counters.starting_inc();
        match self
            .driver
            .connect(&self.config.driver, &self.config.connection_args)
        {
            Ok(conn) => {
                if conn.supports_reuse() {
                    self.reuse_seen.store(true, Ordering::Relaxed);
                }
                self.counters.connection_started();
                self.queue.offer(conn);
                // Disposal may have finished its drain while the connect was
                // in flight.
                self.drain_if_terminated();
                debug!("opened new pooled connection");
                Ok(())
            }
            Err(err) => {
                self.counters.starting_dec();
                Err(err)
            }
        }
    }

    /// A producer offered a connection that may have missed the disposal
    /// drain; pull one element back out so nothing is stranded in the queue
    /// of a terminated pool.
    fn drain_if_terminated(&self) {
        if self.is_terminated() {
            if let Some(conn) = self.queue.poll() {
                self.counters.idle_dec();
                conn.disconnect();
            }
        }
    }

    /// Client-side dispose: decide between reuse and retirement.
    ///
    /// The disposer never blocks on scrubbing; session reset runs on a
    /// background worker while the connection is accounted in `scrub`.
    pub(crate) fn reuse(self: &Arc<Self>, mut conn: Box<dyn Connection>) {
        self.counters.note_dispose_begin();
        if !conn.supports_reuse() || self.is_terminated() || !conn.ping() {
            self.retire(conn);
            return;
        }
        let core = Arc::clone(self);
        spawn_worker("aquifer-scrub", move || {
            let mut conn = conn;
            match conn.scrub_for_reuse() {
                Ok(()) if !core.is_terminated() => core.requeue_scrubbed(conn),
                Ok(()) => core.retire(conn),
                Err(err) => {
                    warn!("session scrub failed, retiring connection: {}", err);
                    core.retire(conn);
                }
            }
        });
    }

    fn requeue_scrubbed(self: &Arc<Self>, conn: Box<dyn Connection>) {
        self.counters.note_requeued();
        self.queue.offer(conn);
        self.drain_if_terminated();
    }

    fn retire(self: &Arc<Self>, conn: Box<dyn Connection>) {
        self.counters.note_retired();
        conn.disconnect();
        if !self.is_terminated() {
            self.spawn_injector();
        }
    }

    /// The wrapper was dropped without `dispose`. Count it, release the raw
    /// connection, and replace the capacity.
    pub(crate) fn finalize_undisposed(self: &Arc<Self>, conn: Box<dyn Connection>) {
        self.counters.inuse_dec();
        self.counters.destroyed_inc();
        debug!("pooled connection dropped without dispose");
        conn.disconnect();
        if !self.is_terminated() {
            self.spawn_injector();
        }
    }

    fn spawn_injector(self: &Arc<Self>) {
        let core = Arc::clone(self);
        spawn_worker("aquifer-inject", move || {
            if let Err(err) = core.inject_connections() {
                warn!("connection injection failed: {}", err);
            }
        });
    }
}

/// A bounded, concurrent cache of live database connections.
///
/// Cloning is cheap and shares the same pool. Construction validates the
/// configuration and starts the background maintainer, which performs the
/// initial fill, trims idle excess past the spare floor each
/// `max_idle_duration` tick, and tops spares back up.
#[derive(Clone)]
pub struct Pool {
    core: Arc<PoolCore>,
}

impl Pool {
    /// Build a pool over the given driver and start its maintainer.
    ///
    /// Fails fast on an invalid configuration; connection setup itself is
    /// asynchronous to construction (see [`Pool::stats`] to observe the fill).
    pub fn new(config: PoolConfig, driver: Arc<dyn Driver>) -> Result<Self> {
        config.validate()?;
        let (stop_tx, stop_rx) = bounded(0);
        let core = Arc::new(PoolCore {
            config,
            driver,
            queue: IdleQueue::new(),
            counters: Counters::new(),
            connect_lock: Mutex::new(()),
            terminated: AtomicBool::new(false),
            stop_tx: Mutex::new(Some(stop_tx)),
            stop_rx,
            reuse_seen: AtomicBool::new(false),
        });
        maintain::spawn(Arc::clone(&core))?;
        Ok(Self { core })
    }

    /// Acquire a healthy connection, blocking the calling thread until one is
    /// available or the pool is disposed.
    pub fn get(&self) -> Result<PooledConnection> {
        PoolCore::acquire(&self.core, false)
    }

    /// Acquire a healthy connection without blocking the caller.
    ///
    /// A worker thread runs the same acquisition algorithm and fulfills the
    /// returned future. Connection setup performed inline for this request
    /// rejects the future on failure. Dropping the future is safe: a
    /// connection the worker already obtained goes back through the reuse
    /// path rather than leaking an in-use slot.
    pub fn get_async(&self) -> ConnectionFuture {
        let (tx, rx) = oneshot::channel();
        let core = Arc::clone(&self.core);
        let spawned = thread::Builder::new()
            .name("aquifer-handout".into())
            .spawn(move || {
                let result = PoolCore::acquire(&core, true);
                if let Err(Ok(conn)) = tx.send(result) {
                    // Future abandoned; give the connection back.
                    conn.dispose();
                }
            });
        if let Err(err) = spawned {
            // The unsent channel rejects the future with an internal error.
            warn!("failed to spawn connection handout worker: {}", err);
        }
        ConnectionFuture { rx }
    }

    /// Snapshot the pool counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.core.counters.snapshot()
    }

    /// Whether [`Pool::dispose`] has run.
    pub fn is_terminated(&self) -> bool {
        self.core.is_terminated()
    }

    /// How many wrappers were dropped without `dispose` (diagnostic).
    pub fn destroyed_without_dispose(&self) -> usize {
        self.core.counters.destroyed_without_dispose()
    }

    /// Pool configuration
    pub fn config(&self) -> &PoolConfig {
        &self.core.config
    }

    /// Terminate the pool. Idempotent.
    ///
    /// Wakes every blocked acquisition with [`Error::Terminated`], stops the
    /// maintainer, and disconnects all idle connections. Connections
    /// currently handed out stay valid and retire through the reuse path when
    /// their clients dispose them.
    pub fn dispose(&self) {
        let core = &self.core;
        if core.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        core.stop_tx.lock().take();
        while let Some(conn) = core.queue.poll() {
            core.counters.idle_dec();
            conn.disconnect();
        }
        let destroyed = core.counters.destroyed_without_dispose();
        if destroyed > 0 && core.reuse_seen.load(Ordering::Relaxed) {
            warn!(
                "{} pooled connections were dropped without dispose; their sessions could have been reused",
                destroyed
            );
        }
        debug!("connection pool disposed");
    }
}

/// Future returned by [`Pool::get_async`], fulfilled by a handout worker.
pub struct ConnectionFuture {
    rx: oneshot::Receiver<Result<PooledConnection>>,
}

impl Future for ConnectionFuture {
    type Output = Result<PooledConnection>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| Err(Error::internal("connection handout worker terminated")))
        })
    }
}

/// Spawn a short-lived named worker; a failed spawn is logged, never fatal.
/// The maintainer tick re-drives injection, so a lost injector self-heals.
fn spawn_worker<F>(name: &str, work: F)
where
    F: FnOnce() + Send + 'static,
{
    if let Err(err) = thread::Builder::new().name(name.into()).spawn(work) {
        warn!("failed to spawn {} worker: {}", name, err);
    }
}
