//! Atomic pool counters and the stats snapshot
//!
//! Every tally is an atomic updated with read-modify-write operations; no
//! lock is ever held while a client waits. Reads are unsynchronized, so a
//! snapshot is mutually consistent only up to brief races during dispose
//! transitions.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

/// Point-in-time view of the pool counters.
///
/// Serializes to a mapping with keys exactly
/// `inuse, idle, starting, scrub, total, waiting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Connections handed out, awaiting client dispose
    pub inuse: usize,
    /// Connections in the idle queue, immediately usable
    pub idle: usize,
    /// New connections in the process of being opened
    pub starting: usize,
    /// Connections undergoing background session scrub
    pub scrub: usize,
    /// `idle + starting + inuse + scrub`
    pub total: usize,
    /// Clients currently blocked in acquisition
    pub waiting: usize,
}

/// Atomic tallies backing [`StatsSnapshot`], plus two non-contractual
/// diagnostics: the idle low-water mark driving the trimmer and the
/// dropped-without-dispose count.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    starting: AtomicUsize,
    idle: AtomicUsize,
    inuse: AtomicUsize,
    scrub: AtomicUsize,
    waiting: AtomicUsize,
    idle_floor: AtomicUsize,
    destroyed_without_dispose: AtomicUsize,
}

impl Counters {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn idle(&self) -> usize {
        self.idle.load(Ordering::Relaxed)
    }

    pub(crate) fn waiting(&self) -> usize {
        self.waiting.load(Ordering::Relaxed)
    }

    pub(crate) fn idle_floor(&self) -> usize {
        self.idle_floor.load(Ordering::Relaxed)
    }

    pub(crate) fn destroyed_without_dispose(&self) -> usize {
        self.destroyed_without_dispose.load(Ordering::Relaxed)
    }

    /// Total connections in any lifecycle state.
    pub(crate) fn total(&self) -> usize {
        self.idle.load(Ordering::Relaxed)
            + self.starting.load(Ordering::Relaxed)
            + self.inuse.load(Ordering::Relaxed)
            + self.scrub.load(Ordering::Relaxed)
    }

    pub(crate) fn waiting_inc(&self) {
        self.waiting.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn waiting_dec(&self) {
        self.waiting.fetch_sub(1, Ordering::Relaxed);
    }

    /// A connection open is underway.
    pub(crate) fn starting_inc(&self) {
        self.starting.fetch_add(1, Ordering::Relaxed);
    }

    /// A connection open failed.
    pub(crate) fn starting_dec(&self) {
        self.starting.fetch_sub(1, Ordering::Relaxed);
    }

    /// A connection open succeeded and the connection is about to be queued.
    pub(crate) fn connection_started(&self) {
        self.starting.fetch_sub(1, Ordering::Relaxed);
        self.idle.fetch_add(1, Ordering::Relaxed);
    }

    /// A queued connection left the pool (trim or drain).
    pub(crate) fn idle_dec(&self) {
        self.idle.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn inuse_dec(&self) {
        self.inuse.fetch_sub(1, Ordering::Relaxed);
    }

    /// An idle connection was handed to a client. Updates the low-water mark
    /// unsynchronized; the mark may lag slightly above the true minimum,
    /// which costs at most one extra idle connection per prune tick.
    pub(crate) fn note_handout(&self) {
        self.idle.fetch_sub(1, Ordering::Relaxed);
        self.inuse.fetch_add(1, Ordering::Relaxed);
        let idle_now = self.idle.load(Ordering::Relaxed);
        self.idle_floor.fetch_min(idle_now, Ordering::Relaxed);
    }

    /// A client disposed its connection; background scrub may follow.
    pub(crate) fn note_dispose_begin(&self) {
        self.scrub.fetch_add(1, Ordering::Relaxed);
        self.inuse.fetch_sub(1, Ordering::Relaxed);
    }

    /// A disposed connection was retired instead of re-queued.
    pub(crate) fn note_retired(&self) {
        self.scrub.fetch_sub(1, Ordering::Relaxed);
    }

    /// A scrubbed connection is about to return to the idle queue.
    pub(crate) fn note_requeued(&self) {
        self.idle.fetch_add(1, Ordering::Relaxed);
        self.scrub.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn destroyed_inc(&self) {
        self.destroyed_without_dispose.fetch_add(1, Ordering::Relaxed);
    }

    /// Start a fresh low-water window from the current idle count.
    pub(crate) fn reset_idle_floor(&self) {
        self.idle_floor
            .store(self.idle.load(Ordering::Relaxed), Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        let idle = self.idle.load(Ordering::Relaxed);
        let starting = self.starting.load(Ordering::Relaxed);
        let inuse = self.inuse.load(Ordering::Relaxed);
        let scrub = self.scrub.load(Ordering::Relaxed);
        StatsSnapshot {
            inuse,
            idle,
            starting,
            scrub,
            total: idle + starting + inuse + scrub,
            waiting: self.waiting.load(Ordering::Relaxed),
        }
    }
}
