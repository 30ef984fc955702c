//! Background pool maintainer
//!
//! One thread per pool. It performs the boot-time fill, then ticks every
//! `max_idle_duration`: each tick trims idle connections the pool provably
//! did not need during the last window and tops the spare floor back up.
//! The trim basis is the idle low-water mark, so only excess capacity never
//! consumed during the window is retired; a busy pool never shrinks below
//! observed need.

use std::sync::Arc;

use crossbeam_channel::RecvTimeoutError;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::pool::PoolCore;

pub(crate) fn spawn(core: Arc<PoolCore>) -> Result<()> {
    std::thread::Builder::new()
        .name("aquifer-maintainer".into())
        .spawn(move || run(core))
        .map_err(|err| Error::internal(format!("failed to spawn pool maintainer: {err}")))?;
    Ok(())
}

fn run(core: Arc<PoolCore>) {
    core.initial_fill();
    loop {
        // The termination channel doubles as the tick timer: a timeout is a
        // maintenance round, a disconnect is pool disposal.
        match core.stop_rx.recv_timeout(core.config.max_idle_duration) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
        if core.is_terminated() {
            break;
        }
        trim(&core);
        // Also the retry point for earlier connect failures: demand that went
        // unmet (blocked waiters, a thin spare floor) is re-driven here.
        if let Err(err) = core.inject_connections() {
            warn!("background connection injection failed: {}", err);
        }
        core.counters.reset_idle_floor();
    }
    debug!("pool maintainer exiting");
}

/// Retire idle connections beyond what the last window ever needed.
fn trim(core: &PoolCore) {
    let kill = core
        .counters
        .idle_floor()
        .saturating_sub(core.config.min_spare_connections);
    let mut trimmed = 0;
    for _ in 0..kill {
        match core.queue.poll() {
            Some(conn) => {
                core.counters.idle_dec();
                conn.disconnect();
                trimmed += 1;
            }
            None => break,
        }
    }
    if trimmed > 0 {
        debug!("trimmed {} idle connections past the spare floor", trimmed);
    }
}
