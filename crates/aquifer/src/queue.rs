//! Idle connection handoff queue
//!
//! Multi-producer, multi-consumer FIFO of ready-to-use connections. The queue
//! carries no bound of its own; bounding comes from the pool's connection
//! ceiling. Blocked receivers are woken either by an arriving connection or
//! by the pool's termination signal.

use crossbeam_channel::{select, unbounded, Receiver, Sender};

use crate::driver::Connection;

pub(crate) struct IdleQueue {
    tx: Sender<Box<dyn Connection>>,
    rx: Receiver<Box<dyn Connection>>,
}

impl IdleQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Queue a connection for handout. Never blocks, never fails.
    pub(crate) fn offer(&self, conn: Box<dyn Connection>) {
        // Both halves live in this struct, so the send cannot disconnect.
        let _ = self.tx.send(conn);
    }

    /// Non-blocking take.
    pub(crate) fn poll(&self) -> Option<Box<dyn Connection>> {
        self.rx.try_recv().ok()
    }

    /// Blocking take. Returns `None` once `stop` disconnects, which is the
    /// pool's termination signal; a woken caller must not be handed work.
    pub(crate) fn receive(&self, stop: &Receiver<()>) -> Option<Box<dyn Connection>> {
        let idle = &self.rx;
        select! {
            recv(idle) -> msg => msg.ok(),
            recv(stop) -> _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::thread;
    use std::time::Duration;

    struct StubConnection;

    impl Connection for StubConnection {
        fn ping(&mut self) -> bool {
            true
        }

        fn supports_reuse(&self) -> bool {
            true
        }

        fn scrub_for_reuse(&mut self) -> crate::error::Result<()> {
            Ok(())
        }

        fn disconnect(self: Box<Self>) {}
    }

    #[test]
    fn test_poll_empty_returns_none() {
        let queue = IdleQueue::new();
        assert!(queue.poll().is_none());
    }

    #[test]
    fn test_offer_poll_is_fifo() {
        let queue = IdleQueue::new();
        queue.offer(Box::new(StubConnection));
        queue.offer(Box::new(StubConnection));

        // Ordering is observable only through handout order; poll twice and
        // confirm both elements come out.
        assert!(queue.poll().is_some());
        assert!(queue.poll().is_some());
        assert!(queue.poll().is_none());
    }

    #[test]
    fn test_receive_wakes_on_offer() {
        let queue = IdleQueue::new();
        let (_stop_tx, stop_rx) = bounded::<()>(0);

        thread::scope(|scope| {
            let handle = scope.spawn(|| queue.receive(&stop_rx).is_some());
            thread::sleep(Duration::from_millis(50));
            queue.offer(Box::new(StubConnection));
            assert!(handle.join().unwrap());
        });
    }

    #[test]
    fn test_receive_wakes_on_termination() {
        let queue = IdleQueue::new();
        let (stop_tx, stop_rx) = bounded::<()>(0);

        thread::scope(|scope| {
            let handle = scope.spawn(|| queue.receive(&stop_rx).is_none());
            thread::sleep(Duration::from_millis(50));
            drop(stop_tx);
            assert!(handle.join().unwrap());
        });
    }
}
