//! Snapshot publisher.

use lotwatch_core::Snapshot;
use std::sync::Arc;
use tokio::sync::watch;

/// Holds the latest snapshot and hands it to subscribers whole.
///
/// Subscribers only ever see complete snapshots: each publish swaps one
/// `Arc` for another.
#[derive(Debug)]
pub struct SnapshotPublisher {
    tx: watch::Sender<Arc<Snapshot>>,
}

impl SnapshotPublisher {
    pub fn new(initial: Arc<Snapshot>) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn publish(&self, snapshot: Arc<Snapshot>) {
        self.tx.send_replace(snapshot);
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SnapshotPublisher {
    fn default() -> Self {
        Self::new(Arc::new(Snapshot::empty()))
    }
}
