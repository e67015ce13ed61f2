//! Stateful reconciler.
//!
//! Owns the current snapshot and is its only writer. Every applied write
//! advances a sequence shared with the poller; a poll result carries the
//! sequence value observed before its request went out and is discarded if
//! the field set it would overwrite (lots or spots) has been written since.

use crate::events::LotEvent;
use crate::publisher::SnapshotPublisher;
use crate::reconcile::{patch_lot, replace_all_lots, replace_all_spots, touch};
use chrono::Utc;
use lotwatch_core::{LotId, Snapshot};
use lotwatch_telemetry::Metrics;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Drop poll results that lost a race with a newer write.
    pub discard_stale_polls: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            discard_stale_polls: true,
        }
    }
}

/// Sequence value observed when a poll request was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PollTicket(u64);

impl PollTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Write sequence shared between the reconciler and the poller.
#[derive(Debug, Clone, Default)]
pub struct SequenceClock(Arc<AtomicU64>);

impl SequenceClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ticket for a poll about to be issued.
    pub fn ticket(&self) -> PollTicket {
        PollTicket(self.0.load(Ordering::SeqCst))
    }

    fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Where an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Push,
    Poll(PollTicket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A new snapshot was published.
    Applied,
    /// The event had nothing to apply to.
    Dropped,
    /// A newer write already covered the same fields.
    Stale,
    /// Unknown message kind.
    Ignored,
}

impl ApplyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Dropped => "dropped",
            Self::Stale => "stale",
            Self::Ignored => "ignored",
        }
    }
}

pub struct Reconciler {
    current: Arc<Snapshot>,
    publisher: SnapshotPublisher,
    clock: SequenceClock,
    lots_written_at: u64,
    spots_written_at: u64,
    /// Lot whose spots were last asked for.
    requested_lot: Option<LotId>,
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(config: ReconcilerConfig) -> Self {
        let current = Arc::new(Snapshot::empty());
        Self {
            publisher: SnapshotPublisher::new(current.clone()),
            current,
            clock: SequenceClock::new(),
            lots_written_at: 0,
            spots_written_at: 0,
            requested_lot: None,
            config,
        }
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.publisher.subscribe()
    }

    pub fn clock(&self) -> SequenceClock {
        self.clock.clone()
    }

    pub fn requested_lot(&self) -> Option<LotId> {
        self.requested_lot
    }

    /// Apply one event and publish the result if anything changed.
    pub fn apply(&mut self, event: LotEvent, origin: Origin) -> ApplyOutcome {
        let label = event.label();
        let outcome = self.apply_event(event, origin);
        Metrics::reconcile(label, outcome.as_str());
        debug!(event = label, ?origin, outcome = outcome.as_str(), "Reconciled");
        outcome
    }

    fn apply_event(&mut self, event: LotEvent, origin: Origin) -> ApplyOutcome {
        match event {
            LotEvent::ReplaceLots(lots) => {
                if self.is_stale(origin, self.lots_written_at) {
                    return ApplyOutcome::Stale;
                }
                let next = replace_all_lots(&self.current, lots);
                self.lots_written_at = self.clock.advance();
                self.commit(touch(next, Utc::now()));
                ApplyOutcome::Applied
            }
            LotEvent::PatchLot(patch) => {
                if self.is_stale(origin, self.lots_written_at) {
                    return ApplyOutcome::Stale;
                }
                let Some(next) = patch_lot(&self.current, &patch) else {
                    return ApplyOutcome::Dropped;
                };
                let seq = self.clock.advance();
                self.lots_written_at = seq;
                if next.spot_view != self.current.spot_view {
                    self.spots_written_at = seq;
                }
                self.commit(touch(next, Utc::now()));
                ApplyOutcome::Applied
            }
            LotEvent::ReplaceSpots { lot_id, spots } => {
                let Some(target) = lot_id.or(self.requested_lot) else {
                    return ApplyOutcome::Dropped;
                };
                if self.is_stale(origin, self.spots_written_at) {
                    return ApplyOutcome::Stale;
                }
                let next = replace_all_spots(&self.current, target, spots);
                self.spots_written_at = self.clock.advance();
                self.commit(touch(next, Utc::now()));
                ApplyOutcome::Applied
            }
            LotEvent::Ignored(_) => ApplyOutcome::Ignored,
        }
    }

    /// Track spots of `lot_id`. Spots of any other lot leave the snapshot.
    pub fn track_lot(&mut self, lot_id: LotId) {
        self.requested_lot = Some(lot_id);
        if self
            .current
            .spot_view
            .as_ref()
            .is_some_and(|v| v.lot_id != lot_id)
        {
            self.drop_spot_view();
        }
    }

    /// Stop tracking spots and drop the spot list.
    pub fn clear_selection(&mut self) {
        self.requested_lot = None;
        if self.current.spot_view.is_some() {
            self.drop_spot_view();
        }
    }

    fn drop_spot_view(&mut self) {
        let next = Snapshot {
            spot_view: None,
            ..(*self.current).clone()
        };
        self.spots_written_at = self.clock.advance();
        self.commit(next);
    }

    fn is_stale(&self, origin: Origin, written_at: u64) -> bool {
        match origin {
            Origin::Push => false,
            Origin::Poll(ticket) => self.config.discard_stale_polls && written_at > ticket.0,
        }
    }

    fn commit(&mut self, next: Snapshot) {
        Metrics::snapshot_lots(next.lots.len());
        self.current = Arc::new(next);
        self.publisher.publish(self.current.clone());
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(ReconcilerConfig::default())
    }
}
