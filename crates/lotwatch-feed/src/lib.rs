//! Occupancy state reconciliation.
//!
//! Merges decoded push messages and poll results into one immutable
//! [`Snapshot`](lotwatch_core::Snapshot) and publishes every new snapshot
//! to subscribers.

pub mod events;
pub mod publisher;
pub mod reconcile;
pub mod reconciler;

pub use events::{LotEvent, LotPatch};
pub use publisher::SnapshotPublisher;
pub use reconcile::{patch_lot, replace_all_lots, replace_all_spots, touch};
pub use reconciler::{
    ApplyOutcome, Origin, PollTicket, Reconciler, ReconcilerConfig, SequenceClock,
};
