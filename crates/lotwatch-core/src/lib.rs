//! Core domain types for the lotwatch parking occupancy client.
//!
//! This crate provides the data model shared by every other crate:
//! - `LotId`, `SpotId`: identifiers that decode from either JSON numbers or strings
//! - `LotSummary`, `SpotState`: per-lot and per-spot occupancy
//! - `Snapshot`: the complete, internally consistent view handed to presentation
//! - `LayoutVariant`: spot layout chosen from a lot id

pub mod error;
pub mod ids;
pub mod layout;
pub mod types;

pub use error::{CoreError, Result};
pub use ids::{LotId, SpotId};
pub use layout::LayoutVariant;
pub use types::{derive_occupancy_percent, LotSummary, Snapshot, SpotState, SpotView};
