//! Occupancy data model.
//!
//! `Snapshot` is the only thing presentation ever sees. It is replaced
//! wholesale on every reconciliation and never mutated in place once
//! published.

use crate::ids::{LotId, SpotId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Occupancy summary for a single lot.
///
/// `0 <= available_spots <= total_spots` is expected but not enforced:
/// values from the backend are authoritative, negative ones included. Use [`LotSummary::is_consistent`]
/// to detect a backend that violates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotSummary {
    pub id: LotId,
    pub name: String,
    pub total_spots: i64,
    pub available_spots: i64,
    /// 0-100, as transported or derived.
    pub occupancy_percent: f64,
}

impl LotSummary {
    /// Build a summary, deriving occupancy when the source omitted it.
    pub fn new(
        id: LotId,
        name: impl Into<String>,
        total_spots: i64,
        available_spots: i64,
        occupancy_percent: Option<f64>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            total_spots,
            available_spots,
            occupancy_percent: occupancy_percent
                .unwrap_or_else(|| derive_occupancy_percent(total_spots, available_spots)),
        }
    }

    /// Whether the available count is non-negative and fits inside the
    /// capacity.
    pub fn is_consistent(&self) -> bool {
        (0..=self.total_spots).contains(&self.available_spots)
    }

    /// Occupied spot count, clamped to `0..=total_spots` for inconsistent data.
    pub fn occupied_spots(&self) -> i64 {
        let total = self.total_spots.max(0);
        total - self.available_spots.clamp(0, total)
    }
}

/// Occupancy percentage rounded to one decimal, 0 for a lot without
/// capacity. Inconsistent counts are not corrected.
pub fn derive_occupancy_percent(total_spots: i64, available_spots: i64) -> f64 {
    if total_spots <= 0 {
        return 0.0;
    }
    let occupied = (total_spots - available_spots) as f64;
    (occupied / total_spots as f64 * 1000.0).round() / 10.0
}

/// Availability of one spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotState {
    pub id: SpotId,
    pub available: bool,
}

impl SpotState {
    pub fn new(id: SpotId, available: bool) -> Self {
        Self { id, available }
    }
}

/// Spot list for the lot currently opened in the detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotView {
    pub lot_id: LotId,
    pub spots: Vec<SpotState>,
}

impl SpotView {
    pub fn new(lot_id: LotId, spots: Vec<SpotState>) -> Self {
        Self { lot_id, spots }
    }

    pub fn get(&self, id: SpotId) -> Option<&SpotState> {
        self.spots.iter().find(|s| s.id == id)
    }

    pub fn available_count(&self) -> usize {
        self.spots.iter().filter(|s| s.available).count()
    }
}

/// Complete view of known lot and spot state at one point in time.
///
/// Lots keep server order and never contain duplicate ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub lots: Vec<LotSummary>,
    pub spot_view: Option<SpotView>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// Empty snapshot used at startup.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn lot(&self, id: LotId) -> Option<&LotSummary> {
        self.lots.iter().find(|l| l.id == id)
    }

    pub fn has_lots(&self) -> bool {
        !self.lots.is_empty()
    }

    /// Spots of `lot_id`, if that lot is the one being viewed.
    pub fn spots_for(&self, lot_id: LotId) -> Option<&[SpotState]> {
        self.spot_view
            .as_ref()
            .filter(|v| v.lot_id == lot_id)
            .map(|v| v.spots.as_slice())
    }

    /// Sum of available spots over all lots. Negative counts add nothing.
    pub fn total_available(&self) -> u64 {
        self.lots
            .iter()
            .map(|l| u64::try_from(l.available_spots).unwrap_or(0))
            .sum()
    }
}
