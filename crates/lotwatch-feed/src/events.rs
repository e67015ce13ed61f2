//! Reconciler input events.

use lotwatch_core::{LotId, LotSummary, SpotId, SpotState};
use lotwatch_ws::{ServerMessage, SpotUpdate};

/// One write request for the reconciler, from either source.
#[derive(Debug, Clone, PartialEq)]
pub enum LotEvent {
    /// Replace the whole lot list.
    ReplaceLots(Vec<LotSummary>),
    /// Patch one lot and optionally one of its spots.
    PatchLot(LotPatch),
    /// Replace the spot list. `lot_id` is `None` when the source did not
    /// say which lot the list belongs to.
    ReplaceSpots {
        lot_id: Option<LotId>,
        spots: Vec<SpotState>,
    },
    /// Nothing to apply.
    Ignored(String),
}

impl LotEvent {
    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ReplaceLots(_) => "replace_lots",
            Self::PatchLot(_) => "patch_lot",
            Self::ReplaceSpots { .. } => "replace_spots",
            Self::Ignored(_) => "ignored",
        }
    }
}

/// Partial lot update. `None` fields are left as they are.
///
/// The lot counters change only when `available_spots` is present;
/// `total_spots` and `occupancy_percent` ride along with it.
#[derive(Debug, Clone, PartialEq)]
pub struct LotPatch {
    pub lot_id: LotId,
    pub total_spots: Option<i64>,
    pub available_spots: Option<i64>,
    pub occupancy_percent: Option<f64>,
    pub spot_id: Option<SpotId>,
    pub available: Option<bool>,
}

impl LotPatch {
    pub fn new(lot_id: LotId) -> Self {
        Self {
            lot_id,
            total_spots: None,
            available_spots: None,
            occupancy_percent: None,
            spot_id: None,
            available: None,
        }
    }
}

impl From<SpotUpdate> for LotPatch {
    fn from(u: SpotUpdate) -> Self {
        Self {
            lot_id: u.lot_id,
            total_spots: u.total_spots,
            available_spots: u.available_spots,
            occupancy_percent: u.occupancy_percent,
            spot_id: u.spot_id,
            available: u.available,
        }
    }
}

impl From<ServerMessage> for LotEvent {
    fn from(msg: ServerMessage) -> Self {
        match msg {
            ServerMessage::InitialState(lots) | ServerMessage::StatusUpdate(lots) => {
                Self::ReplaceLots(lots.into_iter().map(Into::into).collect())
            }
            ServerMessage::SpotUpdate(update) => Self::PatchLot(update.into()),
            ServerMessage::LotSpots { lot_id, spots } => Self::ReplaceSpots {
                lot_id,
                spots: spots.into_iter().map(Into::into).collect(),
            },
            ServerMessage::Unknown(kind) => Self::Ignored(kind),
        }
    }
}
