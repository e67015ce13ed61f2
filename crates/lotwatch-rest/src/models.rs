//! REST response and request bodies.

use lotwatch_core::{LotId, LotSummary, SpotId, SpotState};
use serde::{Deserialize, Serialize};

/// One row of `/api/dashboard/` and `/api/lots/for-my-permit/`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DashboardLot {
    pub id: LotId,
    #[serde(default)]
    pub name: String,
    pub total_spots: i64,
    pub available_spots: i64,
    #[serde(default)]
    pub occupancy_percent: Option<f64>,
}

impl From<DashboardLot> for LotSummary {
    fn from(l: DashboardLot) -> Self {
        LotSummary::new(
            l.id,
            l.name,
            l.total_spots,
            l.available_spots,
            l.occupancy_percent,
        )
    }
}

/// One row of `/api/spots/?parking_lot={id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RestSpot {
    pub parking_spot_id: SpotId,
    pub availability: bool,
}

impl From<RestSpot> for SpotState {
    fn from(s: RestSpot) -> Self {
        SpotState::new(s.parking_spot_id, s.availability)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RestrictedLot {
    pub parking_lot_id: LotId,
    #[serde(default)]
    pub parking_lot_name: String,
}

/// Event restricting access to some lots today.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActiveEvent {
    #[serde(default)]
    pub event_id: Option<i64>,
    pub event_name: String,
    #[serde(default)]
    pub restricted_lots: Vec<RestrictedLot>,
}

/// Whether any active event restricts `lot_id`.
pub fn is_lot_restricted(events: &[ActiveEvent], lot_id: LotId) -> bool {
    events
        .iter()
        .any(|e| e.restricted_lots.iter().any(|l| l.parking_lot_id == lot_id))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PermitType {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Vehicle {
    pub vehicle_id: i64,
    #[serde(default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
}

/// `/api/me/` body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Profile {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub permit_type: Option<PermitType>,
    #[serde(default)]
    pub vehicles: Vec<Vehicle>,
}

impl Profile {
    /// Name shown in greetings.
    pub fn display_name(&self) -> &str {
        if self.first_name.is_empty() {
            &self.username
        } else {
            &self.first_name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewVehicle {
    pub make: String,
    pub model: String,
}
