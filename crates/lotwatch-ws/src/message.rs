//! Push channel message types.
//!
//! Every inbound frame is a JSON envelope `{"type": ..., "data": ...}`.
//! `lot_spots` frames may also carry a top-level `lot_id`. Frames are
//! decoded into the closed [`ServerMessage`] set; anything with an
//! unrecognized `type` becomes [`ServerMessage::Unknown`] so the caller can
//! ignore it without treating it as an error.

use crate::error::{WsError, WsResult};
use lotwatch_core::{LotId, LotSummary, SpotId, SpotState};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope shared by all inbound frames.
#[derive(Debug, Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    lot_id: Option<LotId>,
}

/// Typed server message.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    /// Full list of lots, sent once after the channel opens.
    InitialState(Vec<LotRecord>),
    /// Partial update for one lot, optionally carrying one spot change.
    SpotUpdate(SpotUpdate),
    /// Full list of lots, sent in reply to `get_status`.
    StatusUpdate(Vec<LotRecord>),
    /// Full spot list, in reply to `get_lot_spots`.
    LotSpots {
        lot_id: Option<LotId>,
        spots: Vec<SpotRecord>,
    },
    /// Frame with a `type` this client does not handle.
    Unknown(String),
}

impl ServerMessage {
    /// Metric label for this message kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InitialState(_) => "initial_state",
            Self::SpotUpdate(_) => "spot_update",
            Self::StatusUpdate(_) => "status_update",
            Self::LotSpots { .. } => "lot_spots",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// One lot as transported on the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotRecord {
    pub lot_id: LotId,
    #[serde(default)]
    pub lot_name: String,
    pub total_spots: i64,
    pub available_spots: i64,
    #[serde(default)]
    pub occupancy_percent: Option<f64>,
}

impl From<LotRecord> for LotSummary {
    fn from(r: LotRecord) -> Self {
        LotSummary::new(
            r.lot_id,
            r.lot_name,
            r.total_spots,
            r.available_spots,
            r.occupancy_percent,
        )
    }
}

/// Partial lot update. Absent fields leave the current value untouched.
///
/// Extra fields the backend sends alongside (`lot_name`, `timestamp`, ...)
/// are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotUpdate {
    pub lot_id: LotId,
    pub total_spots: Option<i64>,
    pub available_spots: Option<i64>,
    pub occupancy_percent: Option<f64>,
    pub spot_id: Option<SpotId>,
    pub available: Option<bool>,
}

/// One spot as transported on the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotRecord {
    pub spot_id: SpotId,
    pub available: bool,
}

impl From<SpotRecord> for SpotState {
    fn from(r: SpotRecord) -> Self {
        SpotState::new(r.spot_id, r.available)
    }
}

/// Outbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask for the full spot list of one lot.
    GetLotSpots { lot_id: LotId },
    /// Ask for a fresh full lot list.
    GetStatus,
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GetLotSpots { .. } => "get_lot_spots",
            Self::GetStatus => "get_status",
        }
    }
}

/// Decode one text frame.
///
/// Returns an error for frames that are not JSON, lack a `type`, or carry a
/// payload that does not match their `type`.
pub fn decode_frame(text: &str) -> WsResult<ServerMessage> {
    let frame: RawFrame = serde_json::from_str(text)?;

    let msg = match frame.kind.as_str() {
        "initial_state" => ServerMessage::InitialState(payload(&frame.kind, frame.data)?),
        "status_update" => ServerMessage::StatusUpdate(payload(&frame.kind, frame.data)?),
        "spot_update" => ServerMessage::SpotUpdate(payload(&frame.kind, frame.data)?),
        "lot_spots" => ServerMessage::LotSpots {
            lot_id: frame.lot_id,
            spots: payload(&frame.kind, frame.data)?,
        },
        other => ServerMessage::Unknown(other.to_string()),
    };

    Ok(msg)
}

fn payload<T: DeserializeOwned>(kind: &str, data: Value) -> WsResult<T> {
    serde_json::from_value(data).map_err(|e| WsError::Decode(format!("{kind}: {e}")))
}
