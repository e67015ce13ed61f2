//! Pure reconciliation steps.
//!
//! Each function takes the current snapshot and one event and returns the
//! next snapshot. None of them touch `last_updated`; [`touch`] does that
//! separately so the steps can be compared for equality on their own.

use crate::events::LotPatch;
use chrono::{DateTime, Utc};
use lotwatch_core::{LotId, LotSummary, Snapshot, SpotState, SpotView};
use std::collections::HashMap;

/// Replace the lot list with `lots`, keeping server order.
///
/// A repeated id keeps the position of its first occurrence and the values
/// of its last.
pub fn replace_all_lots(snapshot: &Snapshot, lots: Vec<LotSummary>) -> Snapshot {
    let mut index: HashMap<LotId, usize> = HashMap::with_capacity(lots.len());
    let mut merged: Vec<LotSummary> = Vec::with_capacity(lots.len());

    for lot in lots {
        match index.get(&lot.id) {
            Some(&i) => merged[i] = lot,
            None => {
                index.insert(lot.id, merged.len());
                merged.push(lot);
            }
        }
    }

    Snapshot {
        lots: merged,
        spot_view: snapshot.spot_view.clone(),
        last_updated: snapshot.last_updated,
    }
}

/// Apply a partial update to one lot.
///
/// Returns `None` when the lot is unknown; nothing is synthesized from a
/// partial update. Lot fields change only if the patch carries
/// `available_spots`; without it `total_spots` and `occupancy_percent` are
/// ignored. The spot part applies only when the viewed spot list belongs to
/// the same lot and contains the spot.
pub fn patch_lot(snapshot: &Snapshot, patch: &LotPatch) -> Option<Snapshot> {
    let pos = snapshot.lots.iter().position(|l| l.id == patch.lot_id)?;

    let mut next = snapshot.clone();
    if let Some(available) = patch.available_spots {
        let lot = &mut next.lots[pos];
        lot.available_spots = available;
        if let Some(total) = patch.total_spots {
            lot.total_spots = total;
        }
        if let Some(pct) = patch.occupancy_percent {
            lot.occupancy_percent = pct;
        }
    }

    if let (Some(spot_id), Some(available)) = (patch.spot_id, patch.available) {
        if let Some(view) = next.spot_view.as_mut().filter(|v| v.lot_id == patch.lot_id) {
            if let Some(spot) = view.spots.iter_mut().find(|s| s.id == spot_id) {
                spot.available = available;
            }
        }
    }

    Some(next)
}

/// Replace the viewed spot list with `spots` for `lot_id`.
pub fn replace_all_spots(snapshot: &Snapshot, lot_id: LotId, spots: Vec<SpotState>) -> Snapshot {
    let mut index = HashMap::with_capacity(spots.len());
    let mut merged: Vec<SpotState> = Vec::with_capacity(spots.len());

    for spot in spots {
        match index.get(&spot.id) {
            Some(&i) => merged[i] = spot,
            None => {
                index.insert(spot.id, merged.len());
                merged.push(spot);
            }
        }
    }

    Snapshot {
        lots: snapshot.lots.clone(),
        spot_view: Some(SpotView::new(lot_id, merged)),
        last_updated: snapshot.last_updated,
    }
}

/// Stamp the snapshot with `now`.
pub fn touch(mut snapshot: Snapshot, now: DateTime<Utc>) -> Snapshot {
    snapshot.last_updated = Some(now);
    snapshot
}
