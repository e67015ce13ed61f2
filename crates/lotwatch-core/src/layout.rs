//! Spot layout selection.

use crate::ids::LotId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Visual arrangement used when drawing a lot's spots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutVariant {
    Horizontal,
    Angled,
    Vertical,
    Double,
    Compact,
}

impl LayoutVariant {
    pub const ALL: [Self; 5] = [
        Self::Horizontal,
        Self::Angled,
        Self::Vertical,
        Self::Double,
        Self::Compact,
    ];

    /// Pick the layout for a lot. Stable for a given id.
    pub fn for_lot(id: LotId) -> Self {
        let idx = id.value().rem_euclid(Self::ALL.len() as i64) as usize;
        Self::ALL[idx]
    }
}

impl fmt::Display for LayoutVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => write!(f, "horizontal"),
            Self::Angled => write!(f, "angled"),
            Self::Vertical => write!(f, "vertical"),
            Self::Double => write!(f, "double"),
            Self::Compact => write!(f, "compact"),
        }
    }
}
