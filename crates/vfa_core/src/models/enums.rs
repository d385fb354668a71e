//! Enums shared between settings and components.

use serde::{Deserialize, Serialize};

/// Rule for choosing the canonical keyframe among equally scored candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakMode {
    /// The first candidate found (lowest recorded index) wins.
    #[default]
    FirstSeen,
    /// The candidate closest to the original index wins.
    NearestIndex,
}

impl std::fmt::Display for TieBreakMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TieBreakMode::FirstSeen => write!(f, "first_seen"),
            TieBreakMode::NearestIndex => write!(f, "nearest_index"),
        }
    }
}
