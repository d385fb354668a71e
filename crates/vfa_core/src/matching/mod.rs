//! Keyframe matching between the original and recorded sequences.
//!
//! Each original keyframe is compared with the recorded keyframes whose
//! index lies within a fixed radius of its own. The best score must reach
//! an acceptance threshold; when several candidates share the best score a
//! [`TieBreakPolicy`] picks the canonical one and the full tie list is kept.

mod matcher;
mod tie_break;

pub use matcher::{KeyframeMatcher, MatchingConfig};
pub use tie_break::{get_policy, FirstSeen, NearestIndex, TieBreakPolicy};
