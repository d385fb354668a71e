//! Canonical choice among recorded keyframes tied at the best score.

use crate::models::{FrameId, TieBreakMode};

/// Trait for tie-break strategies.
///
/// Implementations receive the tied candidates in discovery order
/// (ascending recorded index) and return the one used downstream.
pub trait TieBreakPolicy: Send + Sync {
    /// Get the name of this policy.
    fn name(&self) -> &'static str;

    /// Choose the canonical candidate; `None` only when `ties` is empty.
    fn choose(&self, original: FrameId, ties: &[FrameId]) -> Option<FrameId>;
}

/// The first candidate discovered wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstSeen;

impl TieBreakPolicy for FirstSeen {
    fn name(&self) -> &'static str {
        "first_seen"
    }

    fn choose(&self, _original: FrameId, ties: &[FrameId]) -> Option<FrameId> {
        ties.first().copied()
    }
}

/// The candidate closest to the original index wins; first seen on equal
/// distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestIndex;

impl TieBreakPolicy for NearestIndex {
    fn name(&self) -> &'static str {
        "nearest_index"
    }

    fn choose(&self, original: FrameId, ties: &[FrameId]) -> Option<FrameId> {
        // min_by_key keeps the first of equal minima
        ties.iter().copied().min_by_key(|id| id.distance(original))
    }
}

/// Create a tie-break policy for the given mode.
pub fn get_policy(mode: TieBreakMode) -> Box<dyn TieBreakPolicy> {
    match mode {
        TieBreakMode::FirstSeen => Box::new(FirstSeen),
        TieBreakMode::NearestIndex => Box::new(NearestIndex),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[usize]) -> Vec<FrameId> {
        raw.iter().copied().map(FrameId::new).collect()
    }

    #[test]
    fn first_seen_takes_discovery_order() {
        let ties = ids(&[90, 100, 130]);
        assert_eq!(FirstSeen.choose(FrameId::new(100), &ties), Some(FrameId::new(90)));
    }

    #[test]
    fn nearest_index_prefers_distance_then_order() {
        let original = FrameId::new(100);
        assert_eq!(
            NearestIndex.choose(original, &ids(&[90, 103, 130])),
            Some(FrameId::new(103))
        );
        // 95 and 105 are equally far; 95 was seen first
        assert_eq!(
            NearestIndex.choose(original, &ids(&[95, 105])),
            Some(FrameId::new(95))
        );
    }

    #[test]
    fn empty_ties_choose_nothing() {
        assert_eq!(FirstSeen.choose(FrameId::new(1), &[]), None);
        assert_eq!(NearestIndex.choose(FrameId::new(1), &[]), None);
    }

    #[test]
    fn factory_matches_mode() {
        assert_eq!(get_policy(TieBreakMode::FirstSeen).name(), "first_seen");
        assert_eq!(get_policy(TieBreakMode::NearestIndex).name(), "nearest_index");
    }
}
