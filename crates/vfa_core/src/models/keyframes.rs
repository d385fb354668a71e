//! Keyframe correspondence types.

use serde::{Deserialize, Serialize};

use super::FrameId;

/// Score recorded when no candidate could be scored at all.
pub const NO_SCORE: f64 = -1.0;

/// Result of matching one original keyframe against the recorded keyframes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyframeMatch {
    /// Original keyframe.
    pub original: FrameId,
    /// Canonical recorded keyframe, `None` when the match was rejected.
    pub recorded: Option<FrameId>,
    /// Best score observed among the candidates ([`NO_SCORE`] if none).
    pub score: f64,
    /// Every candidate that reached the best score, in discovery order.
    #[serde(default)]
    pub ties: Vec<FrameId>,
    /// `recorded - original` in frames, `None` when rejected.
    pub frame_offset: Option<i64>,
}

impl KeyframeMatch {
    /// Create an accepted match.
    pub fn accepted(original: FrameId, recorded: FrameId, score: f64, ties: Vec<FrameId>) -> Self {
        Self {
            original,
            recorded: Some(recorded),
            score,
            ties,
            frame_offset: Some(original.offset_to(recorded)),
        }
    }

    /// Create a rejected match that still records the best observed score.
    pub fn rejected(original: FrameId, best_score: f64) -> Self {
        Self {
            original,
            recorded: None,
            score: best_score,
            ties: Vec::new(),
            frame_offset: None,
        }
    }

    /// Whether a recorded keyframe was accepted.
    pub fn is_accepted(&self) -> bool {
        self.recorded.is_some()
    }

    /// Whether more than one candidate reached the best score.
    pub fn has_tie(&self) -> bool {
        self.ties.len() > 1
    }

    /// Frame offset as display text (`N/A` when rejected).
    pub fn frame_offset_label(&self) -> String {
        match self.frame_offset {
            Some(offset) => offset.to_string(),
            None => "N/A".to_string(),
        }
    }

    /// Reduce to the canonical row of the editable correspondence list.
    pub fn to_entry(&self) -> CorrespondenceEntry {
        CorrespondenceEntry {
            original: self.original,
            recorded: self.recorded,
        }
    }
}

/// One row of the editable correspondence list.
///
/// The list is what refinement consumes, so it may have been corrected by
/// hand after matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrespondenceEntry {
    /// Original keyframe.
    pub original: FrameId,
    /// Matched recorded keyframe, if any.
    pub recorded: Option<FrameId>,
}

impl CorrespondenceEntry {
    /// Create an entry.
    pub fn new(original: FrameId, recorded: Option<FrameId>) -> Self {
        Self { original, recorded }
    }
}
