//! Per-frame correspondence results and the aggregated alignment report.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::keyframes::NO_SCORE;
use super::FrameId;

/// How a per-frame refinement task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrespondenceStatus {
    /// A recorded frame was matched.
    Matched,
    /// The original frame could not be decoded.
    OriginalUnreadable,
    /// No candidate in the look-around window could be scored.
    NoCandidate,
    /// The task itself failed (panicked) on the worker pool.
    WorkerFailed,
}

impl fmt::Display for CorrespondenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Matched => "matched",
            Self::OriginalUnreadable => "original_unreadable",
            Self::NoCandidate => "no_candidate",
            Self::WorkerFailed => "worker_failed",
        };
        f.write_str(s)
    }
}

/// Final correspondence for one original frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameCorrespondence {
    /// Original frame.
    pub original: FrameId,
    /// Best recorded frame, if any.
    pub matched: Option<FrameId>,
    /// Similarity of the best pair ([`NO_SCORE`] when unmatched).
    pub score: f64,
    /// `1.0 - score`, or `1.0` when unmatched.
    pub difference: f64,
    /// Outcome of the refinement task.
    pub status: CorrespondenceStatus,
}

impl FrameCorrespondence {
    /// Create a matched correspondence.
    pub fn matched(original: FrameId, recorded: FrameId, score: f64) -> Self {
        Self {
            original,
            matched: Some(recorded),
            score,
            difference: 1.0 - score,
            status: CorrespondenceStatus::Matched,
        }
    }

    /// Create an unmatched correspondence with the given reason.
    pub fn unmatched(original: FrameId, status: CorrespondenceStatus) -> Self {
        Self {
            original,
            matched: None,
            score: NO_SCORE,
            difference: 1.0,
            status,
        }
    }

    /// Whether a recorded frame was matched.
    pub fn is_matched(&self) -> bool {
        self.matched.is_some()
    }
}

/// Diagnostics for one refined segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSummary {
    /// First original frame of the segment.
    pub original_start: FrameId,
    /// Last original frame of the segment (inclusive).
    pub original_end: FrameId,
    /// First recorded frame of the segment.
    pub recorded_start: FrameId,
    /// Last recorded frame of the segment (inclusive).
    pub recorded_end: FrameId,
    /// `1 - recorded_len / original_len`; positive when the capture is
    /// shorter than the source over this interval.
    pub ratio: f64,
    /// Rows produced by this segment.
    pub frames_refined: usize,
    /// Rows of this segment that ended unmatched.
    pub frames_unmatched: usize,
}

impl SegmentSummary {
    /// Number of original frames in the segment.
    pub fn original_len(&self) -> usize {
        self.original_end.index() - self.original_start.index() + 1
    }

    /// Number of recorded frames in the segment.
    pub fn recorded_len(&self) -> usize {
        self.recorded_end.index() - self.recorded_start.index() + 1
    }
}

/// Why a range of original frames has no rows in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapReason {
    /// Frames before the first keyframe entry.
    BeforeFirstKeyframe,
    /// Frames after the last keyframe entry.
    AfterLastKeyframe,
    /// One of the bounding keyframes has no accepted match.
    RejectedEndpoint,
    /// The bounding recorded keyframes run backwards.
    ReversedRecordedRange,
    /// The bounding original keyframes do not increase.
    NonIncreasingEntries,
}

impl fmt::Display for GapReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BeforeFirstKeyframe => "before first keyframe",
            Self::AfterLastKeyframe => "after last keyframe",
            Self::RejectedEndpoint => "segment endpoint has no match",
            Self::ReversedRecordedRange => "recorded range runs backwards",
            Self::NonIncreasingEntries => "keyframe entries out of order",
        };
        f.write_str(s)
    }
}

/// A range of original frames (inclusive) deliberately left uncovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageGap {
    /// First uncovered frame.
    pub start: FrameId,
    /// Last uncovered frame (inclusive).
    pub end: FrameId,
    /// Why the range is uncovered.
    pub reason: GapReason,
}

#[allow(clippy::len_without_is_empty)]
impl CoverageGap {
    /// Number of frames in the gap (never zero).
    pub fn len(&self) -> usize {
        self.end.index() - self.start.index() + 1
    }
}

/// Aggregate statistics over the report rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Total rows.
    pub rows: usize,
    /// Rows with a recorded match.
    pub matched: usize,
    /// Mean score over matched rows.
    pub mean_score: Option<f64>,
    /// Lowest score over matched rows.
    pub min_score: Option<f64>,
    /// Original frames not covered by any row.
    pub uncovered_frames: usize,
}

/// The ordered correspondence table handed to reporting tools.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlignmentReport {
    /// One row per refined original frame, sorted by original index.
    pub rows: Vec<FrameCorrespondence>,
    /// Diagnostics per refined segment.
    pub segments: Vec<SegmentSummary>,
    /// Original frame ranges without rows.
    pub gaps: Vec<CoverageGap>,
}

impl AlignmentReport {
    /// Compute summary statistics.
    pub fn summary(&self) -> ReportSummary {
        let matched: Vec<f64> = self
            .rows
            .iter()
            .filter(|r| r.is_matched())
            .map(|r| r.score)
            .collect();

        let mean_score = if matched.is_empty() {
            None
        } else {
            Some(matched.iter().sum::<f64>() / matched.len() as f64)
        };
        let min_score = matched.iter().copied().reduce(f64::min);

        ReportSummary {
            rows: self.rows.len(),
            matched: matched.len(),
            mean_score,
            min_score,
            uncovered_frames: self.gaps.iter().map(CoverageGap::len).sum(),
        }
    }

    /// Look up the row for an original frame.
    pub fn row(&self, original: FrameId) -> Option<&FrameCorrespondence> {
        self.rows
            .binary_search_by_key(&original, |r| r.original)
            .ok()
            .map(|i| &self.rows[i])
    }

    /// Whether rows are strictly increasing by original frame.
    pub fn is_sorted(&self) -> bool {
        self.rows.windows(2).all(|w| w[0].original < w[1].original)
    }
}
