//! Data models for Video Frame Align.
//!
//! - Frame identity and naming (`FrameId`, `Sequence`)
//! - Keyframe correspondence (`KeyframeMatch`, `CorrespondenceEntry`)
//! - Per-frame results and the aggregated `AlignmentReport`

mod enums;
mod frame_id;
mod keyframes;
mod report;

pub use enums::TieBreakMode;
pub use frame_id::{
    parse_frame_name, FrameId, Sequence, FRAME_EXTENSION, FRAME_INDEX_DIGITS, FRAME_PREFIX,
};
pub use keyframes::{CorrespondenceEntry, KeyframeMatch, NO_SCORE};
pub use report::{
    AlignmentReport, CorrespondenceStatus, CoverageGap, FrameCorrespondence, GapReason,
    ReportSummary, SegmentSummary,
};
