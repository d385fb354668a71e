//! Per-frame refinement task.
//!
//! Pure with respect to shared state: a task only reads from the two frame
//! stores, so any number of tasks can run at once.

use crate::frames::FrameStore;
use crate::models::{CorrespondenceStatus, FrameCorrespondence, FrameId};
use crate::similarity::Histogram;

/// One original frame and the recorded candidates to compare it against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTask {
    /// Original frame to place.
    pub original: FrameId,
    /// Recorded candidates, nearest to the implied index first.
    pub candidates: Vec<FrameId>,
}

/// Recorded index implied by linear interpolation between two keyframe pairs.
///
/// `original` must lie inside `original_range`. Rounds half up. A
/// single-frame original range maps to the recorded start.
pub fn implied_index(
    original: FrameId,
    original_range: (FrameId, FrameId),
    recorded_range: (FrameId, FrameId),
) -> FrameId {
    let (o_start, o_end) = (original_range.0.index(), original_range.1.index());
    let (r_start, r_end) = (recorded_range.0.index(), recorded_range.1.index());

    let span = o_end.saturating_sub(o_start);
    if span == 0 {
        return recorded_range.0;
    }

    let num = original.index().saturating_sub(o_start) * r_end.saturating_sub(r_start);
    FrameId::new(r_start + (2 * num + span) / (2 * span))
}

/// Candidates around `implied`: `c, c-1, c+1, c-2, c+2, ...` up to
/// `look_around` on each side, clipped to `recorded_range` (inclusive).
pub fn candidate_order(
    implied: FrameId,
    look_around: usize,
    recorded_range: (FrameId, FrameId),
) -> Vec<FrameId> {
    let (lo, hi) = (recorded_range.0.index(), recorded_range.1.index());
    let c = implied.index();
    let in_range = |i: usize| i >= lo && i <= hi;

    let mut order = Vec::with_capacity(2 * look_around + 1);
    if in_range(c) {
        order.push(implied);
    }
    for delta in 1..=look_around {
        if let Some(below) = c.checked_sub(delta) {
            if in_range(below) {
                order.push(FrameId::new(below));
            }
        }
        let above = c + delta;
        if in_range(above) {
            order.push(FrameId::new(above));
        }
    }
    order
}

/// Find the best recorded candidate for one original frame.
///
/// Candidates are visited in order and only a strictly better score
/// replaces the current best, so ties resolve toward the implied index.
pub fn refine_frame(
    task: &FrameTask,
    original_store: &dyn FrameStore,
    recorded_store: &dyn FrameStore,
) -> FrameCorrespondence {
    let frame = match original_store.load(task.original) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!("Original frame unreadable: {}", e);
            return FrameCorrespondence::unmatched(
                task.original,
                CorrespondenceStatus::OriginalUnreadable,
            );
        }
    };
    let histogram = Histogram::from_image(&frame);
    drop(frame);

    let mut best: Option<(FrameId, f64)> = None;
    for &candidate in &task.candidates {
        let recorded = match recorded_store.load(candidate) {
            Ok(recorded) => recorded,
            Err(e) => {
                tracing::warn!("Candidate skipped: {}", e);
                continue;
            }
        };
        let score = histogram.correlation(&Histogram::from_image(&recorded));
        tracing::debug!("{} vs recorded {}: {:.6}", task.original, candidate, score);

        if best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }

    match best {
        Some((recorded, score)) => FrameCorrespondence::matched(task.original, recorded, score),
        None => {
            tracing::warn!("No readable candidate for original {}", task.original);
            FrameCorrespondence::unmatched(task.original, CorrespondenceStatus::NoCandidate)
        }
    }
}
