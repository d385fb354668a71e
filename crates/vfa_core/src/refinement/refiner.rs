//! Dense refinement inside matched keyframe segments.

use crate::config::RefinementSettings;
use crate::error::TaskError;
use crate::frames::FrameStore;
use crate::models::{
    AlignmentReport, CorrespondenceEntry, CorrespondenceStatus, CoverageGap, FrameCorrespondence,
    FrameId, GapReason, SegmentSummary,
};

use super::executor::{RayonExecutor, TaskExecutor};
use super::task::{candidate_order, implied_index, refine_frame, FrameTask};

/// Configuration for segment refinement.
#[derive(Debug, Clone)]
pub struct RefinementConfig {
    /// Recorded frames examined on each side of the implied index.
    pub look_around: usize,
    /// Worker threads (0 = one per available CPU).
    pub workers: usize,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            look_around: 3,
            workers: 0,
        }
    }
}

impl From<&RefinementSettings> for RefinementConfig {
    fn from(settings: &RefinementSettings) -> Self {
        Self {
            look_around: settings.look_around,
            workers: settings.workers,
        }
    }
}

/// Result of a refinement run.
#[derive(Debug, Default)]
pub struct RefinementOutcome {
    /// Rows, segment summaries and coverage gaps.
    pub report: AlignmentReport,
    /// Tasks that failed on the worker pool (also present as rows).
    pub worker_failures: Vec<TaskError>,
}

impl RefinementOutcome {
    pub fn into_report(self) -> AlignmentReport {
        self.report
    }
}

/// A segment that was not refined.
#[derive(Debug, Clone, Copy)]
struct SkippedSegment {
    start: usize,
    end: usize,
    reason: GapReason,
}

/// Refines every original frame between consecutive accepted keyframes.
pub struct SegmentRefiner {
    config: RefinementConfig,
    executor: Box<dyn TaskExecutor>,
}

impl SegmentRefiner {
    /// Create a refiner backed by a dedicated rayon pool.
    pub fn new(config: RefinementConfig) -> Result<Self, TaskError> {
        let executor = RayonExecutor::new(config.workers)?;
        Ok(Self::with_executor(config, Box::new(executor)))
    }

    /// Create a refiner with a custom executor.
    pub fn with_executor(config: RefinementConfig, executor: Box<dyn TaskExecutor>) -> Self {
        Self { config, executor }
    }

    pub fn config(&self) -> &RefinementConfig {
        &self.config
    }

    /// Refine the frames covered by the correspondence list.
    ///
    /// `entries` must be strictly increasing by original frame.
    pub fn refine(
        &self,
        entries: &[CorrespondenceEntry],
        original_store: &dyn FrameStore,
        recorded_store: &dyn FrameStore,
    ) -> RefinementOutcome {
        self.refine_with_progress(entries, original_store, recorded_store, |_, _| {})
    }

    /// Like [`refine`](Self::refine), reporting `(segments_done, segments)`
    /// after each segment.
    pub fn refine_with_progress<F>(
        &self,
        entries: &[CorrespondenceEntry],
        original_store: &dyn FrameStore,
        recorded_store: &dyn FrameStore,
        mut progress: F,
    ) -> RefinementOutcome
    where
        F: FnMut(usize, usize),
    {
        let sequence_len = entries
            .iter()
            .map(|e| e.original.index() + 1)
            .fold(original_store.sequence_len(), usize::max);
        let mut covered = vec![false; sequence_len];
        let mut outcome = RefinementOutcome::default();
        let mut skipped = Vec::new();

        let segments = entries.len().saturating_sub(1);
        tracing::info!(
            "Refining {} segments with {} executor ({} workers, look-around {})",
            segments,
            self.executor.name(),
            self.executor.parallelism(),
            self.config.look_around
        );

        for (k, pair) in entries.windows(2).enumerate() {
            let (start, end) = (pair[0], pair[1]);
            if end.original <= start.original {
                tracing::warn!(
                    "Entries {} and {} are not increasing; segment ignored",
                    start.original,
                    end.original
                );
                skipped.push(SkippedSegment {
                    start: end.original.index(),
                    end: start.original.index(),
                    reason: GapReason::NonIncreasingEntries,
                });
                progress(k + 1, segments);
                continue;
            }

            match (start.recorded, end.recorded) {
                (Some(r_start), Some(r_end)) if r_end >= r_start => {
                    let summary = self.refine_segment(
                        (start.original, end.original),
                        (r_start, r_end),
                        original_store,
                        recorded_store,
                        &mut covered,
                        &mut outcome,
                    );
                    outcome.report.segments.push(summary);
                }
                (Some(r_start), Some(r_end)) => {
                    tracing::warn!(
                        "Segment {}..{} skipped: recorded range {}..{} runs backwards",
                        start.original,
                        end.original,
                        r_start,
                        r_end
                    );
                    skipped.push(SkippedSegment {
                        start: start.original.index(),
                        end: end.original.index(),
                        reason: GapReason::ReversedRecordedRange,
                    });
                }
                _ => {
                    tracing::warn!(
                        "Segment {}..{} skipped: endpoint without a match",
                        start.original,
                        end.original
                    );
                    skipped.push(SkippedSegment {
                        start: start.original.index(),
                        end: end.original.index(),
                        reason: GapReason::RejectedEndpoint,
                    });
                }
            }
            progress(k + 1, segments);
        }

        outcome.report.gaps = coverage_gaps(&covered, entries, &skipped);
        for gap in &outcome.report.gaps {
            tracing::info!("Frames {}..{} uncovered: {}", gap.start, gap.end, gap.reason);
        }

        let summary = outcome.report.summary();
        tracing::info!(
            "Refinement produced {} rows ({} matched, {} uncovered frames)",
            summary.rows,
            summary.matched,
            summary.uncovered_frames
        );
        outcome
    }

    fn refine_segment(
        &self,
        original_range: (FrameId, FrameId),
        recorded_range: (FrameId, FrameId),
        original_store: &dyn FrameStore,
        recorded_store: &dyn FrameStore,
        covered: &mut [bool],
        outcome: &mut RefinementOutcome,
    ) -> SegmentSummary {
        let (o_start, o_end) = (original_range.0.index(), original_range.1.index());
        let original_len = o_end - o_start + 1;
        let recorded_len = recorded_range.1.index() - recorded_range.0.index() + 1;
        let ratio = 1.0 - recorded_len as f64 / original_len as f64;

        tracing::info!(
            "Segment original {}..{} <-> recorded {}..{} (ratio {:.4})",
            original_range.0,
            original_range.1,
            recorded_range.0,
            recorded_range.1,
            ratio
        );

        // The shared boundary frame belongs to the segment that emitted it first
        let tasks: Vec<FrameTask> = (o_start..=o_end)
            .filter(|&i| !covered[i])
            .map(|i| {
                let original = FrameId::new(i);
                let implied = implied_index(original, original_range, recorded_range);
                FrameTask {
                    original,
                    candidates: candidate_order(implied, self.config.look_around, recorded_range),
                }
            })
            .collect();

        let work = |task: &FrameTask| refine_frame(task, original_store, recorded_store);
        let mut rows: Vec<FrameCorrespondence> = Vec::with_capacity(tasks.len());
        for result in self.executor.execute(&tasks, &work) {
            match result {
                Ok(row) => rows.push(row),
                Err(e) => {
                    tracing::warn!("{}", e);
                    if let Some(frame) = e.frame() {
                        rows.push(FrameCorrespondence::unmatched(
                            frame,
                            CorrespondenceStatus::WorkerFailed,
                        ));
                    }
                    outcome.worker_failures.push(e);
                }
            }
        }
        rows.sort_by_key(|row| row.original);

        for row in &rows {
            covered[row.original.index()] = true;
        }

        let frames_unmatched = rows.iter().filter(|r| !r.is_matched()).count();
        let summary = SegmentSummary {
            original_start: original_range.0,
            original_end: original_range.1,
            recorded_start: recorded_range.0,
            recorded_end: recorded_range.1,
            ratio,
            frames_refined: rows.len(),
            frames_unmatched,
        };
        outcome.report.rows.extend(rows);
        summary
    }
}

/// Group uncovered original frames into maximal gaps sharing one reason.
fn coverage_gaps(
    covered: &[bool],
    entries: &[CorrespondenceEntry],
    skipped: &[SkippedSegment],
) -> Vec<CoverageGap> {
    let first = entries.first().map(|e| e.original.index());
    let last = entries.last().map(|e| e.original.index());

    // Skipped ranges may overlap when entries are out of order; the first one wins
    let mut skipped_reason: Vec<Option<GapReason>> = vec![None; covered.len()];
    for segment in skipped {
        let end = (segment.end + 1).min(covered.len());
        for slot in skipped_reason.iter_mut().take(end).skip(segment.start) {
            slot.get_or_insert(segment.reason);
        }
    }

    let reason_for = |i: usize| -> GapReason {
        let (Some(first), Some(last)) = (first, last) else {
            return GapReason::BeforeFirstKeyframe;
        };
        if i < first {
            return GapReason::BeforeFirstKeyframe;
        }
        if let Some(reason) = skipped_reason[i] {
            return reason;
        }
        if i >= last {
            GapReason::AfterLastKeyframe
        } else {
            GapReason::RejectedEndpoint
        }
    };

    let mut gaps: Vec<CoverageGap> = Vec::new();
    for i in (0..covered.len()).filter(|&i| !covered[i]) {
        let reason = reason_for(i);
        match gaps.last_mut() {
            Some(gap) if gap.end.index() + 1 == i && gap.reason == reason => {
                gap.end = FrameId::new(i);
            }
            _ => gaps.push(CoverageGap {
                start: FrameId::new(i),
                end: FrameId::new(i),
                reason,
            }),
        }
    }
    gaps
}
