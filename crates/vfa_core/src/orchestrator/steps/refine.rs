//! Refine step - per-frame correspondence inside matched segments.
//!
//! Always reads `editable_matches.csv` from disk, so hand corrections made
//! between matching and refinement take effect. Writes the correspondence
//! table as CSV and the full report (segments and coverage gaps) as JSON.

use crate::artifacts::{read_editable, write_report};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, RefinementOutput, RunState, StepOutcome};
use crate::refinement::{RefinementConfig, SegmentRefiner};

/// Per-frame refinement between consecutive matched keyframes.
pub struct RefineStep;

impl RefineStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RefineStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for RefineStep {
    fn name(&self) -> &str {
        "Refine"
    }

    fn description(&self) -> &str {
        "Match every original frame inside matched segments"
    }

    fn validate_input(&self, ctx: &Context, _state: &RunState) -> StepResult<()> {
        let editable = ctx.artifacts.editable_matches();
        if !editable.exists() {
            return Err(StepError::file_not_found(editable.display().to_string()));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let entries = read_editable(
            &ctx.artifacts.editable_matches(),
            ctx.original.as_ref(),
            ctx.recorded.as_ref(),
        )?;
        if entries.is_empty() {
            ctx.logger.warn("Correspondence list is empty; the report will have no rows");
        }

        let config = RefinementConfig::from(&ctx.settings.refinement);
        ctx.logger.info(&format!(
            "Look-around {} frames, {} workers",
            config.look_around,
            if config.workers == 0 {
                "auto".to_string()
            } else {
                config.workers.to_string()
            }
        ));
        let refiner = SegmentRefiner::new(config)?;

        let outcome = refiner.refine_with_progress(
            &entries,
            ctx.original.as_ref(),
            ctx.recorded.as_ref(),
            |done, total| ctx.step_progress(self.name(), done, total, "segments"),
        );

        if ctx.settings.logging.frame_scores {
            for row in &outcome.report.rows {
                ctx.logger.debug(&format!(
                    "{} -> {} score {:.6} ({})",
                    row.original.file_name(),
                    row.matched.map(|m| m.file_name()).unwrap_or_else(|| "None".to_string()),
                    row.score,
                    row.status
                ));
            }
        }
        for gap in &outcome.report.gaps {
            ctx.logger.detail(&format!(
                "No rows for {}..={}: {}",
                gap.start.file_name(),
                gap.end.file_name(),
                gap.reason
            ));
        }
        if !outcome.worker_failures.is_empty() {
            for failure in &outcome.worker_failures {
                ctx.logger.warn(&failure.to_string());
            }
            ctx.logger.show_tail("Refinement worker failures");
        }

        write_report(&ctx.artifacts, &outcome.report)?;

        let summary = outcome.report.summary();
        ctx.logger.info(&format!(
            "{} rows, {} matched, {} original frames uncovered",
            summary.rows, summary.matched, summary.uncovered_frames
        ));
        if let (Some(mean), Some(min)) = (summary.mean_score, summary.min_score) {
            ctx.logger
                .info(&format!("Mean score {:.4}, lowest {:.4}", mean, min));
        }

        state.refinement = Some(RefinementOutput {
            summary,
            segments: outcome.report.segments.len(),
            worker_failures: outcome.worker_failures.len(),
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, state: &RunState) -> StepResult<()> {
        if !state.has_refinement() {
            return Err(StepError::invalid_output("refinement results were not recorded"));
        }
        let csv = ctx.artifacts.compare_results();
        if !csv.exists() {
            return Err(StepError::invalid_output(format!(
                "missing report: {}",
                csv.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{read_report_json, write_editable};
    use crate::frames::MemoryFrameStore;
    use crate::models::{CorrespondenceEntry, FrameId, Sequence};
    use crate::test_support::{context_with, memory_context, solid_frame};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn requires_editable_list() {
        let dir = tempdir().unwrap();
        let ctx = memory_context(dir.path(), 3, 3);
        let err = RefineStep::new()
            .validate_input(&ctx, &RunState::new("refine"))
            .unwrap_err();
        assert!(matches!(err, StepError::FileNotFound { .. }));
    }

    #[test]
    fn refines_from_edited_list() {
        let dir = tempdir().unwrap();
        let original: Vec<_> = (0..20u8).map(|i| solid_frame(i * 10)).collect();
        let recorded = original.clone();
        let mut ctx = context_with(
            dir.path(),
            MemoryFrameStore::new(Sequence::Original, original),
            MemoryFrameStore::new(Sequence::Recorded, recorded),
        );
        ctx.settings.refinement.workers = 2;
        write_editable(
            &ctx.artifacts.editable_matches(),
            &[
                CorrespondenceEntry::new(FrameId::new(5), Some(FrameId::new(5))),
                CorrespondenceEntry::new(FrameId::new(15), Some(FrameId::new(15))),
            ],
        )
        .unwrap();

        let mut state = RunState::new("refine");
        let step = RefineStep::new();
        step.validate_input(&ctx, &state).unwrap();
        step.execute(&ctx, &mut state).unwrap();
        step.validate_output(&ctx, &state).unwrap();

        let output = state.refinement.unwrap();
        assert_eq!(output.summary.rows, 11);
        assert_eq!(output.summary.matched, 11);
        assert_eq!(output.segments, 1);
        assert_eq!(output.worker_failures, 0);

        let report = read_report_json(&ctx.artifacts.report_json()).unwrap();
        assert_eq!(report.row(FrameId::new(9)).unwrap().matched, Some(FrameId::new(9)));

        let csv = fs::read_to_string(ctx.artifacts.compare_results()).unwrap();
        assert!(csv.contains("frame_000010.png,frame_000010.png,1.0,0.0"));
    }

    #[test]
    fn malformed_list_fails_execution() {
        let dir = tempdir().unwrap();
        let ctx = memory_context(dir.path(), 3, 3);
        fs::create_dir_all(ctx.output_dir()).unwrap();
        fs::write(
            ctx.artifacts.editable_matches(),
            "Original Frame,Matched Frame\nframe_1.png,frame_000001.png\n",
        )
        .unwrap();

        let err = RefineStep::new()
            .execute(&ctx, &mut RunState::new("refine"))
            .unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
