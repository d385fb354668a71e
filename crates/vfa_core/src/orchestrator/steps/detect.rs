//! Detect step - finds scene-change keyframes in both sequences.
//!
//! Each sequence is scanned independently; the combined keyframe index is
//! written to `keyframes.json` so matching can be re-run without
//! re-scanning.

use crate::artifacts::KeyframeIndex;
use crate::detection::{DetectionConfig, KeyframeDetector};
use crate::frames::FrameStore;
use crate::models::FrameId;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, DetectionOutput, RunState, StepOutcome};

/// Keyframe detection over the original and recorded sequences.
pub struct DetectStep;

impl DetectStep {
    pub fn new() -> Self {
        Self
    }

    fn scan(&self, ctx: &Context, detector: &KeyframeDetector, store: &dyn FrameStore) -> Vec<FrameId> {
        let label = store.sequence().to_string();
        ctx.logger.section(&format!("Scanning {} frames", label));
        ctx.logger.reset_progress();

        let keyframes = detector.detect_with_progress(store, |done, total| {
            ctx.step_progress(self.name(), done, total, &label);
        });

        ctx.logger.info(&format!(
            "{} keyframes in {} frames",
            keyframes.len(),
            store.sequence_len()
        ));
        for id in &keyframes {
            ctx.logger.detail(&format!("{} keyframe {}", label, id.file_name()));
        }
        keyframes
    }
}

impl Default for DetectStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for DetectStep {
    fn name(&self) -> &str {
        "Detect"
    }

    fn description(&self) -> &str {
        "Find scene-change keyframes in both sequences"
    }

    fn validate_input(&self, ctx: &Context, _state: &RunState) -> StepResult<()> {
        let threshold = ctx.settings.detection.threshold;
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(StepError::invalid_input(format!(
                "detection threshold {} is outside [-1, 1]",
                threshold
            )));
        }
        if ctx.original.is_empty() {
            ctx.logger.warn("Original sequence has no frames");
        }
        if ctx.recorded.is_empty() {
            ctx.logger.warn("Recorded sequence has no frames");
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let detector = KeyframeDetector::new(DetectionConfig::from(&ctx.settings.detection));
        ctx.logger
            .info(&format!("Similarity threshold: {}", detector.config().threshold));

        let original_keyframes = self.scan(ctx, &detector, ctx.original.as_ref());
        let recorded_keyframes = self.scan(ctx, &detector, ctx.recorded.as_ref());

        let index = KeyframeIndex::new(original_keyframes, recorded_keyframes);
        index.save(&ctx.artifacts.keyframes())?;
        ctx.logger.info(&format!(
            "Saved keyframe index to {}",
            ctx.artifacts.keyframes().display()
        ));

        state.detection = Some(DetectionOutput {
            original_keyframes: index.original,
            recorded_keyframes: index.recorded,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, state: &RunState) -> StepResult<()> {
        if !state.has_detection() {
            return Err(StepError::invalid_output("detection results were not recorded"));
        }
        if !ctx.artifacts.keyframes().exists() {
            return Err(StepError::invalid_output(format!(
                "keyframe index missing: {}",
                ctx.artifacts.keyframes().display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::MemoryFrameStore;
    use crate::models::Sequence;
    use crate::test_support::{context_with, solid_frame};
    use tempfile::tempdir;

    fn two_scenes(first: usize, second: usize) -> Vec<image::DynamicImage> {
        let mut frames = vec![solid_frame(20); first];
        frames.extend(vec![solid_frame(200); second]);
        frames
    }

    #[test]
    fn detects_both_sequences_and_saves_index() {
        let dir = tempdir().unwrap();
        let ctx = context_with(
            dir.path(),
            MemoryFrameStore::new(Sequence::Original, two_scenes(10, 10)),
            MemoryFrameStore::new(Sequence::Recorded, two_scenes(13, 8)),
        );
        let mut state = RunState::new("detect");
        let step = DetectStep::new();

        step.validate_input(&ctx, &state).unwrap();
        assert_eq!(step.execute(&ctx, &mut state).unwrap(), StepOutcome::Success);
        step.validate_output(&ctx, &state).unwrap();

        let detection = state.detection.unwrap();
        assert_eq!(detection.original_keyframes, vec![FrameId::new(10)]);
        assert_eq!(detection.recorded_keyframes, vec![FrameId::new(13)]);

        let saved = KeyframeIndex::load(&ctx.artifacts.keyframes()).unwrap();
        assert_eq!(saved.original, vec![FrameId::new(10)]);
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let dir = tempdir().unwrap();
        let mut ctx = crate::test_support::memory_context(dir.path(), 2, 2);
        ctx.settings.detection.threshold = 1.5;

        let err = DetectStep::new()
            .validate_input(&ctx, &RunState::new("detect"))
            .unwrap_err();
        assert!(matches!(err, StepError::InvalidInput(_)));
    }

    #[test]
    fn output_validation_requires_state() {
        let dir = tempdir().unwrap();
        let ctx = crate::test_support::memory_context(dir.path(), 2, 2);
        assert!(DetectStep::new()
            .validate_output(&ctx, &RunState::new("detect"))
            .is_err());
    }
}
