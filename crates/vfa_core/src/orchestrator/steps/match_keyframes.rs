//! Match step - pairs each original keyframe with a recorded keyframe.
//!
//! Keyframes come from the Detect step of the same run, or from
//! `keyframes.json` when matching is re-run on its own. Writes the
//! full match audit, the human-readable best-match table and the
//! editable correspondence list that refinement consumes.

use crate::artifacts::{write_best_matches, write_editable, write_keyframe_matches, KeyframeIndex};
use crate::matching::{KeyframeMatcher, MatchingConfig};
use crate::models::{CorrespondenceEntry, KeyframeMatch};
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, MatchingOutput, RunState, StepOutcome};

/// Keyframe matching within a bounded index window.
pub struct MatchStep;

impl MatchStep {
    pub fn new() -> Self {
        Self
    }

    fn keyframe_index(&self, ctx: &Context, state: &RunState) -> StepResult<KeyframeIndex> {
        let index = match state.detection {
            Some(ref detection) => KeyframeIndex::new(
                detection.original_keyframes.clone(),
                detection.recorded_keyframes.clone(),
            ),
            None => {
                ctx.logger.info(&format!(
                    "Loading keyframe index from {}",
                    ctx.artifacts.keyframes().display()
                ));
                KeyframeIndex::load(&ctx.artifacts.keyframes())?
            }
        };
        index.validate_against(ctx.original.as_ref(), ctx.recorded.as_ref())?;
        Ok(index)
    }

    fn log_matches(&self, ctx: &Context, matches: &[KeyframeMatch]) {
        for m in matches {
            match m.recorded {
                Some(recorded) => ctx.logger.detail(&format!(
                    "{} -> {} (score {:.4}, offset {})",
                    m.original.file_name(),
                    recorded.file_name(),
                    m.score,
                    m.frame_offset_label()
                )),
                None => ctx.logger.detail(&format!(
                    "{} -> no match (best score {:.4})",
                    m.original.file_name(),
                    m.score
                )),
            }
            if m.has_tie() {
                ctx.logger.warn(&format!(
                    "{} tied across {} recorded keyframes",
                    m.original.file_name(),
                    m.ties.len()
                ));
            }
        }
    }
}

impl Default for MatchStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for MatchStep {
    fn name(&self) -> &str {
        "Match"
    }

    fn description(&self) -> &str {
        "Pair original keyframes with recorded keyframes"
    }

    fn validate_input(&self, ctx: &Context, state: &RunState) -> StepResult<()> {
        if !state.has_detection() && !ctx.artifacts.keyframes().exists() {
            return Err(StepError::file_not_found(
                ctx.artifacts.keyframes().display().to_string(),
            ));
        }
        let accept = ctx.settings.matching.accept_threshold;
        if accept.is_nan() {
            return Err(StepError::invalid_input("accept threshold is not a number"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome> {
        let index = self.keyframe_index(ctx, state)?;
        let config = MatchingConfig::from(&ctx.settings.matching);
        ctx.logger.info(&format!(
            "Matching {} original against {} recorded keyframes (radius {}, accept {}, tie-break {})",
            index.original.len(),
            index.recorded.len(),
            config.window_radius,
            config.accept_threshold,
            config.tie_break
        ));

        let matcher = KeyframeMatcher::new(config);
        let matches = matcher.match_keyframes_with_progress(
            ctx.original.as_ref(),
            &index.original,
            ctx.recorded.as_ref(),
            &index.recorded,
            |done, total| ctx.step_progress(self.name(), done, total, "keyframes"),
        );
        self.log_matches(ctx, &matches);

        let entries: Vec<CorrespondenceEntry> = matches.iter().map(KeyframeMatch::to_entry).collect();
        write_keyframe_matches(&ctx.artifacts.keyframe_matches(), &matches)?;
        write_best_matches(&ctx.artifacts.best_matches(), &matches)?;
        write_editable(&ctx.artifacts.editable_matches(), &entries)?;

        let accepted = matches.iter().filter(|m| m.is_accepted()).count();
        ctx.logger.info(&format!(
            "{}/{} keyframes matched; edit {} to correct pairs before refinement",
            accepted,
            matches.len(),
            ctx.artifacts.editable_matches().display()
        ));

        state.matching = Some(MatchingOutput { matches, accepted });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, ctx: &Context, state: &RunState) -> StepResult<()> {
        if !state.has_matching() {
            return Err(StepError::invalid_output("matching results were not recorded"));
        }
        for path in [ctx.artifacts.keyframe_matches(), ctx.artifacts.editable_matches()] {
            if !path.exists() {
                return Err(StepError::invalid_output(format!(
                    "missing artifact: {}",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::read_keyframe_matches;
    use crate::frames::MemoryFrameStore;
    use crate::models::{FrameId, Sequence};
    use crate::test_support::{context_with, memory_context, solid_frame};
    use std::fs;
    use tempfile::tempdir;

    fn scenes(lengths: &[(u8, usize)]) -> Vec<image::DynamicImage> {
        lengths
            .iter()
            .flat_map(|&(level, n)| vec![solid_frame(level); n])
            .collect()
    }

    #[test]
    fn requires_detection_or_index_file() {
        let dir = tempdir().unwrap();
        let ctx = memory_context(dir.path(), 3, 3);
        let err = MatchStep::new()
            .validate_input(&ctx, &RunState::new("match"))
            .unwrap_err();
        assert!(matches!(err, StepError::FileNotFound { .. }));
    }

    #[test]
    fn matches_from_index_on_disk() {
        let dir = tempdir().unwrap();
        let ctx = context_with(
            dir.path(),
            MemoryFrameStore::new(Sequence::Original, scenes(&[(20, 10), (200, 10), (100, 10)])),
            MemoryFrameStore::new(Sequence::Recorded, scenes(&[(20, 12), (200, 10), (100, 10)])),
        );
        KeyframeIndex::new(
            vec![FrameId::new(10), FrameId::new(20)],
            vec![FrameId::new(12), FrameId::new(22)],
        )
        .save(&ctx.artifacts.keyframes())
        .unwrap();

        let mut state = RunState::new("match");
        let step = MatchStep::new();
        step.validate_input(&ctx, &state).unwrap();
        step.execute(&ctx, &mut state).unwrap();
        step.validate_output(&ctx, &state).unwrap();

        let output = state.matching.unwrap();
        assert_eq!(output.accepted, 2);
        assert_eq!(output.matches[0].recorded, Some(FrameId::new(12)));
        assert_eq!(output.matches[1].frame_offset, Some(2));

        let audit = read_keyframe_matches(&ctx.artifacts.keyframe_matches()).unwrap();
        assert_eq!(audit, output.matches);

        let editable = fs::read_to_string(ctx.artifacts.editable_matches()).unwrap();
        assert!(editable.contains("frame_000010.png,frame_000012.png"));
        assert!(ctx.artifacts.best_matches().exists());
    }

    #[test]
    fn stale_index_is_rejected() {
        let dir = tempdir().unwrap();
        let ctx = memory_context(dir.path(), 5, 5);
        KeyframeIndex::new(vec![FrameId::new(9)], Vec::new())
            .save(&ctx.artifacts.keyframes())
            .unwrap();

        let err = MatchStep::new()
            .execute(&ctx, &mut RunState::new("match"))
            .unwrap_err();
        assert!(matches!(err, StepError::Align(_)));
    }
}
