//! The unit of work the pipeline runs.

use super::errors::StepResult;
use super::types::{Context, RunState, StepOutcome};

/// One stage of an alignment run.
///
/// The runner calls `validate_input`, `execute` and, on success,
/// `validate_output`. Steps hold no per-run data; everything a later step
/// needs goes into [`RunState`] or onto disk.
pub trait PipelineStep: Send + Sync {
    /// Short name used in log phases and errors.
    fn name(&self) -> &str;

    /// Fail early if the step cannot run.
    ///
    /// `state` holds whatever earlier steps of this run produced; a step
    /// that can also start from artifacts on disk checks for those here.
    fn validate_input(&self, ctx: &Context, state: &RunState) -> StepResult<()>;

    /// Do the work and record results in `state`.
    fn execute(&self, ctx: &Context, state: &mut RunState) -> StepResult<StepOutcome>;

    /// Check that `execute` left what later steps rely on.
    fn validate_output(&self, ctx: &Context, state: &RunState) -> StepResult<()>;

    /// One-line summary for help text.
    fn description(&self) -> &str {
        self.name()
    }
}
