//! Pipeline orchestrator for coordinating alignment runs.
//!
//! This module provides the infrastructure for running multi-step
//! alignment pipelines. Each run consists of a sequence of steps
//! that validate, execute, and record their results.
//!
//! # Architecture
//!
//! ```text
//! Pipeline
//!     ├── Step: Detect
//!     ├── Step: Match
//!     └── Step: Refine
//! ```
//!
//! # Example
//!
//! ```ignore
//! use vfa_core::orchestrator::{create_standard_pipeline, Context, RunState};
//!
//! let ctx = Context::from_settings(settings, "my_run", logger)?;
//! let mut state = RunState::new("run-123");
//!
//! let result = create_standard_pipeline().run(&ctx, &mut state)?;
//! println!("Completed: {:?}", result.steps_completed);
//! ```

mod errors;
mod pipeline;
mod step;
pub mod steps;
mod types;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{CancelHandle, Pipeline, PipelineRunResult};
pub use step::PipelineStep;
pub use steps::{DetectStep, MatchStep, RefineStep};
pub use types::{
    Context, DetectionOutput, MatchingOutput, ProgressCallback, RefinementOutput, RunState,
    StepOutcome,
};

/// Create a standard pipeline with all steps in the correct order.
///
/// 1. Detect - scene-change keyframes in both sequences
/// 2. Match - pair keyframes and write the editable list
/// 3. Refine - per-frame correspondence inside matched segments
pub fn create_standard_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(DetectStep::new())
        .with_step(MatchStep::new())
        .with_step(RefineStep::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_pipeline_order() {
        let pipeline = create_standard_pipeline();
        assert_eq!(pipeline.step_names(), vec!["Detect", "Match", "Refine"]);
    }
}
