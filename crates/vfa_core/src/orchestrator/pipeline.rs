//! Sequential step runner for one alignment run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::errors::{PipelineError, PipelineResult};
use super::step::PipelineStep;
use super::types::{Context, RunState, StepOutcome};

/// Ordered list of steps sharing one [`Context`] and [`RunState`].
///
/// A step whose input or output check fails ends the run; later steps
/// never start.
pub struct Pipeline {
    steps: Vec<Box<dyn PipelineStep>>,
    cancelled: Arc<AtomicBool>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Append a step.
    pub fn add_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Handle that stops the run before the next step starts. A step
    /// already executing runs to completion.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancelled),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Run every step against `ctx`, recording results in `state`.
    ///
    /// Per step: cancellation check, `validate_input`, `execute`, then
    /// `validate_output` unless the step reported itself skipped.
    pub fn run(&self, ctx: &Context, state: &mut RunState) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult {
            steps_completed: Vec::new(),
            steps_skipped: Vec::new(),
        };

        let total_steps = self.steps.len();

        for (i, step) in self.steps.iter().enumerate() {
            if self.is_cancelled() {
                ctx.logger
                    .warn(&format!("Pipeline cancelled before step '{}'", step.name()));
                return Err(PipelineError::cancelled(&ctx.run_name));
            }

            let step_name = step.name();
            ctx.logger.phase(step_name);
            ctx.logger.info(step.description());
            ctx.logger.reset_progress();

            let percent = ((i as f64 / total_steps as f64) * 100.0) as u32;
            ctx.report_progress(step_name, percent, &format!("Starting {}", step_name));

            ctx.logger.debug(&format!("Validating input for '{}'", step_name));
            if let Err(e) = step.validate_input(ctx, state) {
                ctx.logger.error(&format!("Input validation failed: {}", e));
                return Err(PipelineError::step_failed(&ctx.run_name, step_name, e));
            }

            ctx.logger.debug(&format!("Executing '{}'", step_name));
            let outcome = step.execute(ctx, state).map_err(|e| {
                ctx.logger.error(&format!("Execution failed: {}", e));
                ctx.logger.show_tail(step_name);
                PipelineError::step_failed(&ctx.run_name, step_name, e)
            })?;

            match outcome {
                StepOutcome::Success => {
                    ctx.logger
                        .debug(&format!("Validating output for '{}'", step_name));
                    if let Err(e) = step.validate_output(ctx, state) {
                        ctx.logger.error(&format!("Output validation failed: {}", e));
                        return Err(PipelineError::step_failed(&ctx.run_name, step_name, e));
                    }

                    ctx.logger.success(&format!("{} completed", step_name));
                    result.steps_completed.push(step_name.to_string());
                }
                StepOutcome::Skipped(reason) => {
                    ctx.logger.info(&format!("{} skipped: {}", step_name, reason));
                    result.steps_skipped.push(step_name.to_string());
                }
            }
        }

        ctx.report_progress("Complete", 100, "Pipeline finished");
        ctx.logger.success("Pipeline completed successfully");
        ctx.logger.flush();

        Ok(result)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Step names in run order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared stop flag for a [`Pipeline`].
#[derive(Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Request a stop at the next step boundary.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Which steps ran to completion and which were skipped.
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    pub steps_completed: Vec<String>,
    pub steps_skipped: Vec<String>,
}

impl PipelineRunResult {
    /// No step was skipped.
    pub fn all_completed(&self) -> bool {
        self.steps_skipped.is_empty()
    }

    pub fn total_steps(&self) -> usize {
        self.steps_completed.len() + self.steps_skipped.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::errors::{StepError, StepResult};
    use crate::test_support::memory_context;
    use parking_lot::Mutex;
    use tempfile::tempdir;

    /// Records its name into a shared log when executed.
    struct RecordingStep {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        fail_validation: bool,
        cancel_after: Option<CancelHandle>,
    }

    impl RecordingStep {
        fn new(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> Self {
            Self {
                name,
                log: Arc::clone(log),
                fail_validation: false,
                cancel_after: None,
            }
        }
    }

    impl PipelineStep for RecordingStep {
        fn name(&self) -> &str {
            self.name
        }

        fn validate_input(&self, _ctx: &Context, _state: &RunState) -> StepResult<()> {
            if self.fail_validation {
                return Err(StepError::invalid_input("missing input"));
            }
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _state: &mut RunState) -> StepResult<StepOutcome> {
            self.log.lock().push(self.name);
            if let Some(ref handle) = self.cancel_after {
                handle.cancel();
            }
            Ok(StepOutcome::Success)
        }

        fn validate_output(&self, _ctx: &Context, _state: &RunState) -> StepResult<()> {
            Ok(())
        }
    }

    #[test]
    fn pipeline_builds_correctly() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new()
            .with_step(RecordingStep::new("Step1", &log))
            .with_step(RecordingStep::new("Step2", &log));

        assert_eq!(pipeline.step_count(), 2);
        assert_eq!(pipeline.step_names(), vec!["Step1", "Step2"]);
    }

    #[test]
    fn steps_run_in_order() {
        let dir = tempdir().unwrap();
        let ctx = memory_context(dir.path(), 3, 3);
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new()
            .with_step(RecordingStep::new("Detect", &log))
            .with_step(RecordingStep::new("Match", &log))
            .with_step(RecordingStep::new("Refine", &log));

        let result = pipeline.run(&ctx, &mut RunState::new("t")).unwrap();

        assert_eq!(*log.lock(), vec!["Detect", "Match", "Refine"]);
        assert!(result.all_completed());
        assert_eq!(result.total_steps(), 3);
    }

    #[test]
    fn failed_validation_stops_pipeline() {
        crate::logging::init_test_tracing();
        let dir = tempdir().unwrap();
        let ctx = memory_context(dir.path(), 3, 3);
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut broken = RecordingStep::new("Match", &log);
        broken.fail_validation = true;
        let pipeline = Pipeline::new()
            .with_step(RecordingStep::new("Detect", &log))
            .with_step(broken)
            .with_step(RecordingStep::new("Refine", &log));

        let err = pipeline.run(&ctx, &mut RunState::new("t")).unwrap_err();

        assert!(matches!(err, PipelineError::StepFailed { ref step_name, .. } if step_name == "Match"));
        assert_eq!(*log.lock(), vec!["Detect"]);
    }

    #[test]
    fn cancellation_stops_at_step_boundary() {
        let dir = tempdir().unwrap();
        let ctx = memory_context(dir.path(), 3, 3);
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        let mut first = RecordingStep::new("Detect", &log);
        first.cancel_after = Some(pipeline.cancel_handle());
        pipeline.add_step(first);
        pipeline.add_step(RecordingStep::new("Match", &log));

        let err = pipeline.run(&ctx, &mut RunState::new("t")).unwrap_err();

        assert!(matches!(err, PipelineError::Cancelled { .. }));
        assert_eq!(*log.lock(), vec!["Detect"]);
    }

    #[test]
    fn cancel_handle_works() {
        let pipeline = Pipeline::new();
        let handle = pipeline.cancel_handle();

        assert!(!pipeline.is_cancelled());
        handle.cancel();
        assert!(pipeline.is_cancelled());
        assert!(handle.is_cancelled());
    }
}
