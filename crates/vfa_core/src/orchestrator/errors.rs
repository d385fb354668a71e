//! Orchestrator errors.
//!
//! A failure reads outermost first: run name, step name, then the
//! component error that caused it.

use thiserror::Error;

use crate::error::{AlignError, TaskError};

/// Top-level pipeline error with run context.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A step's validation or execution failed.
    #[error("Run '{run_name}' failed at step '{step_name}': {source}")]
    StepFailed {
        run_name: String,
        step_name: String,
        #[source]
        source: StepError,
    },

    /// Stopped through a [`CancelHandle`](super::CancelHandle).
    #[error("Run '{run_name}' was cancelled")]
    Cancelled { run_name: String },

    /// Failed to set up the run (open frame stores, create directories).
    #[error("Run '{run_name}' setup failed: {source}")]
    SetupFailed {
        run_name: String,
        #[source]
        source: AlignError,
    },
}

impl PipelineError {
    pub fn step_failed(
        run_name: impl Into<String>,
        step_name: impl Into<String>,
        source: StepError,
    ) -> Self {
        Self::StepFailed {
            run_name: run_name.into(),
            step_name: step_name.into(),
            source,
        }
    }

    pub fn setup_failed(run_name: impl Into<String>, source: AlignError) -> Self {
        Self::SetupFailed {
            run_name: run_name.into(),
            source,
        }
    }

    pub fn cancelled(run_name: impl Into<String>) -> Self {
        Self::Cancelled {
            run_name: run_name.into(),
        }
    }
}

/// Why a single step could not complete.
#[derive(Error, Debug)]
pub enum StepError {
    #[error("Input validation failed: {0}")]
    InvalidInput(String),

    #[error("Output validation failed: {0}")]
    InvalidOutput(String),

    /// An artifact from an earlier step is missing.
    #[error("Required file not found: {path}")]
    FileNotFound { path: String },

    /// Reading or writing alignment data failed.
    #[error(transparent)]
    Align(#[from] AlignError),

    /// The worker pool failed.
    #[error(transparent)]
    Task(#[from] TaskError),
}

impl StepError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }
}

pub type StepResult<T> = Result<T, StepError>;

pub type PipelineResult<T> = Result<T, PipelineError>;
