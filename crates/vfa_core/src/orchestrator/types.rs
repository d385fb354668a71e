//! Core types for the orchestrator pipeline.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::artifacts::ArtifactPaths;
use crate::config::Settings;
use crate::error::AlignResult;
use crate::frames::{DirFrameStore, FrameStore};
use crate::logging::RunLogger;
use crate::models::{FrameId, KeyframeMatch, ReportSummary, Sequence};

/// Progress callback type for reporting pipeline progress.
///
/// Arguments: (step_name, percent_complete, message)
pub type ProgressCallback = Box<dyn Fn(&str, u32, &str) + Send + Sync>;

/// Read-only context passed to pipeline steps.
///
/// Holds the two frame stores, settings and shared resources. Mutable
/// results go in `RunState`.
pub struct Context {
    /// Application settings.
    pub settings: Settings,
    /// Run name/identifier.
    pub run_name: String,
    /// Original frame sequence.
    pub original: Arc<dyn FrameStore>,
    /// Recorded frame sequence.
    pub recorded: Arc<dyn FrameStore>,
    /// Where artifacts are read and written.
    pub artifacts: ArtifactPaths,
    /// Per-run logger.
    pub logger: Arc<RunLogger>,
    progress_callback: Option<ProgressCallback>,
}

impl Context {
    /// Create a new context for a run.
    pub fn new(
        settings: Settings,
        run_name: impl Into<String>,
        original: Arc<dyn FrameStore>,
        recorded: Arc<dyn FrameStore>,
        artifacts: ArtifactPaths,
        logger: Arc<RunLogger>,
    ) -> Self {
        Self {
            settings,
            run_name: run_name.into(),
            original,
            recorded,
            artifacts,
            logger,
            progress_callback: None,
        }
    }

    /// Create a context whose frame directories and output folder come
    /// from `settings.paths`.
    pub fn from_settings(
        settings: Settings,
        run_name: impl Into<String>,
        logger: Arc<RunLogger>,
    ) -> AlignResult<Self> {
        let original = DirFrameStore::open(&settings.paths.original_frames, Sequence::Original)?;
        let recorded = DirFrameStore::open(&settings.paths.recorded_frames, Sequence::Recorded)?;
        let artifacts = ArtifactPaths::new(&settings.paths.output_folder);
        Ok(Self::new(
            settings,
            run_name,
            Arc::new(original),
            Arc::new(recorded),
            artifacts,
            logger,
        ))
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Report progress to callback (if set).
    pub fn report_progress(&self, step_name: &str, percent: u32, message: &str) {
        if let Some(ref callback) = self.progress_callback {
            callback(step_name, percent, message);
        }
    }

    /// Report `done` of `total` units inside a step to the logger and callback.
    pub fn step_progress(&self, step_name: &str, done: usize, total: usize, message: &str) {
        let percent = if total == 0 {
            100
        } else {
            ((done * 100) / total).min(100) as u32
        };
        self.logger.progress(percent);
        self.report_progress(step_name, percent, message);
    }

    /// Output folder for artifacts.
    pub fn output_dir(&self) -> &Path {
        self.artifacts.dir()
    }
}

/// Mutable run state that accumulates results from pipeline steps.
///
/// Each step's output is stored in its own section and written once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunState {
    /// Unique run identifier.
    pub run_id: String,
    /// When the run started.
    pub started_at: Option<String>,
    /// Detection results (from Detect step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<DetectionOutput>,
    /// Matching results (from Match step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matching: Option<MatchingOutput>,
    /// Refinement results (from Refine step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refinement: Option<RefinementOutput>,
}

impl RunState {
    /// Create a new run state with the given ID.
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    pub fn has_detection(&self) -> bool {
        self.detection.is_some()
    }

    pub fn has_matching(&self) -> bool {
        self.matching.is_some()
    }

    pub fn has_refinement(&self) -> bool {
        self.refinement.is_some()
    }
}

/// Output from the Detect step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionOutput {
    pub original_keyframes: Vec<FrameId>,
    pub recorded_keyframes: Vec<FrameId>,
}

/// Output from the Match step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingOutput {
    /// One match per original keyframe.
    pub matches: Vec<KeyframeMatch>,
    /// Matches that were accepted.
    pub accepted: usize,
}

/// Output from the Refine step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementOutput {
    /// Report statistics.
    pub summary: ReportSummary,
    /// Segments refined.
    pub segments: usize,
    /// Tasks that failed on the worker pool.
    pub worker_failures: usize,
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (preconditions not met, but not an error).
    Skipped(String),
}
