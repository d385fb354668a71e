//! Error types shared by the alignment components.
//!
//! Per-item failures (a frame that cannot be decoded, a keyframe with no
//! acceptable candidate) are absorbed into the data model as sentinel
//! values. Structural failures surface as [`AlignError`] and abort a run
//! before any report is written.

use std::io;
use std::path::PathBuf;

use crate::models::FrameId;

/// Errors raised while loading a single frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The raster could not be read or decoded.
    #[error("Failed to decode frame '{path}': {message}")]
    Decode { path: String, message: String },

    /// The requested frame is outside the sequence.
    #[error("Frame {0} is outside the sequence")]
    OutOfRange(FrameId),
}

impl FrameError {
    /// Create a decode error.
    pub fn decode(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Structural errors that stop an alignment run.
#[derive(Debug, thiserror::Error)]
pub enum AlignError {
    /// Input does not follow the expected conventions.
    #[error("Malformed input in {source_name}: {message}")]
    MalformedInput {
        source_name: String,
        message: String,
    },

    /// A required file or directory does not exist.
    #[error("Required input not found: {0}")]
    MissingInput(PathBuf),

    /// File I/O error.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("Invalid JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl AlignError {
    /// Create a malformed input error.
    pub fn malformed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error with the offending path.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a JSON error with the offending path.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// Whether this error comes from bad input rather than the environment.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedInput { .. })
    }
}

/// Failures of the refinement worker pool.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// A task panicked; only its frame is affected.
    #[error("Worker failed on original frame {frame}: {message}")]
    WorkerPanic { frame: FrameId, message: String },

    /// The dedicated thread pool could not be started.
    #[error("Failed to start worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
}

impl TaskError {
    /// Frame affected by this failure, if it concerns a single task.
    pub fn frame(&self) -> Option<FrameId> {
        match self {
            Self::WorkerPanic { frame, .. } => Some(*frame),
            Self::PoolBuild(_) => None,
        }
    }
}

/// Result type for alignment operations.
pub type AlignResult<T> = Result<T, AlignError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_error_names_source() {
        let err = AlignError::malformed("editable_matches.csv", "row 3 has 4 columns");
        let msg = err.to_string();
        assert!(msg.contains("editable_matches.csv"));
        assert!(msg.contains("row 3"));
        assert!(err.is_malformed());
    }

    #[test]
    fn decode_error_displays_path() {
        let err = FrameError::decode("frames/frame_000001.png", "truncated");
        assert!(err.to_string().contains("frame_000001.png"));
    }

    #[test]
    fn worker_panic_names_frame() {
        let err = TaskError::WorkerPanic {
            frame: FrameId::new(12),
            message: "boom".to_string(),
        };
        assert_eq!(err.frame(), Some(FrameId::new(12)));
        assert!(err.to_string().contains("#12"));
    }
}
