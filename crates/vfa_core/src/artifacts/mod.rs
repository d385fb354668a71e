//! On-disk artifacts exchanged between pipeline steps.
//!
//! | File                    | Written by | Read by |
//! |-------------------------|------------|---------|
//! | `keyframes.json`        | detect     | match   |
//! | `keyframe_matches.json` | match      | (audit) |
//! | `best_matches.csv`      | match      | (audit) |
//! | `editable_matches.csv`  | match      | refine  |
//! | `compare_results.csv`   | refine     | (reporting tools) |
//! | `alignment_report.json` | refine     | (reporting tools) |
//!
//! The editable list is plain CSV so it can be corrected by hand between
//! matching and refinement; reading it validates every row.

mod editable;
mod keyframe_index;
mod keyframe_matches;
mod report;

use std::fs;
use std::path::{Path, PathBuf};

pub use editable::{parse_editable, read_editable, render_editable, write_editable, EDITABLE_HEADER};
pub use keyframe_index::KeyframeIndex;
pub use keyframe_matches::{
    read_keyframe_matches, render_best_matches, write_best_matches, write_keyframe_matches,
    BEST_MATCHES_HEADER,
};
pub use report::{read_report_json, render_report_csv, write_report, ReportDocument, REPORT_HEADER};

use crate::error::{AlignError, AlignResult};

pub const KEYFRAMES_FILE: &str = "keyframes.json";
pub const KEYFRAME_MATCHES_FILE: &str = "keyframe_matches.json";
pub const BEST_MATCHES_FILE: &str = "best_matches.csv";
pub const EDITABLE_MATCHES_FILE: &str = "editable_matches.csv";
pub const COMPARE_RESULTS_FILE: &str = "compare_results.csv";
pub const REPORT_JSON_FILE: &str = "alignment_report.json";

/// Locations of every artifact inside one output folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn keyframes(&self) -> PathBuf {
        self.dir.join(KEYFRAMES_FILE)
    }

    pub fn keyframe_matches(&self) -> PathBuf {
        self.dir.join(KEYFRAME_MATCHES_FILE)
    }

    pub fn best_matches(&self) -> PathBuf {
        self.dir.join(BEST_MATCHES_FILE)
    }

    pub fn editable_matches(&self) -> PathBuf {
        self.dir.join(EDITABLE_MATCHES_FILE)
    }

    pub fn compare_results(&self) -> PathBuf {
        self.dir.join(COMPARE_RESULTS_FILE)
    }

    pub fn report_json(&self) -> PathBuf {
        self.dir.join(REPORT_JSON_FILE)
    }
}

/// Write a text file, creating parent directories.
pub(crate) fn write_text(path: &Path, content: &str) -> AlignResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| AlignError::io(parent, e))?;
        }
    }
    fs::write(path, content).map_err(|e| AlignError::io(path, e))?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

/// Read a text file; a missing file is `MissingInput`.
pub(crate) fn read_text(path: &Path) -> AlignResult<String> {
    if !path.is_file() {
        return Err(AlignError::MissingInput(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|e| AlignError::io(path, e))
}

/// Display name of an artifact for error messages.
pub(crate) fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn paths_live_in_output_folder() {
        let paths = ArtifactPaths::new("out");
        assert_eq!(paths.keyframes(), Path::new("out/keyframes.json"));
        assert_eq!(paths.editable_matches(), Path::new("out/editable_matches.csv"));
        assert_eq!(paths.compare_results(), Path::new("out/compare_results.csv"));
    }

    #[test]
    fn write_text_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("a.txt");
        write_text(&path, "hello").unwrap();
        assert_eq!(read_text(&path).unwrap(), "hello");
    }

    #[test]
    fn missing_file_is_missing_input() {
        let dir = tempdir().unwrap();
        let err = read_text(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, AlignError::MissingInput(_)));
    }
}
