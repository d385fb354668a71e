//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use serde::{Deserialize, Serialize};

use crate::models::TieBreakMode;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Keyframe detection.
    #[serde(default)]
    pub detection: DetectionSettings,

    /// Keyframe matching.
    #[serde(default)]
    pub matching: MatchingSettings,

    /// Per-frame refinement.
    #[serde(default)]
    pub refinement: RefinementSettings,
}

/// Path configuration for frame directories, artifacts, and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Directory of original frames.
    #[serde(default = "default_original_frames")]
    pub original_frames: String,

    /// Directory of recorded frames.
    #[serde(default = "default_recorded_frames")]
    pub recorded_frames: String,

    /// Folder for keyframe index, match list, and report.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Folder for run log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_original_frames() -> String {
    "frames/original_frames".to_string()
}

fn default_recorded_frames() -> String {
    "frames/recorded_frames".to_string()
}

fn default_output_folder() -> String {
    "output".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            original_frames: default_original_frames(),
            recorded_frames: default_recorded_frames(),
            output_folder: default_output_folder(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format (progress filtered to steps).
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of recent lines kept for error diagnosis.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Log every frame score at debug level.
    #[serde(default)]
    pub frame_scores: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

fn default_progress_step() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            progress_step: default_progress_step(),
            frame_scores: false,
        }
    }
}

/// Keyframe detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSettings {
    /// A frame whose similarity to its predecessor falls below this is a keyframe.
    #[serde(default = "default_detection_threshold")]
    pub threshold: f64,
}

fn default_detection_threshold() -> f64 {
    0.6
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            threshold: default_detection_threshold(),
        }
    }
}

/// Keyframe matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingSettings {
    /// Maximum index distance between an original keyframe and a candidate.
    #[serde(default = "default_window_radius")]
    pub window_radius: usize,

    /// Minimum best score for a match to be accepted.
    #[serde(default = "default_accept_threshold")]
    pub accept_threshold: f64,

    /// Canonical choice among tied candidates.
    #[serde(default)]
    pub tie_break: TieBreakMode,
}

fn default_window_radius() -> usize {
    250
}

fn default_accept_threshold() -> f64 {
    0.9
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            window_radius: default_window_radius(),
            accept_threshold: default_accept_threshold(),
            tie_break: TieBreakMode::default(),
        }
    }
}

/// Per-frame refinement configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinementSettings {
    /// Recorded frames considered on each side of the implied index.
    #[serde(default = "default_look_around")]
    pub look_around: usize,

    /// Worker threads (0 = one per available CPU).
    #[serde(default)]
    pub workers: usize,
}

fn default_look_around() -> usize {
    3
}

impl Default for RefinementSettings {
    fn default() -> Self {
        Self {
            look_around: default_look_around(),
            workers: 0,
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Logging,
    Detection,
    Matching,
    Refinement,
}

impl ConfigSection {
    /// All sections in file order.
    pub const ALL: [ConfigSection; 5] = [
        ConfigSection::Paths,
        ConfigSection::Logging,
        ConfigSection::Detection,
        ConfigSection::Matching,
        ConfigSection::Refinement,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Logging => "logging",
            ConfigSection::Detection => "detection",
            ConfigSection::Matching => "matching",
            ConfigSection::Refinement => "refinement",
        }
    }

    /// Comment written above the section.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Frame directories and output locations",
            ConfigSection::Logging => "Logging configuration",
            ConfigSection::Detection => "Scene-change keyframe detection",
            ConfigSection::Matching => "Keyframe matching between original and recorded",
            ConfigSection::Refinement => "Per-frame refinement inside matched segments",
        }
    }
}
