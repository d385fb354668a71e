//! Configuration management for Video Frame Align.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation on load with automatic defaults
//!
//! # Example
//!
//! ```no_run
//! use vfa_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/vfa.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Output folder: {}", config.settings().paths.output_folder);
//!
//! config.settings_mut().matching.window_radius = 120;
//! config.update_section(ConfigSection::Matching).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, DetectionSettings, LoggingSettings, MatchingSettings, PathSettings,
    RefinementSettings, Settings,
};
