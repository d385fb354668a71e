//! Config manager for loading, saving, and atomic updates.
//!
//! Key features:
//! - Atomic writes (write to temp file, then rename)
//! - Section-level updates (only modified section is changed)
//! - Validation on load (unknown sections are dropped on rewrite)

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::{DocumentMut, Item};

use super::settings::{ConfigSection, Settings};

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Failed to parse config for editing: {0}")]
    EditParseError(#[from] toml_edit::TomlError),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Unknown config key: {0} (expected <section>.<key>)")]
    UnknownKey(String),
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Manages application configuration.
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Create a new config manager with the given config file path.
    ///
    /// Does not load the config - call `load()` or `load_or_create()` after.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    /// Get the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get a reference to the current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get a mutable reference to the current settings.
    ///
    /// Changes stay in memory until `save()` or `update_section()`.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Load config from file.
    ///
    /// Returns error if file doesn't exist.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }

        let content = fs::read_to_string(&self.config_path)?;
        self.settings = toml::from_str(&content)?;
        Ok(())
    }

    /// Load config from file, creating with defaults if it doesn't exist.
    ///
    /// Also validates and cleans up the config, saving if changes were made.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)?;
            let (settings, was_modified) = self.parse_validate_and_clean(&content)?;
            self.settings = settings;

            if was_modified {
                tracing::info!("Rewriting config {}", self.config_path.display());
                self.save()?;
            }
        } else {
            self.settings = Settings::default();
            self.save()?;
            tracing::info!("Created default config {}", self.config_path.display());
        }
        Ok(())
    }

    /// Ensure the output and logs directories exist.
    pub fn ensure_dirs_exist(&self) -> ConfigResult<()> {
        for dir in [&self.settings.paths.output_folder, &self.settings.paths.logs_folder] {
            let path = PathBuf::from(dir);
            if !path.exists() {
                fs::create_dir_all(&path)?;
            }
        }
        Ok(())
    }

    /// Get the logs folder path.
    pub fn logs_folder(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.logs_folder)
    }

    /// Parse content and report whether the file needs rewriting.
    fn parse_validate_and_clean(&self, content: &str) -> ConfigResult<(Settings, bool)> {
        let doc: DocumentMut = content.parse()?;
        let settings: Settings = toml::from_str(content)?;

        let has_unknown = doc
            .iter()
            .any(|(key, _)| !ConfigSection::ALL.iter().any(|s| s.table_name() == key));
        if has_unknown {
            tracing::warn!("Dropping unknown sections from {}", self.config_path.display());
        }

        // Missing keys show up as a difference against the full rendering
        let reparsed: DocumentMut = self.generate_config_with_comments()?.parse()?;
        let missing_keys = ConfigSection::ALL.iter().any(|section| {
            let name = section.table_name();
            let expected = reparsed.get(name).and_then(Item::as_table);
            let actual = doc.get(name).and_then(Item::as_table);
            match (expected, actual) {
                (Some(expected), Some(actual)) => {
                    expected.iter().any(|(key, _)| !actual.contains_key(key))
                }
                _ => true,
            }
        });

        Ok((settings, has_unknown || missing_keys))
    }

    /// Render the current settings as a commented TOML document.
    pub fn to_toml(&self) -> ConfigResult<String> {
        self.generate_config_with_comments()
    }

    /// Set one value by dotted key (`matching.window_radius`) and persist
    /// its section.
    ///
    /// `value` is read as a TOML literal; anything that does not parse as
    /// one is taken as a bare string. The settings are left untouched if
    /// the new value has the wrong type.
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<ConfigSection> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let (table, field) = key.split_once('.').ok_or_else(unknown)?;
        let section = ConfigSection::ALL
            .into_iter()
            .find(|s| s.table_name() == table)
            .ok_or_else(unknown)?;

        let mut doc: DocumentMut = self.generate_config_with_comments()?.parse()?;
        let slot = doc
            .get_mut(table)
            .and_then(Item::as_table_mut)
            .and_then(|t| t.get_mut(field))
            .ok_or_else(unknown)?;
        let parsed = value
            .parse::<toml_edit::Value>()
            .unwrap_or_else(|_| toml_edit::Value::from(value));
        *slot = Item::Value(parsed);

        self.settings = toml::from_str(&doc.to_string())?;
        self.update_section(section)?;
        tracing::info!("Set {} = {} in {}", key, value, self.config_path.display());
        Ok(section)
    }

    /// Save the entire config atomically.
    pub fn save(&self) -> ConfigResult<()> {
        let content = self.generate_config_with_comments()?;
        self.atomic_write(&content)?;
        Ok(())
    }

    /// Update a specific section atomically.
    ///
    /// Re-reads the file from disk, replaces only the given section, and
    /// writes back atomically. Other sections keep their on-disk content.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let current_content = if self.config_path.exists() {
            fs::read_to_string(&self.config_path)?
        } else {
            String::new()
        };

        let mut doc: DocumentMut = if current_content.is_empty() {
            DocumentMut::new()
        } else {
            current_content.parse()?
        };

        let section_doc: DocumentMut = self.section_toml(section)?.parse()?;
        doc[section.table_name()] = Item::Table(section_doc.as_table().clone());

        self.atomic_write(&doc.to_string())?;
        Ok(())
    }

    /// Render the body of one section.
    fn section_toml(&self, section: ConfigSection) -> ConfigResult<String> {
        let body = match section {
            ConfigSection::Paths => toml::to_string_pretty(&self.settings.paths)?,
            ConfigSection::Logging => toml::to_string_pretty(&self.settings.logging)?,
            ConfigSection::Detection => toml::to_string_pretty(&self.settings.detection)?,
            ConfigSection::Matching => toml::to_string_pretty(&self.settings.matching)?,
            ConfigSection::Refinement => toml::to_string_pretty(&self.settings.refinement)?,
        };
        Ok(body)
    }

    /// Generate config content with section comments.
    fn generate_config_with_comments(&self) -> ConfigResult<String> {
        let mut output = String::new();

        output.push_str("# Video Frame Align Configuration\n");
        output.push_str(
            "# This file is auto-generated. Comments may be preserved on section updates.\n",
        );

        for section in ConfigSection::ALL {
            output.push('\n');
            output.push_str(&format!("# {}\n", section.comment()));
            output.push_str(&format!("[{}]\n", section.table_name()));
            for line in self.section_toml(section)?.lines() {
                output.push_str(line);
                output.push('\n');
            }
        }

        Ok(output)
    }

    /// Write content to config file atomically.
    fn atomic_write(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.config_path.with_extension("toml.tmp");

        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, &self.config_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TieBreakMode;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn load_or_create_creates_default() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(".config").join("vfa.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert!(config_path.exists());
        let content = fs::read_to_string(&config_path).unwrap();
        for section in ConfigSection::ALL {
            assert!(content.contains(&format!("[{}]", section.table_name())));
        }
    }

    #[test]
    fn generated_file_round_trips() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("vfa.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.settings_mut().matching.window_radius = 40;
        manager.settings_mut().matching.tie_break = TieBreakMode::NearestIndex;
        manager.save().unwrap();

        let mut reloaded = ConfigManager::new(&config_path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.settings().matching.window_radius, 40);
        assert_eq!(reloaded.settings().matching.tie_break, TieBreakMode::NearestIndex);
        assert_eq!(reloaded.settings().detection.threshold, 0.6);
    }

    #[test]
    fn load_or_create_preserves_existing() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("vfa.toml");

        fs::write(&config_path, "[paths]\noutput_folder = \"my_custom_folder\"\n").unwrap();

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        assert_eq!(manager.settings().paths.output_folder, "my_custom_folder");
        // Missing sections were filled in on disk
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[refinement]"));
        assert!(content.contains("my_custom_folder"));
    }

    #[test]
    fn load_or_create_drops_unknown_sections() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("vfa.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();
        let mut content = fs::read_to_string(&config_path).unwrap();
        content.push_str("\n[legacy]\nvalue = 1\n");
        fs::write(&config_path, content).unwrap();

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(!content.contains("[legacy]"));
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join("absent.toml"));
        assert!(matches!(manager.load(), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn update_section_only_changes_target() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("vfa.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        manager.settings_mut().refinement.workers = 4;
        manager.settings_mut().logging.compact = false;
        manager.update_section(ConfigSection::Refinement).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("workers = 4"));
        // Logging was not written
        assert!(content.contains("compact = true"));
        assert!(content.contains("[paths]"));
    }

    #[test]
    fn atomic_write_creates_no_temp_on_success() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("vfa.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        let temp_path = config_path.with_extension("toml.tmp");
        assert!(!temp_path.exists());
    }

    #[test]
    fn set_value_updates_one_section() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("vfa.toml");

        let mut manager = ConfigManager::new(&config_path);
        manager.load_or_create().unwrap();

        let section = manager.set_value("matching.tie_break", "nearest_index").unwrap();
        assert_eq!(section, ConfigSection::Matching);
        manager.set_value("matching.window_radius", "120").unwrap();
        assert_eq!(manager.settings().matching.window_radius, 120);

        let mut reloaded = ConfigManager::new(&config_path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.settings().matching.tie_break, TieBreakMode::NearestIndex);
        assert_eq!(reloaded.settings().matching.window_radius, 120);
    }

    #[test]
    fn set_value_rejects_unknown_keys_and_bad_types() {
        let dir = tempdir().unwrap();
        let mut manager = ConfigManager::new(dir.path().join("vfa.toml"));
        manager.load_or_create().unwrap();

        assert!(matches!(
            manager.set_value("matching.radius", "3"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            manager.set_value("window_radius", "3"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(manager.set_value("refinement.workers", "many").is_err());
        assert_eq!(manager.settings().refinement.workers, 0);
    }

    #[test]
    fn to_toml_has_header_and_sections() {
        let manager = ConfigManager::new("unused.toml");
        let rendered = manager.to_toml().unwrap();
        assert!(rendered.starts_with("# Video Frame Align Configuration"));
        assert!(rendered.contains("[detection]\nthreshold = 0.6"));
    }
}
