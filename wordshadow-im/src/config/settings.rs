//! Settings configuration
//!
//! Manages user-configurable settings for the engine.
//! Default values are defined in `config/default.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wordshadow_engine::SpacingAndPunctuations;

/// Default configuration TOML embedded from config/default.toml
const DEFAULT_CONFIG_TOML: &str = include_str!("../../config/default.toml");

/// Configuration settings for the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Typing behavior
    pub input: InputSettings,
    /// Query/pick deadlines
    pub pipeline: PipelineSettings,
    /// Text cache and slow-connection tuning
    pub connection: ConnectionSettings,
    /// Language spacing rules
    pub spacing: SpacingAndPunctuations,
    /// Word list and learning limits
    pub dictionary: DictionarySettings,
}

/// Typing behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSettings {
    /// Learn picked words into the user history
    pub auto_correction: bool,
    /// Capitalize the first word of a sentence
    pub auto_cap: bool,
    /// Materialize a pending space before the next picked word
    pub insert_spaces_automatically: bool,
    /// Keep offensive words out of suggestions and learning
    pub block_offensive: bool,
    /// Show the typed word as composing text while querying
    pub mirror_composing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Caller-side deadline for `query`/`pick`
    pub query_timeout_ms: u64,
    /// Worker-side deadline for one suggestion lookup
    pub callback_wait_ms: u64,
}

impl PipelineSettings {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn callback_wait(&self) -> Duration {
        Duration::from_millis(self.callback_wait_ms)
    }
}

/// Text cache and slow-connection tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Characters fetched on a full reload
    pub cache_size: usize,
    /// Full reload slower than this marks the connection slow (ms)
    pub slow_full_reload_ms: u64,
    /// Single read slower than this marks the connection slow (ms)
    pub slow_partial_reload_ms: u64,
    /// How long the slow mark persists (seconds)
    pub slow_persist_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionarySettings {
    /// Path to a TSV or JSON word list (optional, defaults to the bundled sample)
    pub path: Option<String>,
    /// Maximum number of suggestions returned per query
    pub max_suggestions: usize,
    /// Maximum number of entries kept in the user history
    pub history_max_entries: usize,
}

impl Default for Settings {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("embedded default.toml must be valid")
    }
}

/// Recursively merge `overlay` TOML values on top of `base`.
fn merge_toml(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(key) {
                    merge_toml(base_value, value);
                } else {
                    base_table.insert(key.clone(), value.clone());
                }
            }
        }
        (base, _) => {
            *base = overlay.clone();
        }
    }
}

/// Parse user TOML content merged on top of default.toml.
fn parse_with_defaults(user_content: &str) -> Result<Settings> {
    let mut base: toml::Value = toml::from_str(DEFAULT_CONFIG_TOML)?;
    let user: toml::Value = toml::from_str(user_content)?;
    merge_toml(&mut base, &user);
    let settings: Settings = base.try_into()?;
    Ok(settings)
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "wordshadow", "wordshadow")
}

impl Settings {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load settings from the default configuration file.
    /// Falls back to embedded default.toml if the config file does not exist.
    pub fn load() -> Result<Self> {
        let Some(config_file) = Self::config_file() else {
            warn!("Could not determine config directory, using defaults");
            return Ok(Self::default());
        };

        if !config_file.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        debug!("Loading config from {:?}", config_file);
        let content = fs::read_to_string(&config_file)?;
        parse_with_defaults(&content)
    }

    /// Load settings from a specific file, merged on top of defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        parse_with_defaults(&content)
    }

    /// Save settings to the default configuration file
    pub fn save(&self) -> Result<()> {
        let Some(config_file) = Self::config_file() else {
            anyhow::bail!("Could not determine config directory");
        };
        debug!("Saving config to {:?}", config_file);
        self.save_to(&config_file)
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.input.auto_correction);
        assert!(!settings.input.mirror_composing);
        assert_eq!(settings.pipeline.query_timeout_ms, 1000);
        assert_eq!(settings.pipeline.callback_wait(), Duration::from_millis(3000));
        assert_eq!(settings.connection.cache_size, 40);
        assert_eq!(settings.connection.slow_persist_secs, 600);
        assert_eq!(settings.dictionary.path, None);
        assert_eq!(settings.dictionary.max_suggestions, 18);
    }

    #[test]
    fn test_default_spacing_matches_engine() {
        assert_eq!(Settings::default().spacing, SpacingAndPunctuations::default());
    }

    #[test]
    fn test_serialize_deserialize() {
        let settings = Settings::default();
        let toml_str = toml::to_string(&settings).unwrap();
        let loaded: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[input]
auto_correction = false
insert_spaces_automatically = false

[dictionary]
path = "/tmp/words.tsv"
"#
        )
        .unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert!(!settings.input.auto_correction);
        assert!(!settings.input.insert_spaces_automatically);
        assert_eq!(settings.dictionary.path.as_deref(), Some("/tmp/words.tsv"));
    }

    #[test]
    fn test_partial_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[connection]
slow_partial_reload_ms = 50
"#
        )
        .unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert_eq!(settings.connection.slow_partial_reload_ms, 50);
        // Should use default for unspecified values
        assert_eq!(settings.connection.slow_full_reload_ms, 1000);
        assert!(settings.input.auto_cap);
        assert!(settings.spacing.language_has_spaces);
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[pipeline]\nquery_timeout_ms = \"soon\"").unwrap();
        assert!(Settings::load_from(file.path()).is_err());
    }

    #[test]
    fn test_save_to_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.pipeline.query_timeout_ms = 250;
        settings.spacing.language_has_spaces = false;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.pipeline.query_timeout_ms, 250);
        assert!(!loaded.spacing.language_has_spaces);
    }

    #[test]
    fn test_config_file_name() {
        // Should return Some on systems with a home directory
        if let Some(file) = Settings::config_file() {
            assert!(file.ends_with("config.toml"));
        }
    }
}
