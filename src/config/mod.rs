//! Configuration module for visgraph
//!
//! This module handles the runtime configuration:
//! - Where user templates live
//! - Default template names for the render and sequence roles
//! - The naming convention used by the particle filter
//! - The default logging filter
//!
//! # App Data Location
//!
//! User templates default to the platform-appropriate data directory:
//! - **Linux**: `~/.local/share/dev.visgraph/templates/`
//! - **macOS**: `~/Library/Application Support/dev.visgraph/templates/`
//! - **Windows**: `%APPDATA%\dev.visgraph\templates\`
//!
//! # Example
//!
//! ```toml
//! [templates]
//! directory = "/opt/visgraph/templates"
//!
//! [defaults]
//! render = "cartoon"
//!
//! [logging]
//! filter = "warn,visgraph=info"
//! ```

use crate::error::{Result, VisError};
use crate::frame::keys;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.visgraph";

/// Config filename inside the app data directory
pub const CONFIG_FILE: &str = "config.toml";

/// Template directory name inside the app data directory
pub const TEMPLATES_DIR: &str = "templates";

/// Default tracing filter
pub const DEFAULT_LOG_FILTER: &str = "info,visgraph=debug";

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Get the path to the default config file
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Sections ====================

/// Template lookup settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateSettings {
    /// Directory holding `<role>/<name>.toml` templates. Defaults to the
    /// app data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl TemplateSettings {
    /// The configured directory, or the default one under the app data dir.
    pub fn resolved_directory(&self) -> Option<PathBuf> {
        self.directory
            .clone()
            .or_else(|| app_data_dir().map(|p| p.join(TEMPLATES_DIR)))
    }
}

/// Template names used when a specification leaves a role out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultSettings {
    #[serde(default = "default_render")]
    pub render: String,

    #[serde(default = "default_sequence")]
    pub sequence: String,
}

fn default_render() -> String {
    "ball and stick".to_string()
}

fn default_sequence() -> String {
    "entities".to_string()
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            render: default_render(),
            sequence: default_sequence(),
        }
    }
}

/// Naming convention for the particle filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Array properties whose name contains this are filtered per particle
    #[serde(default = "default_marker")]
    pub per_particle_marker: String,

    /// Property holding bond pairs, remapped through the filter
    #[serde(default = "default_bond_key")]
    pub bond_key: String,
}

fn default_marker() -> String {
    keys::PER_PARTICLE_MARKER.to_string()
}

fn default_bond_key() -> String {
    keys::BOND_PAIRS.to_string()
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            per_particle_marker: default_marker(),
            bond_key: default_bond_key(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

// ==================== Config ====================

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisConfig {
    #[serde(default)]
    pub templates: TemplateSettings,

    #[serde(default)]
    pub defaults: DefaultSettings,

    #[serde(default)]
    pub filter: FilterSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl VisConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            VisError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            VisError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Load the config from the app data directory, returning defaults if it
    /// is missing or invalid
    pub fn load_or_default() -> Self {
        let Some(path) = config_path().filter(|p| p.exists()) else {
            return Self::default();
        };
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save configuration as TOML, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                VisError::Config(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| VisError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| VisError::Config(format!("Failed to write {}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = VisConfig::default();
        assert_eq!(config.defaults.render, "ball and stick");
        assert_eq!(config.defaults.sequence, "entities");
        assert_eq!(config.filter.per_particle_marker, "particle.");
        assert_eq!(config.filter.bond_key, "bond.pairs");
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
        assert!(config.templates.directory.is_none());
    }

    #[test]
    fn test_partial_config() {
        let config: VisConfig = toml::from_str(
            r#"
            [defaults]
            render = "cartoon"
            "#,
        )
        .unwrap();
        assert_eq!(config.defaults.render, "cartoon");
        assert_eq!(config.defaults.sequence, "entities");
        assert_eq!(config.filter, FilterSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = VisConfig::default();
        config.templates.directory = Some(dir.path().join("templates"));
        config.logging.filter = "warn".to_string();
        config.save(&path).unwrap();

        let loaded = VisConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(
            loaded.templates.resolved_directory(),
            Some(dir.path().join("templates"))
        );
    }

    #[test]
    fn test_load_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[defaults\n").unwrap();
        assert!(matches!(VisConfig::load(&path), Err(VisError::Config(_))));
        assert!(matches!(
            VisConfig::load(dir.path().join("missing.toml")),
            Err(VisError::Config(_))
        ));
    }
}
