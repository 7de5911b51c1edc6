//! Configuration management for Weft.
//!
//! Parses `weft.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! ```toml
//! [engine]
//! template_mode = "html"
//!
//! [dialects.standard]
//! prefix = "th"
//! enabled = true
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "weft.toml";

/// Engine configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine-wide settings.
    pub engine: EngineConfig,
    /// Per-dialect settings, keyed by dialect name.
    pub dialects: BTreeMap<String, DialectConfig>,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Engine-wide settings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default template mode for templates processed without an explicit mode.
    pub template_mode: TemplateModeConfig,
}

/// Template mode as written in `weft.toml`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateModeConfig {
    /// HTML mode.
    #[default]
    Html,
    /// XML mode.
    Xml,
}

/// Settings for a single dialect.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DialectConfig {
    /// Attribute/element prefix overriding the dialect's default prefix.
    pub prefix: Option<String>,
    /// Whether the dialect's processors are registered at all.
    pub enabled: bool,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            prefix: None,
            enabled: true,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a dialect prefix to be usable as a markup name prefix.
///
/// `:` and `-` are rejected since they separate prefixes from local names.
fn require_prefix_syntax(value: &str, field: &str) -> Result<(), ConfigError> {
    let mut chars = value.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return Err(ConfigError::Validation(format!(
            "{field} must start with an ASCII letter"
        )));
    }
    if let Some(invalid) = chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '.')) {
        return Err(ConfigError::Validation(format!(
            "{field} contains invalid character '{invalid}'"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `weft.toml` in current directory and parents,
    /// falling back to defaults when none is found.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, or if reading,
    /// parsing or validation fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from_file(path);
        }
        match std::env::current_dir().ok().and_then(|cwd| Self::discover_config(&cwd)) {
            Some(discovered) => Self::load_from_file(&discovered),
            None => Ok(Self::default()),
        }
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` or `ConfigError::Validation`.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Settings for the named dialect, if configured.
    #[must_use]
    pub fn dialect(&self, name: &str) -> Option<&DialectConfig> {
        self.dialects.get(name)
    }

    /// Search for config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after parsing.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_dialects()
    }

    /// Validate dialect sections.
    fn validate_dialects(&self) -> Result<(), ConfigError> {
        for (name, dialect) in &self.dialects {
            if let Some(prefix) = &dialect.prefix {
                let field = format!("dialects.{name}.prefix");
                require_non_empty(prefix, &field)?;
                require_prefix_syntax(prefix, &field)?;
            }
        }
        Ok(())
    }
}
