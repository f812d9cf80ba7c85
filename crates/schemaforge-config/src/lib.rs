//! Configuration for the SchemaForge compiler.
//!
//! Tune the walker depth limit, hash formatting, date encoding and default
//! tracking mode from a TOML or YAML file without code changes.
//!
//! # Examples
//!
//! ```
//! use schemaforge_config::{CompilerConfig, DateEncoding};
//!
//! let config = CompilerConfig::from_toml_str(r#"
//!     max_depth = 8
//!     hash_separator = "::"
//!     date_encoding = "epoch_millis"
//! "#).unwrap();
//!
//! assert_eq!(config.max_depth, 8);
//! assert_eq!(config.date_encoding, DateEncoding::EpochMillis);
//! ```
//!
//! Use defaults when the file is missing:
//!
//! ```
//! use schemaforge_config::CompilerConfig;
//!
//! let config = CompilerConfig::load("schemaforge.toml").unwrap_or_default();
//! assert_eq!(config.hash_separator, "|");
//! ```

use std::path::Path;

use schemaforge_core::TrackingMode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for configuration loading
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Schema compiler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CompilerConfig {
    /// Deepest nesting the property walker accepts.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Separator between interpolated hash segments.
    #[serde(default = "default_hash_separator")]
    pub hash_separator: String,

    /// How `serialize` encodes date leaves.
    #[serde(default)]
    pub date_encoding: DateEncoding,

    /// Log every rendered code model at trace level.
    #[serde(default)]
    pub trace_code_model: bool,

    /// Mode used by `enrich_default`.
    #[serde(default)]
    pub default_tracking: TrackingModeConfig,
}

fn default_max_depth() -> usize {
    32
}

fn default_hash_separator() -> String {
    "|".to_owned()
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            hash_separator: default_hash_separator(),
            date_encoding: DateEncoding::default(),
            trace_code_model: false,
            default_tracking: TrackingModeConfig::default(),
        }
    }
}

impl CompilerConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file.
    ///
    /// Files ending in `.yaml` or `.yml` are parsed as YAML, anything else
    /// as TOML.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist, fails to parse, or holds
    /// invalid values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_file(path)?,
            _ => Self::from_toml_file(path)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Sets the nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the hash segment separator.
    pub fn with_hash_separator(mut self, separator: impl Into<String>) -> Self {
        self.hash_separator = separator.into();
        self
    }

    /// Sets the date encoding used by `serialize`.
    pub fn with_date_encoding(mut self, encoding: DateEncoding) -> Self {
        self.date_encoding = encoding;
        self
    }

    /// Enables trace logging of rendered code models.
    pub fn with_trace_code_model(mut self, enabled: bool) -> Self {
        self.trace_code_model = enabled;
        self
    }

    /// Sets the mode used by `enrich_default`.
    pub fn with_default_tracking(mut self, mode: TrackingModeConfig) -> Self {
        self.default_tracking = mode;
        self
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be at least 1".into()));
        }
        if self.hash_separator.is_empty() {
            return Err(ConfigError::Invalid("hash_separator must not be empty".into()));
        }
        Ok(())
    }

    /// The tracking mode `enrich_default` applies.
    pub fn tracking_mode(&self) -> TrackingMode {
        self.default_tracking.into()
    }
}

/// Date encoding used when serializing entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateEncoding {
    /// RFC 3339 string with millisecond precision.
    #[default]
    Rfc3339,
    /// Integer milliseconds since the Unix epoch.
    EpochMillis,
}

/// Serializable form of [`TrackingMode`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingModeConfig {
    Off,
    #[default]
    Tracked,
    Immutable,
}

impl From<TrackingModeConfig> for TrackingMode {
    fn from(mode: TrackingModeConfig) -> Self {
        match mode {
            TrackingModeConfig::Off => TrackingMode::Off,
            TrackingModeConfig::Tracked => TrackingMode::Tracked,
            TrackingModeConfig::Immutable => TrackingMode::Immutable,
        }
    }
}
