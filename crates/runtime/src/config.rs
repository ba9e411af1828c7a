//! Engine configuration
//!
//! A run is configured from a small YAML document:
//!
//! ```yaml
//! apiVersion: cadence/v1
//! kind: EngineConfig
//! enabled: true
//! legacySequenceValidation: false
//! commandTypes:
//!   Probe: 2
//!   Pulse: 0
//! run:
//!   start: 0
//!   end: 500
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::command_types::CommandTypeRegistry;
use crate::types::SimTime;
use crate::validate::ValidationContext;

const API_VERSION: &str = "cadence/v1";
const KIND: &str = "EngineConfig";

/// Errors that can occur when loading an engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid apiVersion: expected 'cadence/v1', got '{0}'")]
    InvalidApiVersion(String),

    #[error("invalid kind: expected 'EngineConfig', got '{0}'")]
    InvalidKind(String),

    #[error("run window ends at {end} before it starts at {start}")]
    InvalidRunWindow { start: SimTime, end: SimTime },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Inclusive range of simulation steps to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunWindow {
    #[serde(default)]
    pub start: SimTime,
    #[serde(default = "default_end")]
    pub end: SimTime,
}

impl Default for RunWindow {
    fn default() -> Self {
        Self {
            start: 0,
            end: default_end(),
        }
    }
}

fn default_end() -> SimTime {
    1000
}

/// Settings for one run of the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_kind")]
    pub kind: String,

    /// When false, every directive is rejected
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Reject real sequences with a negative initial value or increment
    #[serde(default)]
    pub legacy_sequence_validation: bool,

    /// Groupable command types and their arities
    #[serde(default)]
    pub command_types: IndexMap<String, u32>,

    #[serde(default)]
    pub run: RunWindow,
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

fn default_kind() -> String {
    KIND.to_string()
}

fn default_enabled() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            enabled: true,
            legacy_sequence_validation: false,
            command_types: IndexMap::new(),
            run: RunWindow::default(),
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_yaml::from_str(yaml)?;
        config.validate_schema()?;
        Ok(config)
    }

    fn validate_schema(&self) -> ConfigResult<()> {
        if self.api_version != API_VERSION {
            return Err(ConfigError::InvalidApiVersion(self.api_version.clone()));
        }
        if self.kind != KIND {
            return Err(ConfigError::InvalidKind(self.kind.clone()));
        }
        if self.run.end < self.run.start {
            return Err(ConfigError::InvalidRunWindow {
                start: self.run.start,
                end: self.run.end,
            });
        }
        Ok(())
    }

    pub fn with_command_type(mut self, name: impl Into<String>, arity: u32) -> Self {
        self.command_types.insert(name.into(), arity);
        self
    }

    /// Registry of the configured command types
    pub fn type_registry(&self) -> CommandTypeRegistry {
        self.command_types
            .iter()
            .map(|(name, arity)| (name.as_str(), *arity))
            .collect()
    }

    /// Validation settings for a run against `types`
    pub fn validation_context<'r>(&self, types: &'r CommandTypeRegistry) -> ValidationContext<'r> {
        ValidationContext::new(types)
            .with_enabled(self.enabled)
            .with_legacy_sequence_validation(self.legacy_sequence_validation)
    }
}
