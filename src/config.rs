//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/featmodel/featmodel.toml`
//! 3. Local config: the file passed to [`Settings::load`]
//! 4. Environment variables: `FEATMODEL__*` prefix (e.g. `FEATMODEL__IDENTIFIERS__STRATEGY=uuid`)

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::IdentifierFactory;

/// Identifier allocation strategy for newly created models.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StrategyName {
    #[default]
    Counter,
    Uuid,
}

impl StrategyName {
    fn parse(value: &str) -> Result<Self, ApplicationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "counter" => Ok(Self::Counter),
            "uuid" => Ok(Self::Uuid),
            other => Err(ApplicationError::Config {
                message: format!("unknown identifier strategy: {}", other),
            }),
        }
    }
}

/// Identifier chain configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IdentifierSettings {
    pub strategy: StrategyName,
    /// First value of a counter chain (ignored for UUIDs)
    pub seed: u64,
}

impl Default for IdentifierSettings {
    fn default() -> Self {
        Self {
            strategy: StrategyName::Counter,
            seed: 1,
        }
    }
}

/// Output format configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FormatSettings {
    /// Indent JSON output
    pub pretty: bool,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Raw settings for intermediate parsing (`None` → not specified, inherit from base).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub identifiers: RawIdentifierSettings,
    pub format: RawFormatSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawIdentifierSettings {
    pub strategy: Option<StrategyName>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawFormatSettings {
    pub pretty: Option<bool>,
}

/// Unified configuration for featmodel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    pub identifiers: IdentifierSettings,
    pub format: FormatSettings,
}

/// Get the XDG config directory for featmodel.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "featmodel").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("featmodel.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Boolean spellings accepted from the environment.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Overlay wins for every value it specifies.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            identifiers: IdentifierSettings {
                strategy: overlay
                    .identifiers
                    .strategy
                    .unwrap_or(self.identifiers.strategy),
                seed: overlay.identifiers.seed.unwrap_or(self.identifiers.seed),
            },
            format: FormatSettings {
                pretty: overlay.format.pretty.unwrap_or(self.format.pretty),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Optional config file layered over the global one; it must exist
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("loading global config {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        // 3. Local config
        if let Some(path) = local {
            debug!("loading local config {}", path.display());
            current = current.merge_with(&load_raw_settings(path)?);
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;
        current.validate()?;
        Ok(current)
    }

    /// Defaults overlaid with a single file; ignores global config and environment.
    pub fn load_file(path: &Path) -> Result<Self, ApplicationError> {
        let settings = Self::default().merge_with(&load_raw_settings(path)?);
        settings.validate()?;
        Ok(settings)
    }

    /// Apply FEATMODEL__* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("FEATMODEL").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("identifiers.strategy") {
            settings.identifiers.strategy = StrategyName::parse(&val)?;
        }
        if let Ok(val) = config.get_string("identifiers.seed") {
            settings.identifiers.seed = val.trim().parse().map_err(|e| ApplicationError::Config {
                message: format!("invalid identifier seed {:?}: {}", val, e),
            })?;
        }
        if let Ok(val) = config.get_string("format.pretty") {
            settings.format.pretty = parse_flag(&val).ok_or_else(|| ApplicationError::Config {
                message: format!("invalid format.pretty {:?}: expected true or false", val),
            })?;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.identifiers.strategy == StrategyName::Counter && self.identifiers.seed == 0 {
            return Err(ApplicationError::Config {
                message: "identifier seed must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Fresh identifier chain as configured.
    pub fn identifier_factory(&self) -> IdentifierFactory {
        match self.identifiers.strategy {
            StrategyName::Counter => IdentifierFactory::counter_from(self.identifiers.seed),
            StrategyName::Uuid => IdentifierFactory::uuid(),
        }
    }
}
