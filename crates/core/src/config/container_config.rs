use std::collections::BTreeMap;
use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::sources::ConfigSource;
use crate::container::value::Value;
use crate::errors::CoreError;

/// Environment variable overriding `ContainerDefaults::share`
pub const SHARE_ENV: &str = "DI_SHARE";
/// Environment variable overriding `ContainerDefaults::autowire`
pub const AUTOWIRE_ENV: &str = "DI_AUTOWIRE";

fn enabled() -> bool {
    true
}

/// Flags applied to every descriptor created by `Container::register`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDefaults {
    #[serde(default = "enabled")]
    pub share: bool,
    #[serde(default = "enabled")]
    pub autowire: bool,
}

impl Default for ContainerDefaults {
    fn default() -> Self {
        Self {
            share: true,
            autowire: true,
        }
    }
}

impl ContainerDefaults {
    /// Apply `DI_SHARE` and `DI_AUTOWIRE` when set
    pub fn with_env_overrides(mut self) -> Result<Self, CoreError> {
        self.apply_env_overrides()?;
        Ok(self)
    }

    /// Apply the set environment overrides in place, returning the names of
    /// the variables that were applied
    fn apply_env_overrides(&mut self) -> Result<Vec<&'static str>, CoreError> {
        let mut applied = Vec::new();
        if let Ok(share) = env::var(SHARE_ENV) {
            self.share = parse_bool(SHARE_ENV, &share)?;
            applied.push(SHARE_ENV);
        }
        if let Ok(autowire) = env::var(AUTOWIRE_ENV) {
            self.autowire = parse_bool(AUTOWIRE_ENV, &autowire)?;
            applied.push(AUTOWIRE_ENV);
        }
        Ok(applied)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self, CoreError> {
        Self::default().with_env_overrides()
    }
}

fn parse_bool(variable: &str, raw: &str) -> Result<bool, CoreError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(CoreError::configuration(format!(
            "Invalid value for {}: '{}'. Expected: true/false, 1/0, yes/no or on/off",
            variable, raw
        ))),
    }
}

/// Container settings loadable from YAML or JSON:
///
/// ```yaml
/// defaults:
///   share: false
/// parameters:
///   director:
///     name: James
/// aliases:
///   boss: director
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerConfig {
    #[serde(default)]
    pub defaults: ContainerDefaults,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(skip)]
    source: ConfigSource,
}

impl ContainerConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CoreError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.with_source(ConfigSource::Programmatic).validated()
    }

    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_str(json)?;
        config.with_source(ConfigSource::Programmatic).validated()
    }

    /// Load from a `.yaml`/`.yml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let config: Self = match extension.as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            _ => {
                return Err(CoreError::configuration(format!(
                    "Unsupported configuration file format: {}",
                    path.display()
                )))
            }
        };
        tracing::debug!("Loaded container configuration from {}", path.display());
        config
            .with_source(ConfigSource::File(path.display().to_string()))
            .validated()
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// Apply `DI_SHARE` and `DI_AUTOWIRE` on top of the loaded defaults.
    /// When any of them is set the source becomes `ConfigSource::EnvVar`.
    pub fn with_env_overrides(mut self) -> Result<Self, CoreError> {
        let applied = self.defaults.apply_env_overrides()?;
        if !applied.is_empty() {
            tracing::debug!("Container defaults overridden by {}", applied.join(", "));
            self.source = ConfigSource::EnvVar(applied.join(","));
        }
        Ok(self)
    }

    /// Reject aliases with empty names or targets and aliases to themselves
    pub fn validate(&self) -> Result<(), CoreError> {
        for (alias, id) in &self.aliases {
            if alias.is_empty() || id.is_empty() {
                return Err(CoreError::configuration(format!(
                    "Invalid alias '{}' -> '{}': names must not be empty",
                    alias, id
                )));
            }
            if alias == id {
                return Err(CoreError::configuration(format!(
                    "Alias '{}' points to itself",
                    alias
                )));
            }
        }
        Ok(())
    }

    fn with_source(mut self, source: ConfigSource) -> Self {
        self.source = source;
        self
    }

    fn validated(self) -> Result<Self, CoreError> {
        self.validate()?;
        Ok(self)
    }
}
