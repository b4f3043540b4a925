use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use strum::{Display, EnumString};

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// File name looked up in the working directory when no explicit path is given
pub const DEFAULT_CONFIG_FILE_NAME: &str = "cert-rules.toml";

/// Fallback for `ext.` conditions the resolver cannot decide
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExternalConditionStrategy {
    /// Treat the condition as fulfilled
    DefaultToTrue,

    /// Treat the condition as violated, without a message
    DefaultToFalse,

    /// Treat the condition as failed
    #[default]
    FailCondition,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Rules with a higher schema version are skipped
    #[serde(default = "default_supported_schema_version")]
    pub supported_schema_version: u32,

    /// Outcome of an external condition nobody could decide
    #[serde(default)]
    pub external_condition_strategy: ExternalConditionStrategy,

    /// Maximum number of `equal_to_profile` hops per validation
    #[serde(default = "default_max_delegation_depth")]
    pub max_delegation_depth: usize,
}

const fn default_supported_schema_version() -> u32 {
    1
}

const fn default_max_delegation_depth() -> usize {
    1
}

impl EngineConfig {
    /// Load configuration from a file or use defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or holds invalid values
    pub fn load(root: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = root.join(DEFAULT_CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.supported_schema_version == 0 {
            return Err(app_err!("supported_schema_version must be at least 1"));
        }

        if self.max_delegation_depth == 0 {
            return Err(app_err!("max_delegation_depth must be at least 1"));
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            supported_schema_version: default_supported_schema_version(),
            external_condition_strategy: ExternalConditionStrategy::default(),
            max_delegation_depth: default_max_delegation_depth(),
        }
    }
}
