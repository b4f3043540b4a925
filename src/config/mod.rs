//! Engine settings
//!
//! Settings are read from a TOML file (`cert-rules.toml` by default) and fall back to the
//! values documented in `default_config.toml` when no file is present.

mod engine_config;

pub use engine_config::{DEFAULT_CONFIG_FILE_NAME, DEFAULT_CONFIG_TOML, EngineConfig, ExternalConditionStrategy};
