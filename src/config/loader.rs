//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::blockchain::types::RecordChainError;
use crate::config::schema::RecordChainConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable that overrides `account.private_key`.
pub const PRIVATE_KEY_ENV_VAR: &str = "RECORD_CHAIN_PRIVATE_KEY";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl ConfigError {
    /// True when the only thing wrong is that credentials were never filled in.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, ConfigError::Validation(errors) if errors.contains(&ValidationError::PlaceholderCredentials))
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for RecordChainError {
    fn from(e: ConfigError) -> Self {
        RecordChainError::Configuration(e.to_string())
    }
}

/// Parse configuration text and apply the environment override, without validating.
pub fn parse_config(content: &str) -> Result<RecordChainConfig, ConfigError> {
    let mut config: RecordChainConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    if let Ok(key) = std::env::var(PRIVATE_KEY_ENV_VAR) {
        if !key.trim().is_empty() {
            config.account.private_key = key;
        }
    }
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RecordChainConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config = parse_config(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
