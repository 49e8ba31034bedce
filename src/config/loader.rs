//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::MonitorConfig;
use crate::config::validation::{duplicate_managed_cdns, validate_config, ValidationError};

/// Environment variable overriding `authority.password`.
pub const PASSWORD_ENV: &str = "CRCONFIG_TO_PASSWORD";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<MonitorConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;

    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        config.authority.password = password;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    for name in duplicate_managed_cdns(&config.operations) {
        tracing::warn!(cdn = %name, "Managed CDN listed more than once, it will be published once per listing");
    }

    Ok(config)
}

/// Parse configuration text without validating it.
pub fn parse_config(content: &str) -> Result<MonitorConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}
