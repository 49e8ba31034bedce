//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, URLs and value ranges
//! - Report duplicate managed CDNs (published once per listing, not rejected)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MonitorConfig → Result<(), Vec<ValidationError>>
//! - An empty primary CDN is allowed here and reported per request instead

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::ops::OperationsConfig;
use crate::config::schema::{AuthorityKind, MonitorConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("authority.url '{0}' is not a valid HTTP(S) URL")]
    InvalidUrl(String),

    #[error("authority.username is required for Traffic Ops")]
    MissingUsername,

    #[error("authority.directory is required when kind = \"directory\"")]
    MissingDirectory,

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    match config.authority.kind {
        AuthorityKind::TrafficOps => {
            let valid_url = url::Url::parse(&config.authority.url)
                .map(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
                .unwrap_or(false);
            if !valid_url {
                errors.push(ValidationError::InvalidUrl(config.authority.url.clone()));
            }
            if config.authority.username.is_empty() {
                errors.push(ValidationError::MissingUsername);
            }
            if config.authority.reconnect_interval_secs == 0 {
                errors.push(ValidationError::ZeroDuration("authority.reconnect_interval_secs"));
            }
        }
        AuthorityKind::Directory => {
            let missing = config
                .authority
                .directory
                .as_deref()
                .map_or(true, |d| d.trim().is_empty());
            if missing {
                errors.push(ValidationError::MissingDirectory);
            }
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroDuration("timeouts.request_secs"));
    }
    if config.timeouts.authority_secs == 0 {
        errors.push(ValidationError::ZeroDuration("timeouts.authority_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Non-blank managed CDN names listed more than once, in first-repeat order.
pub fn duplicate_managed_cdns(ops: &OperationsConfig) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for name in &ops.managed_cdns {
        let name = name.trim();
        if !name.is_empty() && !seen.insert(name) && !duplicates.contains(&name) {
            duplicates.push(name);
        }
    }
    duplicates
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
