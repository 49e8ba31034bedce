//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::config::ops::OperationsConfig;

/// Root configuration for the CRConfig monitor.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Where CRConfig snapshots come from.
    pub authority: AuthorityConfig,

    /// Primary CDN and the set of managed CDNs.
    pub operations: OperationsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Kind of configuration authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityKind {
    /// Traffic Ops snapshot API.
    #[default]
    TrafficOps,
    /// A local directory of `<cdn>.json` files.
    Directory,
}

/// Configuration authority settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthorityConfig {
    pub kind: AuthorityKind,

    /// Traffic Ops base URL (e.g., "https://trafficops.example.net").
    pub url: String,

    pub username: String,

    /// Overridden by the `CRCONFIG_TO_PASSWORD` environment variable when set.
    #[serde(skip_serializing)]
    pub password: String,

    /// Accept invalid TLS certificates from Traffic Ops.
    pub insecure: bool,

    /// Directory holding `<cdn>.json` files when `kind = "directory"`.
    pub directory: Option<String>,

    /// How often a disconnected session attempts to log in again.
    pub reconnect_interval_secs: u64,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            kind: AuthorityKind::TrafficOps,
            url: "https://localhost".to_string(),
            username: String::new(),
            password: String::new(),
            insecure: false,
            directory: None,
            reconnect_interval_secs: 30,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time to serve one client request, in seconds.
    pub request_secs: u64,

    /// Timeout of each call to the configuration authority, in seconds.
    pub authority_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            authority_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
