//! Configuration authority sessions.
//!
//! # Data Flow
//! ```text
//! crconfig router / aggregator
//!     → ConfigAuthoritySession::fetch_latest_config(cdn)
//!         → traffic_ops.rs (HTTP snapshot endpoint, cookie auth)
//!         → static_docs.rs (in-memory or directory of <cdn>.json files)
//!     → ConfigDocument { payload, modified }
//! ```
//!
//! # Design Decisions
//! - Sessions are read-only from the caller's point of view
//! - Payloads are opaque bytes; sessions never interpret the CRConfig schema
//! - One call is one fetch attempt; sessions do not retry

pub mod static_docs;
pub mod traffic_ops;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub use static_docs::{DirectorySession, StaticSession};
pub use traffic_ops::TrafficOpsSession;

/// A serialized CRConfig and the time it was last modified upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    pub payload: Vec<u8>,
    pub modified: DateTime<Utc>,
}

impl ConfigDocument {
    pub fn new(payload: impl Into<Vec<u8>>, modified: DateTime<Utc>) -> Self {
        Self {
            payload: payload.into(),
            modified,
        }
    }
}

/// Errors raised by a configuration authority session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session has no authenticated connection.
    #[error("not connected to the configuration authority")]
    NotConnected,

    /// The authority rejected our credentials or session cookie.
    #[error("configuration authority rejected the session")]
    Unauthorized,

    /// Login was refused for a reason other than bad credentials.
    #[error("login failed with status {0}")]
    LoginFailed(u16),

    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The authority answered with an unexpected status.
    #[error("configuration authority returned {status} for CDN '{cdn}'")]
    Status { cdn: String, status: u16 },

    /// No snapshot exists for the CDN.
    #[error("no CRConfig snapshot for CDN '{0}'")]
    NotFound(String),

    /// The authority's response could not be unwrapped.
    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only access to the latest CRConfig snapshot of each CDN.
#[async_trait]
pub trait ConfigAuthoritySession: Send + Sync {
    /// Whether the session is initialized and authenticated.
    fn is_connected(&self) -> bool;

    /// Fetch the latest CRConfig snapshot for `cdn_name`.
    async fn fetch_latest_config(&self, cdn_name: &str) -> Result<ConfigDocument, SessionError>;
}
