//! CRConfig publication subsystem.
//!
//! # Data Flow
//! ```text
//! OperationsConfig snapshot + ConfigAuthoritySession
//!     → router.rs (connected? CDN configured? how many managed CDNs?)
//!         ≤ 1 managed CDN → session document, unchanged
//!         ≥ 2 managed CDNs → aggregator.rs
//!                               → fetch each CDN in order
//!                               → envelope.rs ({"cdnConfigs": [...]}, freshness)
//!     → PublishedCrConfig { body, last_modified, mode }
//! ```
//!
//! # Design Decisions
//! - Pure function of (snapshot, session); no state survives a request
//! - One fetch attempt per CDN per request, no caching
//! - Per-CDN failures are logged and omitted, never surfaced

pub mod aggregator;
pub mod envelope;
pub mod error;
pub mod router;

use chrono::{DateTime, Utc};

pub use aggregator::aggregate;
pub use envelope::{CdnConfigEntry, Envelope, Freshness};
pub use error::{CrConfigError, CrConfigResult};
pub use router::serve_crconfig;

/// Which shape a published CRConfig has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishMode {
    /// The primary CDN's document, unwrapped.
    Single,
    /// The `cdnConfigs` envelope.
    Multi,
}

impl PublishMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishMode::Single => "single",
            PublishMode::Multi => "multi",
        }
    }
}

/// Body and modification time to hand to the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedCrConfig {
    pub body: Vec<u8>,
    pub last_modified: DateTime<Utc>,
    pub mode: PublishMode,
}

/// Blank CDN names stand for "not configured".
pub(crate) fn is_blank(cdn_name: &str) -> bool {
    cdn_name.trim().is_empty()
}
