//! Operations configuration and its shared snapshot handle.

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which CDNs this monitor publishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OperationsConfig {
    /// Primary CDN. Empty means "not configured".
    pub cdn_name: String,

    /// Managed CDNs in publication order. Blank entries are ignored.
    pub managed_cdns: Vec<String>,
}

impl OperationsConfig {
    pub fn new(cdn_name: impl Into<String>, managed_cdns: Vec<String>) -> Self {
        Self {
            cdn_name: cdn_name.into(),
            managed_cdns,
        }
    }

    /// More than one managed CDN entry selects the multi-CDN envelope.
    pub fn is_multi_cdn(&self) -> bool {
        self.managed_cdns.len() > 1
    }
}

/// Shared, atomically replaceable `OperationsConfig`.
///
/// Readers take a point-in-time snapshot with [`current`](Self::current) and
/// keep using it for the rest of their request, even if a reload lands.
#[derive(Debug, Clone)]
pub struct OpsConfigHandle {
    inner: Arc<ArcSwap<OperationsConfig>>,
}

impl OpsConfigHandle {
    pub fn new(config: OperationsConfig) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    pub fn current(&self) -> Arc<OperationsConfig> {
        self.inner.load_full()
    }

    pub fn store(&self, config: OperationsConfig) {
        self.inner.store(Arc::new(config));
    }
}

impl Default for OpsConfigHandle {
    fn default() -> Self {
        Self::new(OperationsConfig::default())
    }
}
