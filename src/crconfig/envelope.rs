//! Multi-CDN envelope and freshness tracking.
//!
//! The envelope wire format is
//! `{"cdnConfigs": [{"cdnName": "...", "crconfig": {...}}, ...]}`.
//! Each `crconfig` is held as a validated but uninterpreted JSON value and is
//! written back out exactly as the authority produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Wrapper published when more than one CDN is managed.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "cdnConfigs")]
    pub cdn_configs: Vec<CdnConfigEntry>,
}

/// One CDN's CRConfig inside the envelope.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CdnConfigEntry {
    pub cdn_name: String,
    pub crconfig: Box<RawValue>,
}

impl Envelope {
    pub fn push(&mut self, cdn_name: impl Into<String>, crconfig: Box<RawValue>) {
        self.cdn_configs.push(CdnConfigEntry {
            cdn_name: cdn_name.into(),
            crconfig,
        });
    }

    pub fn len(&self) -> usize {
        self.cdn_configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cdn_configs.is_empty()
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Latest modification time seen across fetched documents.
///
/// Starts at the earliest representable time, which stands for "nothing
/// observed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Freshness(DateTime<Utc>);

impl Freshness {
    pub const ZERO: Freshness = Freshness(DateTime::<Utc>::MIN_UTC);

    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Freshness(timestamp)
    }

    /// Advance to `modified` if it is strictly later.
    pub fn observe(&mut self, modified: DateTime<Utc>) {
        if modified > self.0 {
            self.0 = modified;
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for Freshness {
    fn default() -> Self {
        Self::ZERO
    }
}
