//! Consumer side of published CRConfigs.
//!
//! # Responsibilities
//! - Accept either the legacy single CRConfig or the `cdnConfigs` envelope
//! - Keep each CDN's CRConfig in envelope order
//! - Map request hostnames to the CDN (and delivery service) serving them
//!
//! # Design Decisions
//! - Each `apply` replaces all previous state
//! - Hostnames and domains compare case-insensitively, trailing dot ignored
//! - Suffix matches prefer the longest domain; unmatched hosts fall back to
//!   the first CDN in the envelope

mod domains;

use serde_json::Value;
use std::collections::HashMap;

use self::domains::{host_matches, normalize_host};

const CDN_CONFIGS_FIELD: &str = "cdnConfigs";
const CDN_NAME_FIELD: &str = "cdnName";
const CRCONFIG_FIELD: &str = "crconfig";
const CONFIG_FIELD: &str = "config";
const DELIVERY_SERVICES_FIELD: &str = "deliveryServices";
const DOMAINS_FIELD: &str = "domains";
const DOMAIN_NAME_FIELD: &str = "domain_name";

/// CDN lookup tables built from a published CRConfig.
#[derive(Debug, Clone, Default)]
pub struct CdnRegister {
    cdn_configs: Vec<(String, Value)>,
    domain_to_cdn: HashMap<String, String>,
    default_config: Option<Value>,
}

impl CdnRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a published body and build a register from it.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        let document: Value = serde_json::from_slice(body)?;
        let mut register = Self::new();
        register.apply(&document);
        Ok(register)
    }

    /// Replace the register's contents with `document`.
    pub fn apply(&mut self, document: &Value) {
        self.cdn_configs.clear();
        self.domain_to_cdn.clear();
        self.default_config = None;

        match document.get(CDN_CONFIGS_FIELD) {
            Some(Value::Array(entries)) => self.apply_envelope(entries),
            Some(_) => {
                tracing::warn!("cdnConfigs is not an array, ignoring document");
            }
            None => {
                self.default_config = document.get(CONFIG_FIELD).cloned();
            }
        }
    }

    fn apply_envelope(&mut self, entries: &[Value]) {
        for entry in entries {
            let Some(cdn_name) = entry.get(CDN_NAME_FIELD).and_then(Value::as_str) else {
                tracing::warn!("cdnConfigs entry without cdnName, skipping");
                continue;
            };
            let crconfig = entry.get(CRCONFIG_FIELD).cloned().unwrap_or(Value::Null);

            self.map_domains(cdn_name, &crconfig);
            if self.default_config.is_none() {
                self.default_config = crconfig.get(CONFIG_FIELD).cloned();
            }
            self.cdn_configs.push((cdn_name.to_string(), crconfig));
        }

        tracing::debug!(
            cdns = self.cdn_configs.len(),
            domains = self.domain_to_cdn.len(),
            "Applied multi-CDN CRConfig"
        );
    }

    fn map_domains(&mut self, cdn_name: &str, crconfig: &Value) {
        let primary = crconfig
            .get(CONFIG_FIELD)
            .and_then(|c| c.get(DOMAIN_NAME_FIELD))
            .and_then(Value::as_str);
        if let Some(domain) = primary {
            self.domain_to_cdn
                .insert(normalize_host(domain), cdn_name.to_string());
        }

        let Some(Value::Object(services)) = crconfig.get(DELIVERY_SERVICES_FIELD) else {
            return;
        };
        for ds in services.values() {
            for domain in ds_domains(ds) {
                self.domain_to_cdn
                    .insert(normalize_host(domain), cdn_name.to_string());
            }
        }
    }

    /// Whether the last applied document was a multi-CDN envelope with entries.
    pub fn is_multi_cdn(&self) -> bool {
        !self.cdn_configs.is_empty()
    }

    /// CDN names in envelope order.
    pub fn managed_cdns(&self) -> impl Iterator<Item = &str> {
        self.cdn_configs.iter().map(|(name, _)| name.as_str())
    }

    pub fn crconfig_for(&self, cdn_name: &str) -> Option<&Value> {
        self.cdn_configs
            .iter()
            .find(|(name, _)| name == cdn_name)
            .map(|(_, crconfig)| crconfig)
    }

    /// The `config` section used when no CDN is selected.
    pub fn default_config(&self) -> Option<&Value> {
        self.default_config.as_ref()
    }

    /// Pick the CDN serving `host`.
    ///
    /// Returns `None` outside multi-CDN mode.
    pub fn cdn_for_host(&self, host: &str) -> Option<&str> {
        if !self.is_multi_cdn() {
            return None;
        }
        let host = normalize_host(host);

        if let Some(cdn) = self.domain_to_cdn.get(&host) {
            return Some(cdn.as_str());
        }

        let suffix_match = self
            .domain_to_cdn
            .iter()
            .filter(|(domain, _)| host_matches(&host, domain))
            .max_by_key(|(domain, _)| domain.len())
            .map(|(_, cdn)| cdn.as_str());
        if suffix_match.is_some() {
            return suffix_match;
        }

        self.managed_cdns().next()
    }

    /// Id of the first delivery service of `cdn_name`, in document order,
    /// whose domains match `host`.
    pub fn delivery_service_for_host(&self, cdn_name: &str, host: &str) -> Option<&str> {
        let host = normalize_host(host);
        let Some(Value::Object(services)) = self.crconfig_for(cdn_name)?.get(DELIVERY_SERVICES_FIELD) else {
            return None;
        };

        services
            .iter()
            .find(|(_, ds)| ds_domains(ds).any(|d| host_matches(&host, &normalize_host(d))))
            .map(|(id, _)| id.as_str())
    }
}

fn ds_domains(ds: &Value) -> impl Iterator<Item = &str> {
    ds.get(DOMAINS_FIELD)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}
