//! Multi-CDN CRConfig aggregation.
//!
//! # Responsibilities
//! - Fetch each managed CDN's CRConfig, one at a time, in configured order
//! - Leave out CDNs that fail to fetch or parse, logging why
//! - Track the latest modification time across fetched documents
//! - Serialize the combined envelope
//!
//! A document that fetches but fails to parse has already advanced the
//! freshness marker; that update is kept.

use serde_json::value::RawValue;

use crate::config::OperationsConfig;
use crate::crconfig::envelope::{Envelope, Freshness};
use crate::crconfig::error::CrConfigResult;
use crate::crconfig::{is_blank, PublishMode, PublishedCrConfig};
use crate::observability::metrics;
use crate::session::ConfigAuthoritySession;

/// Build the multi-CDN envelope for every managed CDN.
///
/// Only serialization of the final envelope can fail; unreachable or
/// malformed CDNs are omitted.
pub async fn aggregate<S>(ops: &OperationsConfig, session: &S) -> CrConfigResult<PublishedCrConfig>
where
    S: ConfigAuthoritySession + ?Sized,
{
    let mut envelope = Envelope::default();
    let mut freshness = Freshness::default();

    for cdn_name in &ops.managed_cdns {
        if is_blank(cdn_name) {
            continue;
        }

        let document = match session.fetch_latest_config(cdn_name).await {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(cdn = %cdn_name, error = %e, "Error getting CRConfig, omitting CDN");
                metrics::record_cdn_failure(cdn_name, "fetch");
                continue;
            }
        };

        freshness.observe(document.modified);

        let crconfig: Box<RawValue> = match serde_json::from_slice(&document.payload) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(cdn = %cdn_name, error = %e, "Error parsing CRConfig, omitting CDN");
                metrics::record_cdn_failure(cdn_name, "parse");
                continue;
            }
        };

        envelope.push(cdn_name.as_str(), crconfig);
    }

    let body = envelope.to_vec()?;

    tracing::debug!(
        requested = ops.managed_cdns.len(),
        included = envelope.len(),
        last_modified = %freshness.timestamp(),
        "Aggregated multi-CDN CRConfig"
    );
    metrics::record_envelope_size(envelope.len());

    Ok(PublishedCrConfig {
        body,
        last_modified: freshness.timestamp(),
        mode: PublishMode::Multi,
    })
}
