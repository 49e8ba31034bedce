//! CRConfig request dispatch.
//!
//! Chooses between the legacy single-CDN document and the multi-CDN
//! envelope based on the operations configuration snapshot.

use crate::config::OperationsConfig;
use crate::crconfig::aggregator::aggregate;
use crate::crconfig::error::{CrConfigError, CrConfigResult};
use crate::crconfig::{is_blank, PublishMode, PublishedCrConfig};
use crate::session::ConfigAuthoritySession;

/// Produce the CRConfig to publish for `ops`.
///
/// With more than one managed CDN the result is the envelope built by
/// [`aggregate`]. Otherwise the primary CDN's document is returned exactly as
/// the session produced it, with its own modification time.
pub async fn serve_crconfig<S>(ops: &OperationsConfig, session: &S) -> CrConfigResult<PublishedCrConfig>
where
    S: ConfigAuthoritySession + ?Sized,
{
    if !session.is_connected() {
        return Err(CrConfigError::NotConnected);
    }
    if is_blank(&ops.cdn_name) {
        return Err(CrConfigError::NoCdnConfigured);
    }

    if ops.is_multi_cdn() {
        return aggregate(ops, session).await;
    }

    let document = session
        .fetch_latest_config(&ops.cdn_name)
        .await
        .map_err(|source| CrConfigError::Fetch {
            cdn: ops.cdn_name.clone(),
            source,
        })?;

    Ok(PublishedCrConfig {
        body: document.payload,
        last_modified: document.modified,
        mode: PublishMode::Single,
    })
}
