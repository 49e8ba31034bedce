//! Errors surfaced by CRConfig publication.

use thiserror::Error;

use crate::session::SessionError;

/// Fatal errors of a CRConfig request.
///
/// Per-CDN failures while aggregating are not represented here; they are
/// logged and the CDN is left out of the envelope.
#[derive(Debug, Error)]
pub enum CrConfigError {
    /// The configuration authority session is not initialized.
    #[error("unable to connect to the configuration authority")]
    NotConnected,

    /// The primary CDN name is empty.
    #[error("no CDN configured")]
    NoCdnConfigured,

    /// Fetching the single (legacy) CRConfig failed.
    #[error("fetching CRConfig for CDN '{cdn}': {source}")]
    Fetch {
        cdn: String,
        #[source]
        source: SessionError,
    },

    /// The multi-CDN envelope could not be serialized.
    #[error("serializing multi-CDN CRConfig envelope: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type CrConfigResult<T> = Result<T, CrConfigError>;
