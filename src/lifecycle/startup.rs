//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the configuration authority session named by the config
//! - Start the session keeper for Traffic Ops
//!
//! # Design Decisions
//! - A Traffic Ops login failure is not fatal; requests report
//!   "not connected" until the keeper succeeds

use std::sync::Arc;
use std::time::Duration;

use crate::config::{AuthorityKind, MonitorConfig};
use crate::lifecycle::Shutdown;
use crate::session::{ConfigAuthoritySession, DirectorySession, SessionError, TrafficOpsSession};

/// Create the session described by `config.authority`.
///
/// For Traffic Ops this spawns the keeper task, so it must run inside a
/// Tokio runtime.
pub fn build_session(
    config: &MonitorConfig,
    shutdown: &Shutdown,
) -> Result<Arc<dyn ConfigAuthoritySession>, SessionError> {
    match config.authority.kind {
        AuthorityKind::TrafficOps => {
            let session = Arc::new(TrafficOpsSession::new(
                &config.authority,
                Duration::from_secs(config.timeouts.authority_secs),
            )?);

            let keeper = session.clone();
            let interval = Duration::from_secs(config.authority.reconnect_interval_secs);
            let shutdown_rx = shutdown.subscribe();
            tokio::spawn(async move {
                keeper.run(interval, shutdown_rx).await;
            });

            tracing::info!(url = %config.authority.url, "Using Traffic Ops configuration authority");
            Ok(session)
        }
        AuthorityKind::Directory => {
            let dir = config
                .authority
                .directory
                .clone()
                .ok_or_else(|| SessionError::Malformed("authority.directory is not set".to_string()))?;
            let session = DirectorySession::new(dir);
            if !session.is_connected() {
                tracing::warn!(dir = ?session.dir(), "CRConfig directory does not exist yet");
            }

            tracing::info!(dir = ?session.dir(), "Using directory configuration authority");
            Ok(Arc::new(session))
        }
    }
}
