//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Apply operations config reloads to the shared snapshot
//! - Stop on the lifecycle shutdown broadcast

use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{MonitorConfig, OpsConfigHandle};
use crate::http::handlers::{get_crconfig, get_status};
use crate::lifecycle::Shutdown;
use crate::session::ConfigAuthoritySession;

/// Path the CRConfig is published under.
pub const CRCONFIG_PATH: &str = "/publish/CrConfig";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub ops: OpsConfigHandle,
    pub session: Arc<dyn ConfigAuthoritySession>,
}

/// HTTP server publishing the CRConfig.
pub struct HttpServer {
    router: Router,
    config: MonitorConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and session.
    pub fn new(config: MonitorConfig, session: Arc<dyn ConfigAuthoritySession>) -> Self {
        let state = AppState {
            ops: OpsConfigHandle::new(config.operations.clone()),
            session,
        };

        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            config,
            state,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &MonitorConfig, state: AppState) -> Router {
        Router::new()
            .route(CRCONFIG_PATH, get(get_crconfig))
            .route("/status", get(get_status))
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<MonitorConfig>,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            cdn_name = %self.config.operations.cdn_name,
            managed_cdns = ?self.config.operations.managed_cdns,
            "HTTP server starting"
        );

        let ops = self.state.ops.clone();
        let reload_task = tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                apply_reload(&ops, new_config);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reload_task.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Router with state attached, for serving without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle to the operations snapshot the handlers read.
    pub fn ops(&self) -> OpsConfigHandle {
        self.state.ops.clone()
    }
}

fn apply_reload(ops: &OpsConfigHandle, new_config: MonitorConfig) {
    let current = ops.current();
    if *current == new_config.operations {
        tracing::debug!("Config reloaded, operations unchanged");
        return;
    }

    tracing::info!(
        cdn_name = %new_config.operations.cdn_name,
        managed_cdns = ?new_config.operations.managed_cdns,
        "Applying reloaded operations config"
    );
    ops.store(new_config.operations);
}
