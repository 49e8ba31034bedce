//! Request handlers.

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Instant;

use crate::crconfig::{serve_crconfig, CrConfigError, Freshness};
use crate::http::date::format_http_date;
use crate::http::server::AppState;
use crate::observability::metrics;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    pub version: &'static str,
    pub connected: bool,
    pub cdn_name: String,
    pub managed_cdns: Vec<String>,
}

/// `GET /publish/CrConfig`
pub async fn get_crconfig(State(state): State<AppState>) -> Response {
    let start_time = Instant::now();
    let ops = state.ops.current();

    match serve_crconfig(&ops, state.session.as_ref()).await {
        Ok(published) => {
            metrics::record_publish(published.mode.as_str(), StatusCode::OK.as_u16(), start_time);

            let freshness = Freshness::at(published.last_modified);
            let mut response = (StatusCode::OK, published.body).into_response();
            let headers = response.headers_mut();
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            if !freshness.is_zero() {
                if let Ok(value) = HeaderValue::from_str(&format_http_date(freshness.timestamp())) {
                    headers.insert(header::LAST_MODIFIED, value);
                }
            }
            response
        }
        Err(e) => {
            let status = status_for(&e);
            tracing::error!(error = %e, status = status.as_u16(), "Failed to serve CRConfig");
            metrics::record_publish("error", status.as_u16(), start_time);
            (status, e.to_string()).into_response()
        }
    }
}

/// `GET /status`
pub async fn get_status(State(state): State<AppState>) -> Json<MonitorStatus> {
    let ops = state.ops.current();
    Json(MonitorStatus {
        version: env!("CARGO_PKG_VERSION"),
        connected: state.session.is_connected(),
        cdn_name: ops.cdn_name.clone(),
        managed_cdns: ops.managed_cdns.clone(),
    })
}

fn status_for(error: &CrConfigError) -> StatusCode {
    match error {
        CrConfigError::NotConnected => StatusCode::SERVICE_UNAVAILABLE,
        CrConfigError::Fetch { .. } => StatusCode::BAD_GATEWAY,
        CrConfigError::NoCdnConfigured | CrConfigError::Serialization(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
