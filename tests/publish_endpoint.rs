//! End-to-end tests of `GET /publish/CrConfig` against in-memory sessions.

use chrono::{TimeZone, Utc};
use serde_json::Value;
use std::sync::Arc;

use crconfig_monitor::config::{MonitorConfig, OperationsConfig};
use crconfig_monitor::http::CRCONFIG_PATH;
use crconfig_monitor::session::StaticSession;
use crconfig_monitor::CdnRegister;

mod common;

fn config(cdn_name: &str, managed: &[&str]) -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.operations = OperationsConfig::new(
        cdn_name,
        managed.iter().map(|s| s.to_string()).collect(),
    );
    config
}

fn at(secs: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

#[tokio::test]
async fn test_multi_cdn_envelope_over_http() {
    let session = Arc::new(
        StaticSession::new()
            .with_document("x", r#"{"config":{"domain_name":"x.example.net"}}"#, at(1_000_000_010))
            .with_document("y", r#"{"config":{"domain_name":"y.example.net"}}"#, at(1_000_000_020)),
    );
    let monitor = common::start_monitor(config("x", &["x", "y"]), session).await;

    let res = common::client().get(monitor.url(CRCONFIG_PATH)).send().await.unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.headers()["last-modified"], "Sun, 09 Sep 2001 01:47:00 GMT");
    assert!(res.headers().contains_key("x-request-id"));

    let body: Value = res.json().await.unwrap();
    let entries = body["cdnConfigs"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["cdnName"], "x");
    assert_eq!(entries[0]["crconfig"]["config"]["domain_name"], "x.example.net");
    assert_eq!(entries[1]["cdnName"], "y");
}

#[tokio::test]
async fn test_single_cdn_legacy_body_is_verbatim() {
    let raw = "{\"config\": {\"domain_name\": \"cdn.example.net\"},\n \"stats\": {}}";
    let session = Arc::new(StaticSession::new().with_document("cdn", raw, at(1_000_000_000)));
    let monitor = common::start_monitor(config("cdn", &["cdn"]), session).await;

    let res = common::client().get(monitor.url(CRCONFIG_PATH)).send().await.unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["last-modified"], "Sun, 09 Sep 2001 01:46:40 GMT");
    assert_eq!(res.text().await.unwrap(), raw);
}

#[tokio::test]
async fn test_partial_failure_still_succeeds() {
    let session = Arc::new(
        StaticSession::new()
            .with_document("a", "{}", at(100))
            .with_document("b", "not json", at(300))
            .with_document("d", "{}", at(200)),
    );
    let monitor = common::start_monitor(config("a", &["a", "b", "", "c", "d"]), session.clone()).await;

    let res = common::client().get(monitor.url(CRCONFIG_PATH)).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let register = CdnRegister::from_slice(&res.bytes().await.unwrap()).unwrap();
    assert_eq!(register.managed_cdns().collect::<Vec<_>>(), vec!["a", "d"]);
    assert_eq!(session.fetched(), vec!["a", "b", "c", "d"]);
}

#[tokio::test]
async fn test_total_failure_returns_empty_envelope_without_last_modified() {
    let session = Arc::new(StaticSession::new());
    let monitor = common::start_monitor(config("a", &["a", "b"]), session).await;

    let res = common::client().get(monitor.url(CRCONFIG_PATH)).send().await.unwrap();

    assert_eq!(res.status(), 200);
    assert!(!res.headers().contains_key("last-modified"));
    assert_eq!(res.text().await.unwrap(), r#"{"cdnConfigs":[]}"#);
}

#[tokio::test]
async fn test_not_connected_is_service_unavailable() {
    let session = Arc::new(StaticSession::disconnected());
    let monitor = common::start_monitor(config("a", &["a"]), session).await;

    let res = common::client().get(monitor.url(CRCONFIG_PATH)).send().await.unwrap();

    assert_eq!(res.status(), 503);
    assert_eq!(
        res.text().await.unwrap(),
        "unable to connect to the configuration authority"
    );
}

#[tokio::test]
async fn test_no_cdn_configured_is_server_error() {
    let session = Arc::new(StaticSession::new());
    let monitor = common::start_monitor(config("", &[]), session).await;

    let res = common::client().get(monitor.url(CRCONFIG_PATH)).send().await.unwrap();

    assert_eq!(res.status(), 500);
    assert_eq!(res.text().await.unwrap(), "no CDN configured");
}

#[tokio::test]
async fn test_single_cdn_fetch_failure_is_bad_gateway() {
    let session = Arc::new(StaticSession::new());
    let monitor = common::start_monitor(config("missing", &[]), session).await;

    let res = common::client().get(monitor.url(CRCONFIG_PATH)).send().await.unwrap();

    assert_eq!(res.status(), 502);
}

#[tokio::test]
async fn test_operations_reload_switches_mode() {
    let session = Arc::new(
        StaticSession::new()
            .with_document("a", r#"{"v":"a"}"#, at(1))
            .with_document("b", r#"{"v":"b"}"#, at(2)),
    );
    let monitor = common::start_monitor(config("a", &[]), session).await;
    let client = common::client();

    let legacy = client.get(monitor.url(CRCONFIG_PATH)).send().await.unwrap();
    assert_eq!(legacy.text().await.unwrap(), r#"{"v":"a"}"#);

    monitor.ops.store(OperationsConfig::new("a", vec!["a".into(), "b".into()]));

    let envelope = client.get(monitor.url(CRCONFIG_PATH)).send().await.unwrap();
    assert_eq!(
        envelope.text().await.unwrap(),
        r#"{"cdnConfigs":[{"cdnName":"a","crconfig":{"v":"a"}},{"cdnName":"b","crconfig":{"v":"b"}}]}"#
    );
}

#[tokio::test]
async fn test_repeated_requests_are_identical() {
    let session = Arc::new(
        StaticSession::new()
            .with_document("a", r#"{"k": [1, 2]}"#, at(5))
            .with_document("b", r#"{"k": {}}"#, at(9)),
    );
    let monitor = common::start_monitor(config("a", &["a", "b"]), session).await;
    let client = common::client();

    let first = client.get(monitor.url(CRCONFIG_PATH)).send().await.unwrap();
    let first_modified = first.headers()["last-modified"].clone();
    let first_body = first.bytes().await.unwrap();

    let second = client.get(monitor.url(CRCONFIG_PATH)).send().await.unwrap();
    assert_eq!(second.headers()["last-modified"], first_modified);
    assert_eq!(second.bytes().await.unwrap(), first_body);
}

#[tokio::test]
async fn test_status_endpoint() {
    let session = Arc::new(StaticSession::new());
    let monitor = common::start_monitor(config("a", &["a", "b"]), session).await;

    let res = common::client().get(monitor.url("/status")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["connected"], true);
    assert_eq!(body["cdnName"], "a");
    assert_eq!(body["managedCdns"], serde_json::json!(["a", "b"]));
}
