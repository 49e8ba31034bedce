//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crconfig_monitor::config::MonitorConfig;
use crconfig_monitor::http::HttpServer;
use crconfig_monitor::lifecycle::Shutdown;
use crconfig_monitor::ConfigAuthoritySession;

/// Canned response of the mock Traffic Ops.
#[derive(Clone, Debug)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl MockResponse {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: body.into(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// A request seen by the mock.
#[derive(Clone, Debug)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub cookie: Option<String>,
}

/// Mock Traffic Ops keyed by `"METHOD /path"`.
#[derive(Clone, Default)]
pub struct MockTrafficOps {
    routes: Arc<Mutex<HashMap<String, MockResponse>>>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl MockTrafficOps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept logins and hand out `mojolicious=test-session`.
    pub fn with_login(self) -> Self {
        self.route(
            "POST",
            "/api/4.0/user/login",
            MockResponse::json(200, r#"{"alerts":[{"level":"success","text":"Successfully logged in."}]}"#)
                .header("Set-Cookie", "mojolicious=test-session; Path=/; HttpOnly"),
        )
    }

    /// Serve `crconfig` as the snapshot of `cdn`.
    pub fn with_snapshot(self, cdn: &str, crconfig: &str, last_modified: &str) -> Self {
        self.route(
            "GET",
            &format!("/api/4.0/cdns/{}/snapshot", cdn),
            MockResponse::json(200, format!(r#"{{"response":{}}}"#, crconfig))
                .header("Last-Modified", last_modified),
        )
    }

    pub fn route(self, method: &str, path: &str, response: MockResponse) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(format!("{} {}", method, path), response);
        self
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    /// Bind on an ephemeral port and serve until the test ends.
    pub async fn start(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mock = self.clone();

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => {
                        let mock = mock.clone();
                        tokio::spawn(async move {
                            mock.handle(socket).await;
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        addr
    }

    async fn handle(&self, mut socket: TcpStream) {
        let Some((method, path, headers)) = read_request(&mut socket).await else {
            return;
        };
        self.seen.lock().unwrap().push(SeenRequest {
            method: method.clone(),
            path: path.clone(),
            cookie: headers.get("cookie").cloned(),
        });

        let response = self
            .routes
            .lock()
            .unwrap()
            .get(&format!("{} {}", method, path))
            .cloned()
            .unwrap_or_else(|| MockResponse::json(404, r#"{"alerts":[]}"#));

        let mut out = format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
            response.status,
            reason(response.status),
            response.body.len()
        );
        for (name, value) in &response.headers {
            out.push_str(&format!("{}: {}\r\n", name, value));
        }
        out.push_str("\r\n");
        out.push_str(&response.body);

        let _ = socket.write_all(out.as_bytes()).await;
        let _ = socket.shutdown().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

async fn read_request(socket: &mut TcpStream) -> Option<(String, String, HashMap<String, String>)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let headers: HashMap<String, String> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut body_read = buf.len() - (header_end + 4);
    while body_read < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body_read += n;
    }

    Some((method, path, headers))
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// A monitor served on an ephemeral port.
pub struct RunningMonitor {
    pub base_url: String,
    pub ops: crconfig_monitor::OpsConfigHandle,
    pub shutdown: Shutdown,
}

impl RunningMonitor {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for RunningMonitor {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start an `HttpServer` for `config` and `session`.
pub async fn start_monitor(
    config: MonitorConfig,
    session: Arc<dyn ConfigAuthoritySession>,
) -> RunningMonitor {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, session);
    let ops = server.ops();
    let (_tx, config_updates) = tokio::sync::mpsc::unbounded_channel();
    let server_shutdown = shutdown.clone();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    RunningMonitor {
        base_url: format!("http://{}", addr),
        ops,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
