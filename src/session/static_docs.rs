//! Sessions backed by local documents instead of a live authority.
//!
//! `StaticSession` holds documents in memory and records every fetch it
//! serves. `DirectorySession` reads `<dir>/<cdn>.json` on each fetch and
//! uses the file's mtime as the modification time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::session::{ConfigAuthoritySession, ConfigDocument, SessionError};

/// In-memory session with per-CDN documents.
#[derive(Debug, Default)]
pub struct StaticSession {
    connected: AtomicBool,
    documents: DashMap<String, ConfigDocument>,
    fetch_log: Mutex<Vec<String>>,
}

impl StaticSession {
    /// Create a connected session with no documents.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            ..Default::default()
        }
    }

    /// Create a session that reports itself as not connected.
    pub fn disconnected() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_document(
        self,
        cdn_name: &str,
        payload: impl Into<Vec<u8>>,
        modified: DateTime<Utc>,
    ) -> Self {
        self.insert(cdn_name, ConfigDocument::new(payload, modified));
        self
    }

    /// Insert or replace the document served for `cdn_name`.
    pub fn insert(&self, cdn_name: &str, document: ConfigDocument) {
        self.documents.insert(cdn_name.to_string(), document);
    }

    /// Remove the document for `cdn_name`; later fetches fail with `NotFound`.
    pub fn remove(&self, cdn_name: &str) -> Option<ConfigDocument> {
        self.documents.remove(cdn_name).map(|(_, doc)| doc)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// CDN names fetched so far, in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetch_log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ConfigAuthoritySession for StaticSession {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn fetch_latest_config(&self, cdn_name: &str) -> Result<ConfigDocument, SessionError> {
        self.fetch_log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(cdn_name.to_string());

        self.documents
            .get(cdn_name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SessionError::NotFound(cdn_name.to_string()))
    }
}

/// Session reading CRConfig files from a directory.
#[derive(Debug, Clone)]
pub struct DirectorySession {
    dir: PathBuf,
}

impl DirectorySession {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document_path(&self, cdn_name: &str) -> Option<PathBuf> {
        let valid = !cdn_name.is_empty()
            && cdn_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && !cdn_name.starts_with('.');
        valid.then(|| self.dir.join(format!("{cdn_name}.json")))
    }
}

#[async_trait]
impl ConfigAuthoritySession for DirectorySession {
    fn is_connected(&self) -> bool {
        self.dir.is_dir()
    }

    async fn fetch_latest_config(&self, cdn_name: &str) -> Result<ConfigDocument, SessionError> {
        let path = self
            .document_path(cdn_name)
            .ok_or_else(|| SessionError::NotFound(cdn_name.to_string()))?;

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SessionError::NotFound(cdn_name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let payload = tokio::fs::read(&path).await?;
        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        tracing::debug!(cdn = %cdn_name, path = ?path, bytes = payload.len(), "Loaded CRConfig from file");
        Ok(ConfigDocument { payload, modified })
    }
}
