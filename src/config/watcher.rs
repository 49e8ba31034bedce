//! Hot reload of the configuration file.
//!
//! Each change event re-reads the file and compares it with the last
//! configuration this watcher accepted. Unchanged files are dropped, sections
//! that only take effect at startup are reported, and the new config is sent
//! on to the server, which applies the `operations` section.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::MonitorConfig;

/// Field-level differences between two configurations.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ConfigChanges {
    /// Changed `operations` fields, applied live.
    pub operations: Vec<&'static str>,
    /// Changed sections that only take effect after a restart.
    pub restart_required: Vec<&'static str>,
}

impl ConfigChanges {
    pub fn between(old: &MonitorConfig, new: &MonitorConfig) -> Self {
        let mut changes = Self::default();

        if old.operations.cdn_name != new.operations.cdn_name {
            changes.operations.push("cdn_name");
        }
        if old.operations.managed_cdns != new.operations.managed_cdns {
            changes.operations.push("managed_cdns");
        }

        if old.listener != new.listener {
            changes.restart_required.push("listener");
        }
        if old.authority != new.authority {
            changes.restart_required.push("authority");
        }
        if old.timeouts != new.timeouts {
            changes.restart_required.push("timeouts");
        }
        if old.observability != new.observability {
            changes.restart_required.push("observability");
        }

        changes
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty() && self.restart_required.is_empty()
    }
}

/// Watches the configuration file and forwards changed configs.
pub struct ConfigWatcher {
    path: PathBuf,
    current: MonitorConfig,
    update_tx: mpsc::UnboundedSender<MonitorConfig>,
}

impl ConfigWatcher {
    /// `current` is the configuration the process started with.
    pub fn new(
        path: &Path,
        current: MonitorConfig,
    ) -> (Self, mpsc::UnboundedReceiver<MonitorConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            current,
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            mut current,
            update_tx,
        } = self;
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    match load_config(&path) {
                        Ok(new_config) => {
                            if forward_if_changed(&mut current, new_config, &update_tx) {
                                tracing::info!(path = ?path, "Configuration reloaded");
                            }
                        }
                        Err(e) => tracing::error!(
                            path = ?path,
                            error = %e,
                            "Reload rejected, keeping current configuration"
                        ),
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&watched, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?watched, "Config watcher started");
        Ok(watcher)
    }
}

/// Send `new_config` if it differs from `current`, then make it current.
fn forward_if_changed(
    current: &mut MonitorConfig,
    new_config: MonitorConfig,
    tx: &mpsc::UnboundedSender<MonitorConfig>,
) -> bool {
    let changes = ConfigChanges::between(current, &new_config);
    if changes.is_empty() {
        tracing::debug!("Config file touched without changes");
        return false;
    }

    if !changes.operations.is_empty() {
        tracing::info!(
            fields = ?changes.operations,
            cdn_name = %new_config.operations.cdn_name,
            managed_cdns = ?new_config.operations.managed_cdns,
            "Operations config changed"
        );
    }
    if !changes.restart_required.is_empty() {
        tracing::warn!(
            sections = ?changes.restart_required,
            "Changed sections take effect after a restart"
        );
    }

    *current = new_config.clone();
    tx.send(new_config).is_ok()
}
