//! Config file watcher.
//!
//! Only proxy rules are applied live. Route or base-path edits still reach the
//! server (which warns that a restart is needed), but a save that leaves the
//! file's effective configuration unchanged is dropped here.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::{DevServerConfig, ProxyRuleConfig, RouteConfig};

/// Polling interval for backends that cannot deliver native events.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Watches one configuration file and publishes validated reloads.
pub struct ConfigWatcher {
    path: PathBuf,
    updates: mpsc::UnboundedSender<DevServerConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end of its reload channel.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<DevServerConfig>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            updates,
        };
        (watcher, rx)
    }

    /// Start watching. Dropping the returned handle stops the watch.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, updates } = self;
        let file_name = path.file_name().map(ToOwned::to_owned);
        let last = Mutex::new(load_config(&path).ok().map(Fingerprint::of));
        let watched = path.clone();

        let handler = move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!(error = %e, "Config watch error");
                    return;
                }
            };
            if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                return;
            }
            if !event.paths.iter().any(|p| p.file_name() == file_name.as_deref()) {
                return;
            }

            let config = match load_config(&watched) {
                Ok(config) => config,
                Err(e) => {
                    tracing::error!(path = %watched.display(), error = %e, "Config reload rejected, keeping current proxy rules");
                    return;
                }
            };

            let fingerprint = Fingerprint::of(config.clone());
            let mut last = last.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if last.as_ref() == Some(&fingerprint) {
                tracing::debug!(path = %watched.display(), "Config saved without changes");
                return;
            }
            *last = Some(fingerprint);

            tracing::info!(path = %watched.display(), rules = config.proxy.len(), "Config reloaded");
            metrics::counter!("devserver_config_reloads_total").increment(1);
            if updates.send(config).is_err() {
                tracing::debug!("Reload receiver gone, dropping config update");
            }
        };

        let mut watcher = RecommendedWatcher::new(handler, Config::default().with_poll_interval(POLL_INTERVAL))?;
        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), "Watching config for proxy rule changes");
        Ok(watcher)
    }
}

/// The parts of a configuration a running server reacts to.
#[derive(Debug, PartialEq)]
struct Fingerprint {
    base_path: String,
    proxy: Vec<ProxyRuleConfig>,
    routes: Vec<RouteConfig>,
}

impl Fingerprint {
    fn of(config: DevServerConfig) -> Self {
        Self {
            base_path: config.base_path,
            proxy: config.proxy,
            routes: config.routes,
        }
    }
}
