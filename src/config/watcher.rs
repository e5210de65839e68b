//! Config file hot-reload
//!
//! Edits to the config file arrive as loaded-and-validated configs on an
//! internal channel. The REPL polls between commands and swaps in a fresh
//! engine, which is what resets keytimes and booleans on reload.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::AppConfig;

/// Delay between a modify event and the reload, so editors that write in
/// several syscalls are read once, complete
const SETTLE: Duration = Duration::from_millis(100);

/// Watches one config file and queues reloaded configs
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<AppConfig>,
}

impl ConfigWatcher {
    /// Start watching `path`. Fails if the file does not exist; the
    /// caller owns the initial load.
    pub fn watch(path: &str) -> Result<Self> {
        let (tx, rx) = mpsc::channel(4);
        let reload_path = path.to_string();
        // notify calls back on its own thread; reloading needs the
        // runtime, so take a handle while still on it
        let handle = tokio::runtime::Handle::current();

        let mut watcher =
            notify::recommended_watcher(move |event: Result<Event, notify::Error>| {
                let event = match event {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("Config watch error: {}", e);
                        return;
                    }
                };
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    return;
                }
                debug!("Config file changed: {:?}", event.paths);

                let path = reload_path.clone();
                let tx = tx.clone();
                handle.spawn(async move {
                    tokio::time::sleep(SETTLE).await;
                    match AppConfig::load(&path).await {
                        Ok(config) => {
                            // A full queue already holds pending reloads
                            // and poll() keeps only the newest
                            let _ = tx.try_send(config);
                        }
                        Err(e) => {
                            warn!("Config reload failed, keeping current config: {}", e);
                        }
                    }
                });
            })?;

        watcher
            .watch(Path::new(path), RecursiveMode::NonRecursive)
            .with_context(|| format!("cannot watch config file {}", path))?;
        debug!("Watching {} for edits", path);

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Drain pending reloads, keeping only the newest.
    ///
    /// A burst of editor writes collapses into a single engine swap, so
    /// runtime state resets once per edit session, not once per write.
    pub fn poll(&mut self) -> Option<AppConfig> {
        let mut latest = None;
        while let Ok(config) = self.rx.try_recv() {
            latest = Some(config);
        }
        latest
    }
}
