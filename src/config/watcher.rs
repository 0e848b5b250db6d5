//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};

use crate::config::loader::load_config;
use crate::config::schema::GateConfig;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GateConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GateConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading...");
                        match load_config(&path) {
                            Ok(new_config) => {
                                let _ = tx.send(new_config);
                            }
                            Err(e) => {
                                tracing::error!("Failed to reload config: {}. Keeping current configuration.", e);
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Swap each received config into `current` until shutdown.
///
/// Rate-limit rules and the ops API key follow the new config. The base origin
/// and listeners are fixed at startup.
pub async fn apply_updates(
    current: Arc<ArcSwap<GateConfig>>,
    mut updates: mpsc::UnboundedReceiver<GateConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(new_config) = update else { break };
                apply(&current, new_config);
            }
            _ = shutdown.recv() => break,
        }
    }
    tracing::debug!("Config reload loop stopped");
}

fn apply(current: &ArcSwap<GateConfig>, new_config: GateConfig) {
    let old = current.load();
    if old.app.base_url != new_config.app.base_url {
        tracing::warn!(
            old = %old.app.base_url,
            new = %new_config.app.base_url,
            "app.base_url changes require a restart; base origin unchanged"
        );
    }
    if old.listener.bind_address != new_config.listener.bind_address {
        tracing::warn!("listener.bind_address changes require a restart");
    }
    tracing::info!(
        rate_limit_enabled = new_config.rate_limit.enabled,
        auth_limit = new_config.rate_limit.auth.limit,
        mutation_limit = new_config.rate_limit.mutation.limit,
        "Configuration reloaded"
    );
    current.store(Arc::new(new_config));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn updates_are_swapped_in() {
        let current = Arc::new(ArcSwap::from_pointee(GateConfig::default()));
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = tokio::spawn(apply_updates(current.clone(), rx, shutdown_rx));

        let mut next = GateConfig::default();
        next.rate_limit.auth.limit = 2;
        tx.send(next).unwrap();
        drop(tx);
        task.await.unwrap();
        drop(shutdown_tx);

        assert_eq!(current.load().rate_limit.auth.limit, 2);
    }
}
