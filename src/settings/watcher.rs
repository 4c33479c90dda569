//! Settings file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::settings::store::FileSettings;

/// Watches the settings file and reloads the store when it changes.
///
/// The external settings editor rewrites the file in place; in-flight
/// requests keep the snapshot they already loaded and the next request sees
/// the new values.
pub struct SettingsWatcher {
    path: PathBuf,
    store: Arc<FileSettings>,
}

impl SettingsWatcher {
    /// Create a new SettingsWatcher for the given file and store.
    pub fn new(path: &Path, store: Arc<FileSettings>) -> Self {
        Self {
            path: path.to_path_buf(),
            store,
        }
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for watching to continue.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let store = self.store.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Settings file change detected, reloading...");
                        store.reload();
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Settings watcher started");
        Ok(watcher)
    }
}
