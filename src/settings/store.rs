//! Key/value settings storage.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use thiserror::Error;

/// The newline-separated CORS allow-list edited by the user.
pub const CORS_HOSTS_KEY: &str = "cors_host";

/// Read-only view of the user-editable settings.
///
/// Implementations must be cheap to read from concurrent requests.
pub trait SettingsStore: Send + Sync {
    /// Look up a raw string value.
    fn get(&self, key: &str) -> Option<String>;

    /// Look up a value, falling back to a default.
    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }
}

/// Error type for reading the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings backed by a TOML file of string keys.
///
/// The parsed map sits behind an `ArcSwap` so each request reads one
/// consistent snapshot without locking. The file itself is rewritten by an
/// external settings editor; `SettingsWatcher` calls [`FileSettings::reload`]
/// when that happens.
pub struct FileSettings {
    path: PathBuf,
    values: ArcSwap<HashMap<String, String>>,
}

impl FileSettings {
    /// Load settings from `path`.
    ///
    /// A missing or unreadable file is not an error; the store starts empty
    /// and fills in on the first successful reload.
    pub fn load(path: &Path) -> Self {
        let values = match read_settings(path) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Settings unavailable, starting empty");
                HashMap::new()
            }
        };
        Self {
            path: path.to_path_buf(),
            values: ArcSwap::from_pointee(values),
        }
    }

    /// Re-read the file, keeping the current snapshot if that fails.
    pub fn reload(&self) {
        match read_settings(&self.path) {
            Ok(map) => {
                self.values.store(Arc::new(map));
                tracing::info!(path = ?self.path, "Settings reloaded");
            }
            Err(e) => {
                tracing::error!(
                    path = ?self.path,
                    error = %e,
                    "Failed to reload settings, keeping current values"
                );
            }
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.load().get(key).cloned()
    }
}

fn read_settings(path: &Path) -> Result<HashMap<String, String>, SettingsError> {
    let content = std::fs::read_to_string(path)?;
    let table: toml::Table = toml::from_str(&content)?;
    // Non-string values are not settings; skip them.
    Ok(table
        .into_iter()
        .filter_map(|(key, value)| match value {
            toml::Value::String(s) => Some((key, s)),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_and_get() {
        let path = temp_file(
            "ankibridge-settings-load.toml",
            "cors_host = \"http://localhost\"\n",
        );
        let settings = FileSettings::load(&path);
        assert_eq!(
            settings.get(CORS_HOSTS_KEY),
            Some("http://localhost".to_string())
        );
        assert_eq!(settings.get("missing"), None);
        assert_eq!(settings.get_or("missing", ""), "");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let settings = FileSettings::load(Path::new("/nonexistent/settings.toml"));
        assert_eq!(settings.get(CORS_HOSTS_KEY), None);
    }

    #[test]
    fn test_reload_picks_up_new_values() {
        let path = temp_file("ankibridge-settings-reload.toml", "cors_host = \"*\"\n");
        let settings = FileSettings::load(&path);
        assert_eq!(settings.get(CORS_HOSTS_KEY), Some("*".to_string()));

        std::fs::write(&path, "cors_host = \"http://a.com\"\n").unwrap();
        settings.reload();
        assert_eq!(
            settings.get(CORS_HOSTS_KEY),
            Some("http://a.com".to_string())
        );
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_failed_reload_keeps_current_snapshot() {
        let path = temp_file("ankibridge-settings-bad.toml", "cors_host = \"*\"\n");
        let settings = FileSettings::load(&path);

        std::fs::write(&path, "cors_host = not toml at all [").unwrap();
        settings.reload();
        assert_eq!(settings.get(CORS_HOSTS_KEY), Some("*".to_string()));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_non_string_values_are_skipped() {
        let path = temp_file(
            "ankibridge-settings-types.toml",
            "cors_host = \"*\"\nport = 8765\n",
        );
        let settings = FileSettings::load(&path);
        assert_eq!(settings.get("port"), None);
        assert_eq!(settings.get(CORS_HOSTS_KEY), Some("*".to_string()));
        std::fs::remove_file(&path).ok();
    }
}
