//! User-editable settings store.
//!
//! # Data Flow
//! ```text
//! settings file (TOML, string keys)
//!     → store.rs (parse into a string map)
//!     → ArcSwap snapshot shared with request handlers
//!
//! On external edit:
//!     watcher.rs detects change
//!     → store.reload()
//!     → atomic swap of the snapshot
//!     → next request reads the new values
//! ```
//!
//! # Design Decisions
//! - Requests only read; the file is mutated by an external settings editor
//! - Each read takes one consistent snapshot, no lock; a request racing an
//!   edit simply sees the old values and self-corrects on the next request
//! - A reload that fails to parse keeps the previous snapshot

pub mod store;
pub mod watcher;

pub use store::{FileSettings, SettingsStore, CORS_HOSTS_KEY};
pub use watcher::SettingsWatcher;
