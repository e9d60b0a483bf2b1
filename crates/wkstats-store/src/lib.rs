//! Durable storage for the WaniKani snapshot history.
//!
//! The entire history lives in one logical JSON document: an ordered
//! sequence of daily snapshots plus a write-version counter used for
//! conditional writes. [`HistoryStore`] owns all reads and writes of
//! that document; blob backends ([`FsBlob`] on disk, [`MemBlob`] for
//! tests) only move opaque bytes.
//!
//! # Example
//!
//! ```no_run
//! use wkstats_store::HistoryStore;
//!
//! let store = HistoryStore::open_default()?;
//! let history = store.read_or_empty()?;
//! println!("{} days recorded", history.len());
//! # Ok::<(), wkstats_store::Error>(())
//! ```

mod blob;
mod error;
mod store;

pub use blob::{Blob, FsBlob, MemBlob};
pub use error::{Error, Result};
pub use store::HistoryStore;

/// Default history document path following platform conventions.
///
/// - Linux: `~/.local/share/wkstats/history.json`
/// - macOS: `~/Library/Application Support/wkstats/history.json`
/// - Windows: `C:\Users\<user>\AppData\Local\wkstats\history.json`
pub fn default_data_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("wkstats")
        .join("history.json")
}
