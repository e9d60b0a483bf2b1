//! History document store.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use wkstats_types::{History, Snapshot};

use crate::blob::{Blob, FsBlob, MemBlob};
use crate::error::{Error, Result};

/// How many times `update` re-runs its read-modify-write cycle when a
/// concurrent writer commits first.
const MAX_UPDATE_ATTEMPTS: u32 = 3;

/// On-disk envelope for the history document.
///
/// `version` counts committed writes and is the optimistic-concurrency
/// token: a writer persists the version it read at, bumped by one, and
/// aborts if the stored version moved underneath it.
#[derive(Debug, Serialize, Deserialize)]
struct HistoryDocument {
    version: u64,
    snapshots: Vec<Snapshot>,
}

impl HistoryDocument {
    fn into_history(self) -> History {
        History {
            snapshots: self.snapshots,
        }
    }
}

/// Store for the snapshot history, persisted as one JSON document.
///
/// The store exclusively owns the persisted representation: callers
/// mutate history only through [`HistoryStore::update`].
pub struct HistoryStore {
    blob: Box<dyn Blob>,
}

impl HistoryStore {
    /// Open a store backed by a JSON file at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Opening history store at {}", path.as_ref().display());
        Ok(Self {
            blob: Box::new(FsBlob::create(path)?),
        })
    }

    /// Open a store at the default data location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_data_path())
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Self {
        Self::with_blob(Box::new(MemBlob::new()))
    }

    /// Build a store over any blob backend.
    pub fn with_blob(blob: Box<dyn Blob>) -> Self {
        Self { blob }
    }

    /// Read the full history.
    ///
    /// Returns [`Error::NotFound`] when no document has been written
    /// yet and [`Error::Corrupt`] when the stored bytes do not parse.
    pub fn read(&self) -> Result<History> {
        self.read_versioned().map(|(history, _)| history)
    }

    /// Read the history, treating a missing document as empty.
    pub fn read_or_empty(&self) -> Result<History> {
        match self.read() {
            Ok(history) => Ok(history),
            Err(Error::NotFound) => Ok(History::default()),
            Err(e) => Err(e),
        }
    }

    /// Read the history along with its document version.
    ///
    /// The version is `None` only when no document exists, in which
    /// case [`Error::NotFound`] is returned instead.
    pub fn read_versioned(&self) -> Result<(History, Option<u64>)> {
        let doc = self.load_document()?.ok_or(Error::NotFound)?;
        let version = doc.version;
        Ok((doc.into_history(), Some(version)))
    }

    /// Persist a full history, conditional on the document version.
    ///
    /// `expected` must be the version the caller read (or `None` when
    /// no document existed). Returns the committed version. Fails with
    /// [`Error::VersionConflict`] if another writer committed in
    /// between.
    pub fn put_history(&mut self, history: &History, expected: Option<u64>) -> Result<u64> {
        let found = self.load_document()?.map(|d| d.version);
        if found != expected {
            return Err(Error::VersionConflict { expected, found });
        }

        let version = expected.unwrap_or(0) + 1;
        let doc = HistoryDocument {
            version,
            snapshots: history.snapshots.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&doc).map_err(Error::Serialization)?;
        self.blob.put(&bytes)?;

        debug!(
            "Committed history version {} ({} snapshots)",
            version,
            history.len()
        );
        Ok(version)
    }

    /// Upsert a snapshot by date and persist the result.
    ///
    /// Loads the current history (missing document reads as empty),
    /// replaces any existing entry for `snapshot.date`, re-sorts, and
    /// writes the whole document back conditionally on the version it
    /// was read at. A version conflict re-runs the cycle against the
    /// fresh document, so a concurrently committed snapshot for another
    /// date is merged rather than lost.
    ///
    /// Returns the updated history.
    pub fn update(&mut self, snapshot: Snapshot) -> Result<History> {
        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let (mut history, version) = match self.read_versioned() {
                Ok((history, version)) => (history, version),
                Err(Error::NotFound) => (History::default(), None),
                Err(e) => return Err(e),
            };

            history.upsert(snapshot.clone());

            match self.put_history(&history, version) {
                Ok(_) => return Ok(history),
                Err(Error::VersionConflict { expected, found }) => {
                    warn!(
                        "History version moved ({:?} -> {:?}), retrying update (attempt {})",
                        expected, found, attempt
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::Contention {
            attempts: MAX_UPDATE_ATTEMPTS,
        })
    }

    fn load_document(&self) -> Result<Option<HistoryDocument>> {
        match self.blob.get()? {
            Some(bytes) => {
                let doc = serde_json::from_slice(&bytes).map_err(Error::Corrupt)?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use wkstats_types::StageTotals;

    fn snapshot(date: time::Date, apprentice: u32, guru: u32, level: u32) -> Snapshot {
        Snapshot {
            date,
            stages: StageTotals {
                apprentice,
                guru,
                master: 0,
                enlightened: 0,
                burned: 0,
            },
            level,
            recorded_at: date.midnight().assume_utc(),
        }
    }

    #[test]
    fn test_read_missing_document_is_not_found() {
        let store = HistoryStore::open_in_memory();
        assert!(matches!(store.read(), Err(Error::NotFound)));
    }

    #[test]
    fn test_read_or_empty_recovers_missing_document() {
        let store = HistoryStore::open_in_memory();
        let history = store.read_or_empty().unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_update_then_read_roundtrip() {
        let mut store = HistoryStore::open_in_memory();
        let s = snapshot(date!(2024 - 01 - 01), 10, 5, 3);

        store.update(s.clone()).unwrap();

        let history = store.read().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.get(date!(2024 - 01 - 01)), Some(&s));
    }

    #[test]
    fn test_updates_with_distinct_dates_stay_sorted() {
        let mut store = HistoryStore::open_in_memory();
        // Insert out of order on purpose
        store.update(snapshot(date!(2024 - 01 - 03), 3, 0, 1)).unwrap();
        store.update(snapshot(date!(2024 - 01 - 01), 1, 0, 1)).unwrap();
        store.update(snapshot(date!(2024 - 01 - 02), 2, 0, 1)).unwrap();

        let history = store.read().unwrap();
        assert_eq!(history.len(), 3);
        let dates: Vec<_> = history.snapshots.iter().map(|s| s.date).collect();
        assert_eq!(
            dates,
            vec![
                date!(2024 - 01 - 01),
                date!(2024 - 01 - 02),
                date!(2024 - 01 - 03)
            ]
        );
    }

    #[test]
    fn test_same_date_update_overwrites() {
        let mut store = HistoryStore::open_in_memory();
        store.update(snapshot(date!(2024 - 01 - 01), 10, 5, 3)).unwrap();
        store.update(snapshot(date!(2024 - 01 - 01), 12, 6, 3)).unwrap();

        let history = store.read().unwrap();
        assert_eq!(history.len(), 1);
        let entry = history.get(date!(2024 - 01 - 01)).unwrap();
        assert_eq!(entry.stages.apprentice, 12);
        assert_eq!(entry.stages.guru, 6);
    }

    #[test]
    fn test_corrupt_document() {
        let mut blob = MemBlob::new();
        blob.put(b"this is not json").unwrap();

        let store = HistoryStore::with_blob(Box::new(blob));
        assert!(matches!(store.read(), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_version_increments_per_commit() {
        let mut store = HistoryStore::open_in_memory();
        store.update(snapshot(date!(2024 - 01 - 01), 1, 0, 1)).unwrap();
        store.update(snapshot(date!(2024 - 01 - 02), 2, 0, 1)).unwrap();

        let (_, version) = store.read_versioned().unwrap();
        assert_eq!(version, Some(2));
    }

    #[test]
    fn test_stale_put_is_rejected() {
        let blob = MemBlob::new();
        let mut writer_a = HistoryStore::with_blob(Box::new(blob.clone()));
        let mut writer_b = HistoryStore::with_blob(Box::new(blob));

        // A reads the empty store, then B commits first.
        let (mut stale, stale_version) = match writer_a.read_versioned() {
            Err(Error::NotFound) => (History::default(), None),
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        };
        writer_b.update(snapshot(date!(2024 - 01 - 01), 1, 0, 1)).unwrap();

        stale.upsert(snapshot(date!(2024 - 01 - 02), 2, 0, 1));
        let result = writer_a.put_history(&stale, stale_version);
        assert!(matches!(
            result,
            Err(Error::VersionConflict {
                expected: None,
                found: Some(1)
            })
        ));
    }

    #[test]
    fn test_update_merges_with_concurrent_writer() {
        // update() re-reads on each attempt, so a snapshot committed by
        // another writer before our cycle starts is preserved.
        let blob = MemBlob::new();
        let mut writer_a = HistoryStore::with_blob(Box::new(blob.clone()));
        let mut writer_b = HistoryStore::with_blob(Box::new(blob));

        writer_b.update(snapshot(date!(2024 - 01 - 01), 1, 0, 1)).unwrap();
        let history = writer_a.update(snapshot(date!(2024 - 01 - 02), 2, 0, 1)).unwrap();

        assert_eq!(history.len(), 2);
        assert!(history.get(date!(2024 - 01 - 01)).is_some());
        assert!(history.get(date!(2024 - 01 - 02)).is_some());
    }

    #[test]
    fn test_fs_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        {
            let mut store = HistoryStore::open(&path).unwrap();
            store.update(snapshot(date!(2024 - 01 - 01), 10, 5, 3)).unwrap();
        }

        let store = HistoryStore::open(&path).unwrap();
        let history = store.read().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest().unwrap().level, 3);
    }

    #[test]
    fn test_failed_update_leaves_document_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut store = HistoryStore::open(&path).unwrap();
        store.update(snapshot(date!(2024 - 01 - 01), 10, 5, 3)).unwrap();
        let before = std::fs::read(&path).unwrap();

        // Corrupt the file out-of-band; the next update fails at read
        // time and must not touch the stored bytes.
        std::fs::write(&path, b"garbage").unwrap();
        let result = store.update(snapshot(date!(2024 - 01 - 02), 1, 1, 3));
        assert!(matches!(result, Err(Error::Corrupt(_))));
        assert_eq!(std::fs::read(&path).unwrap(), b"garbage");

        // Restore and confirm the original document still parses.
        std::fs::write(&path, &before).unwrap();
        assert_eq!(store.read().unwrap().len(), 1);
    }
}
