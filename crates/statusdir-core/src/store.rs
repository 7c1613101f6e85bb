//! The directory store: the authoritative URL→Entry map.
//!
//! The store is written exclusively by the rebuild pipeline's merge step and
//! read concurrently by the serving layer. All mutation happens under a write
//! lock held for the whole merge, so readers always see a complete,
//! internally consistent snapshot.
//!
//! Persistence is a single JSON object mapping URL to [`Entry`], written
//! atomically (temp file + rename) after each successful cycle and read once
//! at startup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use metrics::gauge;
use parking_lot::RwLock;

use crate::{Entry, Error, Result};

/// The authoritative in-memory directory with file persistence.
pub struct DirectoryStore {
    directory: RwLock<HashMap<String, Entry>>,
    path: PathBuf,
}

impl DirectoryStore {
    /// Create an empty store persisting to the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            directory: RwLock::new(HashMap::new()),
            path: path.into(),
        }
    }

    /// Path of the persisted snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries in the directory.
    pub fn len(&self) -> usize {
        self.directory.read().len()
    }

    /// Whether the directory is empty.
    pub fn is_empty(&self) -> bool {
        self.directory.read().is_empty()
    }

    /// Merge one cycle's results into the directory.
    ///
    /// For every result whose `last_seen` is unset, the previous entry's
    /// `last_seen` is carried forward, so an endpoint that could not be
    /// reached this cycle keeps its "last successfully seen" timestamp.
    ///
    /// URLs present in the directory but absent from a *non-empty* candidate
    /// list are evicted. An empty candidate list means the discovery source
    /// failed this cycle, and eviction is skipped entirely so a source hiccup
    /// cannot mass-delete the directory.
    pub fn merge(&self, results: HashMap<String, Entry>, candidates: &[String]) {
        let mut directory = self.directory.write();

        for (url, mut entry) in results {
            if entry.last_seen.is_none() {
                entry.last_seen = directory.get(&url).and_then(|prev| prev.last_seen);
            }
            directory.insert(url, entry);
        }

        if !candidates.is_empty() {
            let before = directory.len();
            directory.retain(|url, _| candidates.iter().any(|c| c == url));
            let evicted = before - directory.len();
            if evicted > 0 {
                tracing::info!(evicted, "removed entries no longer in the discovery list");
            }
        }

        let valid = directory.values().filter(|e| e.valid).count();
        gauge!("directory_entries", "valid" => "true").set(valid as f64);
        gauge!("directory_entries", "valid" => "false").set((directory.len() - valid) as f64);
    }

    /// Read-only copy of all entries for concurrent readers.
    pub fn snapshot(&self) -> Vec<Entry> {
        self.directory.read().values().cloned().collect()
    }

    /// Read-only copy of the full URL→Entry map.
    pub fn snapshot_map(&self) -> HashMap<String, Entry> {
        self.directory.read().clone()
    }

    /// Serialize the directory to the snapshot file.
    ///
    /// The write is atomic: the snapshot is written to a temp file next to
    /// the target and renamed into place, so a crash mid-write never leaves a
    /// truncated snapshot behind.
    pub fn persist(&self) -> Result<()> {
        let encoded = {
            let directory = self.directory.read();
            serde_json::to_vec(&*directory)
                .map_err(|e| Error::Persistence(format!("can't serialize directory: {}", e)))?
        };

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, &encoded).map_err(|e| {
            Error::Persistence(format!("can't write {}: {}", tmp.display(), e))
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            Error::Persistence(format!("can't move snapshot into place: {}", e))
        })?;

        tracing::debug!(path = %self.path.display(), bytes = encoded.len(), "directory persisted");
        Ok(())
    }

    /// Populate the directory from the snapshot file at startup.
    ///
    /// Returns `Ok(false)` when the file is missing or unreadable (log and
    /// start empty). A file that exists but does not hold the expected
    /// URL→Entry object is a broken format contract and fails with
    /// [`Error::ReloadCorrupt`].
    pub fn reload(&self) -> Result<bool> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "can't read directory snapshot, starting empty"
                );
                return Ok(false);
            }
        };

        let loaded: HashMap<String, Entry> = serde_json::from_slice(&raw)
            .map_err(|e| Error::ReloadCorrupt(e.to_string()))?;

        let count = loaded.len();
        *self.directory.write() = loaded;
        tracing::info!(entries = count, "directory reloaded from snapshot");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn entry(url: &str, valid: bool, last_seen: Option<i64>) -> Entry {
        Entry {
            url: url.to_string(),
            valid,
            last_seen,
            ..Default::default()
        }
    }

    fn results(entries: Vec<Entry>) -> HashMap<String, Entry> {
        entries.into_iter().map(|e| (e.url.clone(), e)).collect()
    }

    #[test]
    fn merge_carries_last_seen_forward() {
        let tmp = TempDir::new().unwrap();
        let store = DirectoryStore::new(tmp.path().join("directory.json"));
        let url = "http://x/1".to_string();

        store.merge(
            results(vec![entry(&url, true, Some(1000))]),
            std::slice::from_ref(&url),
        );

        // Next cycle the fetch fails: no last_seen on the new entry
        store.merge(
            results(vec![entry(&url, false, None)]),
            std::slice::from_ref(&url),
        );

        let merged = store.snapshot_map();
        assert_eq!(merged[&url].last_seen, Some(1000));
        assert!(!merged[&url].valid);
    }

    #[test]
    fn last_seen_never_regresses() {
        let tmp = TempDir::new().unwrap();
        let store = DirectoryStore::new(tmp.path().join("directory.json"));
        let url = "http://x/1".to_string();
        let candidates = vec![url.clone()];

        for seen in [Some(1000), None, Some(2000), None] {
            store.merge(results(vec![entry(&url, true, seen)]), &candidates);
        }

        assert_eq!(store.snapshot_map()[&url].last_seen, Some(2000));
    }

    #[test]
    fn empty_candidates_skips_eviction() {
        let tmp = TempDir::new().unwrap();
        let store = DirectoryStore::new(tmp.path().join("directory.json"));
        let candidates = vec!["http://x/1".to_string(), "http://x/2".to_string()];

        store.merge(
            results(vec![
                entry("http://x/1", true, Some(1)),
                entry("http://x/2", false, None),
            ]),
            &candidates,
        );
        assert_eq!(store.len(), 2);

        // Discovery source failed: no candidates, no results
        store.merge(HashMap::new(), &[]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn shrinking_candidate_list_evicts() {
        let tmp = TempDir::new().unwrap();
        let store = DirectoryStore::new(tmp.path().join("directory.json"));

        store.merge(
            results(vec![
                entry("http://x/1", true, Some(1)),
                entry("http://x/2", true, Some(1)),
            ]),
            &["http://x/1".to_string(), "http://x/2".to_string()],
        );

        store.merge(
            results(vec![entry("http://x/1", true, Some(2))]),
            &["http://x/1".to_string()],
        );

        let merged = store.snapshot_map();
        assert_eq!(merged.len(), 1);
        assert!(merged.contains_key("http://x/1"));
    }

    #[test]
    fn missing_result_preserves_previous_entry() {
        let tmp = TempDir::new().unwrap();
        let store = DirectoryStore::new(tmp.path().join("directory.json"));
        let candidates = vec!["http://x/1".to_string(), "http://x/2".to_string()];

        store.merge(
            results(vec![
                entry("http://x/1", true, Some(1)),
                entry("http://x/2", true, Some(1)),
            ]),
            &candidates,
        );

        // x/2 missed the batch deadline: no result, but still a candidate
        store.merge(results(vec![entry("http://x/1", true, Some(2))]), &candidates);

        let merged = store.snapshot_map();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["http://x/2"].last_seen, Some(1));
    }

    #[test]
    fn persist_and_reload_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("directory.json");

        let store = DirectoryStore::new(&path);
        let mut e = entry("http://x/1", true, Some(1000));
        e.data = Some(json!({"api": "0.13", "space": "S1"}));
        store.merge(results(vec![e]), &["http://x/1".to_string()]);
        store.persist().unwrap();

        let reloaded = DirectoryStore::new(&path);
        assert!(reloaded.reload().unwrap());
        assert_eq!(reloaded.snapshot_map(), store.snapshot_map());
    }

    #[test]
    fn reload_missing_file_is_soft() {
        let tmp = TempDir::new().unwrap();
        let store = DirectoryStore::new(tmp.path().join("nope.json"));
        assert!(!store.reload().unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn reload_corrupt_file_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("directory.json");
        std::fs::write(&path, b"[1, 2, 3]").unwrap();

        let store = DirectoryStore::new(&path);
        match store.reload() {
            Err(Error::ReloadCorrupt(_)) => {}
            other => panic!("expected ReloadCorrupt, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn persist_into_missing_directory_fails() {
        let tmp = TempDir::new().unwrap();
        let store = DirectoryStore::new(tmp.path().join("no-such-dir").join("directory.json"));
        store.merge(
            results(vec![entry("http://x/1", true, Some(1))]),
            &["http://x/1".to_string()],
        );

        match store.persist() {
            Err(Error::Persistence(_)) => {}
            other => panic!("expected Persistence error, got {:?}", other),
        }
        // The in-memory directory is untouched by the failed write
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn persist_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("directory.json");
        let store = DirectoryStore::new(&path);
        store.merge(
            results(vec![entry("http://x/1", true, Some(1))]),
            &["http://x/1".to_string()],
        );
        store.persist().unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }
}
