//! Persisted lookup-key → UUID mapping.
//!
//! The store is what makes re-runs reproduce the same ids: it is loaded
//! wholesale before processing and written back wholesale after the pipeline
//! completes. Newly minted ids from a run that crashes before the final save
//! are simply regenerated next run; the downstream `ON CONFLICT DO NOTHING`
//! guard makes that harmless for uncommitted rows.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::fs;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Default, Clone)]
pub struct IdentityStore {
    // Insertion-ordered so a re-save diffs cleanly against the previous file.
    ids: IndexMap<String, Uuid>,
    minted: usize,
}

impl IdentityStore {
    /// Load the store from a JSON object file. A missing file is an empty
    /// store (first run); malformed JSON is fatal.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "id map not found, starting empty");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read id map {}", path.display()))?;
        let ids: IndexMap<String, Uuid> = serde_json::from_str(&raw)
            .with_context(|| format!("parse id map {}", path.display()))?;
        info!(path = %path.display(), keys = ids.len(), "id map loaded");
        Ok(Self { ids, minted: 0 })
    }

    /// Write the full (possibly enlarged) mapping back. Call only after the
    /// pipeline has completed so a failed run never partially writes the map.
    pub fn save(&self, path: &Path) -> Result<()> {
        let body = serde_json::to_string_pretty(&self.ids)?;
        fs::write(path, body).with_context(|| format!("write id map {}", path.display()))?;
        info!(path = %path.display(), keys = self.ids.len(), minted = self.minted, "id map saved");
        Ok(())
    }

    /// Stable id for a lookup key: returns the previously assigned id when the
    /// key is known (this run or a persisted earlier run), otherwise mints a
    /// fresh v4 UUID and records it.
    pub fn get_or_create(&mut self, key: &str) -> Uuid {
        if let Some(id) = self.ids.get(key) {
            return *id;
        }
        let id = Uuid::new_v4();
        self.ids.insert(key.to_string(), id);
        self.minted += 1;
        id
    }

    /// Number of ids minted since load (for end-of-run reporting).
    pub fn minted(&self) -> usize {
        self.minted
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_same_id() {
        let mut store = IdentityStore::default();
        let a = store.get_or_create("BCG01");
        let b = store.get_or_create("BCG01");
        assert_eq!(a, b);
        assert_eq!(store.minted(), 1);
    }

    #[test]
    fn distinct_keys_distinct_ids() {
        let mut store = IdentityStore::default();
        let a = store.get_or_create("BCG01");
        let b = store.get_or_create("BCG01_diluent");
        assert_ne!(a, b);
    }

    #[test]
    fn survives_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.json");

        let mut store = IdentityStore::default();
        let item = store.get_or_create("BCG01");
        let variant = store.get_or_create("vax-123");
        store.save(&path).unwrap();

        let mut reloaded = IdentityStore::load(&path).unwrap();
        assert_eq!(reloaded.get_or_create("BCG01"), item);
        assert_eq!(reloaded.get_or_create("vax-123"), variant);
        assert_eq!(reloaded.minted(), 0);
    }

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdentityStore::load(&dir.path().join("absent.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn malformed_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(IdentityStore::load(&path).is_err());
    }
}
