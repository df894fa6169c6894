//! The persistence boundary.
//!
//! The core never talks to a database directly: the publish pipeline
//! receives an explicitly-constructed [`SnapshotStore`] and replaces the
//! whole snapshot through it. The real implementation lives in the web
//! layer; tests and tools use [`MemorySnapshotStore`].

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use crate::publish::{PublishedSnapshot, StagedImport};
use crate::row::Row;

/// Storage access the publish pipeline needs.
///
/// `replace_snapshot` must be all-or-nothing from the caller's point of
/// view: the store either holds the previous snapshot or the new one,
/// never a mix.
pub trait SnapshotStore {
    /// The most recently recorded staged import, if any.
    fn latest_import(&self) -> Result<Option<StagedImport>>;

    /// Replace the published snapshot with a new one.
    fn replace_snapshot(&mut self, snapshot: &PublishedSnapshot) -> Result<()>;
}

/// In-memory store for tests and offline tooling.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    imports: Vec<StagedImport>,
    snapshot: Option<PublishedSnapshot>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a staged import from raw sheet rows, returning its id.
    pub fn record_import(
        &mut self,
        filename: Option<&str>,
        kampe: Vec<Row>,
        holdliste: Vec<Row>,
        klubliste: Vec<Row>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        self.imports.push(StagedImport {
            id: id.clone(),
            created_at: Utc::now(),
            filename: filename.map(str::to_string),
            kampe,
            holdliste,
            klubliste,
        });
        id
    }

    pub fn snapshot(&self) -> Option<&PublishedSnapshot> {
        self.snapshot.as_ref()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn latest_import(&self) -> Result<Option<StagedImport>> {
        Ok(self.imports.last().cloned())
    }

    fn replace_snapshot(&mut self, snapshot: &PublishedSnapshot) -> Result<()> {
        self.snapshot = Some(snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_latest_import() {
        let mut store = MemorySnapshotStore::new();
        assert!(store.latest_import().unwrap().is_none());

        store.record_import(Some("first.xlsx"), vec![], vec![], vec![]);
        let second = store.record_import(Some("second.xlsx"), vec![], vec![], vec![]);

        let latest = store.latest_import().unwrap().unwrap();
        assert_eq!(latest.id, second);
        assert_eq!(latest.filename.as_deref(), Some("second.xlsx"));
    }

    #[test]
    fn test_memory_store_replace_snapshot() {
        let mut store = MemorySnapshotStore::new();
        let snapshot = PublishedSnapshot {
            source_import_id: "import-1".into(),
            clubs: vec![],
            teams: vec![],
            matches: vec![],
            resolution: Default::default(),
        };
        store.replace_snapshot(&snapshot).unwrap();
        assert_eq!(
            store.snapshot().map(|s| s.source_import_id.as_str()),
            Some("import-1")
        );
    }
}
