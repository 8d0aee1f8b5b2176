use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt table file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Key of a secondary index entry. Index scans iterate these in their
/// derived `Ord` order, so lookups and distinct-value scans come back
/// sorted without any per-call sorting.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum IndexKey {
    Int(i64),
    Text(String),
}

impl IndexKey {
    pub fn into_text(self) -> Option<String> {
        match self {
            IndexKey::Text(s) => Some(s),
            IndexKey::Int(_) => None,
        }
    }
}

impl From<i64> for IndexKey {
    fn from(value: i64) -> Self {
        IndexKey::Int(value)
    }
}

impl From<&str> for IndexKey {
    fn from(value: &str) -> Self {
        IndexKey::Text(value.to_string())
    }
}

impl From<String> for IndexKey {
    fn from(value: String) -> Self {
        IndexKey::Text(value)
    }
}

/// A record storable in a [`Table`].
///
/// `key` is the primary key, unique within a table at any instant.
/// `index_entries` names the secondary indexes the record participates in;
/// the table keeps them in step with every upsert and delete.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    fn key(&self) -> i64;

    fn index_entries(&self) -> Vec<(&'static str, IndexKey)>;

    /// Whether the local copy matches what the server last confirmed.
    fn in_sync(&self) -> bool;

    fn set_in_sync(&mut self, in_sync: bool);
}

struct Inner<R> {
    records: BTreeMap<i64, R>,
    indexes: BTreeMap<&'static str, BTreeMap<IndexKey, BTreeSet<i64>>>,
}

impl<R: Record> Inner<R> {
    fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            indexes: BTreeMap::new(),
        }
    }

    fn index(&mut self, record: &R) {
        for (name, key) in record.index_entries() {
            self.indexes
                .entry(name)
                .or_default()
                .entry(key)
                .or_default()
                .insert(record.key());
        }
    }

    fn unindex(&mut self, record: &R) {
        for (name, key) in record.index_entries() {
            if let Some(index) = self.indexes.get_mut(name) {
                if let Some(ids) = index.get_mut(&key) {
                    ids.remove(&record.key());
                    if ids.is_empty() {
                        index.remove(&key);
                    }
                }
            }
        }
    }

    /// Upsert by primary key, keeping secondary indexes in step.
    fn insert(&mut self, record: R) {
        if let Some(old) = self.records.remove(&record.key()) {
            self.unindex(&old);
        }
        self.index(&record);
        self.records.insert(record.key(), record);
    }

    fn remove(&mut self, id: i64) -> Option<R> {
        let old = self.records.remove(&id)?;
        self.unindex(&old);
        Some(old)
    }
}

/// One durable table of records, keyed by id, with secondary indexes.
///
/// Every operation is its own critical section; multi-step flows built on
/// top of the table are not wrapped in a table-level transaction.
pub struct Table<R: Record> {
    inner: RwLock<Inner<R>>,
    path: Option<PathBuf>,
}

impl<R: Record> Table<R> {
    /// A table without a backing file. Contents are lost on drop.
    pub fn in_memory() -> Self {
        Self {
            inner: RwLock::new(Inner::new()),
            path: None,
        }
    }

    /// Open the table backed by `dir/name.json`, loading any records a
    /// previous run persisted. Failing to open means the store is
    /// unavailable and the caller should fall back to pass-through mode.
    pub fn open(dir: &Path, name: &str) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.json", name));

        let mut inner = Inner::new();
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            let records: Vec<R> = serde_json::from_str(&contents)?;
            for record in records {
                inner.insert(record);
            }
            debug!(table = name, count = inner.records.len(), "Table loaded");
        }

        Ok(Self {
            inner: RwLock::new(inner),
            path: Some(path),
        })
    }

    pub async fn count(&self) -> usize {
        self.inner.read().await.records.len()
    }

    /// All records in ascending primary-key order.
    pub async fn get_all(&self) -> Vec<R> {
        self.inner.read().await.records.values().cloned().collect()
    }

    pub async fn get_by_id(&self, id: i64) -> Option<R> {
        self.inner.read().await.records.get(&id).cloned()
    }

    /// Records whose `index` entry equals `key`, in ascending primary-key
    /// order within the key.
    pub async fn get_by_index(&self, index: &str, key: &IndexKey) -> Vec<R> {
        let inner = self.inner.read().await;
        let Some(ids) = inner.indexes.get(index).and_then(|idx| idx.get(key)) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| inner.records.get(id).cloned())
            .collect()
    }

    /// Each distinct key of `index`, exactly once, in ascending key order.
    pub async fn distinct_index_values(&self, index: &str) -> Vec<IndexKey> {
        let inner = self.inner.read().await;
        match inner.indexes.get(index) {
            Some(idx) => idx.keys().cloned().collect(),
            None => Vec::new(),
        }
    }

    pub async fn put(&self, record: R) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.insert(record);
        self.persist(&inner)
    }

    /// Bulk upsert with a single durability flush. Used by seeding.
    pub async fn put_many(&self, records: Vec<R>) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        for record in records {
            inner.insert(record);
        }
        self.persist(&inner)
    }

    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.remove(id).is_some() {
            self.persist(&inner)?;
        }
        Ok(())
    }

    fn persist(&self, inner: &Inner<R>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let records: Vec<&R> = inner.records.values().collect();
        let contents = serde_json::to_string_pretty(&records)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: i64,
        kind: String,
        in_sync: bool,
    }

    impl Record for Item {
        fn key(&self) -> i64 {
            self.id
        }

        fn index_entries(&self) -> Vec<(&'static str, IndexKey)> {
            vec![("by-kind", IndexKey::from(self.kind.as_str()))]
        }

        fn in_sync(&self) -> bool {
            self.in_sync
        }

        fn set_in_sync(&mut self, in_sync: bool) {
            self.in_sync = in_sync;
        }
    }

    fn item(id: i64, kind: &str) -> Item {
        Item {
            id,
            kind: kind.to_string(),
            in_sync: true,
        }
    }

    #[tokio::test]
    async fn test_put_and_get_by_id() {
        let table = Table::in_memory();
        table.put(item(1, "starter")).await.unwrap();

        assert_eq!(table.get_by_id(1).await, Some(item(1, "starter")));
        assert_eq!(table.get_by_id(2).await, None);
        assert_eq!(table.count().await, 1);
    }

    #[tokio::test]
    async fn test_get_all_is_ordered_by_key() {
        let table = Table::in_memory();
        table.put(item(3, "main")).await.unwrap();
        table.put(item(-5, "starter")).await.unwrap();
        table.put(item(1, "dessert")).await.unwrap();

        let ids: Vec<i64> = table.get_all().await.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![-5, 1, 3]);
    }

    #[tokio::test]
    async fn test_index_lookup() {
        let table = Table::in_memory();
        table.put(item(1, "main")).await.unwrap();
        table.put(item(2, "starter")).await.unwrap();
        table.put(item(3, "main")).await.unwrap();

        let mains = table.get_by_index("by-kind", &IndexKey::from("main")).await;
        let ids: Vec<i64> = mains.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 3]);

        assert!(table
            .get_by_index("by-kind", &IndexKey::from("soup"))
            .await
            .is_empty());
        assert!(table
            .get_by_index("no-such-index", &IndexKey::from("main"))
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_distinct_values_ordered_and_unique() {
        let table = Table::in_memory();
        table.put(item(1, "starter")).await.unwrap();
        table.put(item(2, "main")).await.unwrap();
        table.put(item(3, "main")).await.unwrap();
        table.put(item(4, "dessert")).await.unwrap();

        let values = table.distinct_index_values("by-kind").await;
        assert_eq!(
            values,
            vec![
                IndexKey::from("dessert"),
                IndexKey::from("main"),
                IndexKey::from("starter"),
            ]
        );
    }

    #[tokio::test]
    async fn test_distinct_values_empty_before_any_put() {
        let table: Table<Item> = Table::in_memory();
        assert!(table.distinct_index_values("by-kind").await.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_moves_index_entry() {
        let table = Table::in_memory();
        table.put(item(1, "starter")).await.unwrap();
        table.put(item(1, "main")).await.unwrap();

        assert!(table
            .get_by_index("by-kind", &IndexKey::from("starter"))
            .await
            .is_empty());
        assert_eq!(
            table.get_by_index("by-kind", &IndexKey::from("main")).await.len(),
            1
        );
        assert_eq!(table.count().await, 1);
    }

    #[tokio::test]
    async fn test_delete_removes_index_entries() {
        let table = Table::in_memory();
        table.put(item(1, "main")).await.unwrap();
        table.delete(1).await.unwrap();

        assert_eq!(table.count().await, 0);
        assert!(table.get_by_index("by-kind", &IndexKey::from("main")).await.is_empty());
        assert!(table.distinct_index_values("by-kind").await.is_empty());
    }

    #[tokio::test]
    async fn test_reopen_preserves_records() {
        let dir = tempfile::tempdir().unwrap();

        {
            let table = Table::open(dir.path(), "items").unwrap();
            table.put(item(1, "starter")).await.unwrap();
            table.put(item(2, "main")).await.unwrap();
        }

        let reopened: Table<Item> = Table::open(dir.path(), "items").unwrap();
        assert_eq!(reopened.count().await, 2);
        assert_eq!(
            reopened
                .get_by_index("by-kind", &IndexKey::from("main"))
                .await
                .len(),
            1
        );
    }
}
