use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::api::{ApiError, RecordSource};
use crate::store::{IndexKey, Record, StoreError, Table};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One local table plus the remote collection it caches.
///
/// `table` is `None` when the store could not be opened; every operation
/// then falls through to empty results or no-ops so callers keep working
/// without a cache. The indirection lets the service layer treat
/// restaurants and reviews identically even though one mixes local
/// placeholder ids into its key space.
pub struct CacheService<R: Record> {
    table: Option<Arc<Table<R>>>,
    source: Arc<dyn RecordSource<R>>,
}

impl<R: Record> CacheService<R> {
    pub fn new(table: Option<Arc<Table<R>>>, source: Arc<dyn RecordSource<R>>) -> Self {
        Self { table, source }
    }

    /// One-time network seed: if the table holds nothing yet, fetch the
    /// full collection, stamp every record as in sync, and store it in one
    /// bulk upsert. A no-op when records already exist, so calling it on
    /// every start is safe. A fetch failure leaves the table empty; reads
    /// degrade to empty results until a later start seeds successfully.
    pub async fn seed_if_empty(&self) -> Result<(), CacheError> {
        let Some(table) = &self.table else {
            debug!("Store unavailable, seed skipped");
            return Ok(());
        };

        if table.count().await > 0 {
            return Ok(());
        }

        let mut records = self.source.fetch_all().await?;
        for record in &mut records {
            record.set_in_sync(true);
        }
        let count = records.len();
        table.put_many(records).await?;
        debug!(count, "Table seeded from network");
        Ok(())
    }

    pub async fn read_all(&self) -> Vec<R> {
        match &self.table {
            Some(table) => table.get_all().await,
            None => Vec::new(),
        }
    }

    pub async fn read_by_id(&self, id: i64) -> Option<R> {
        match &self.table {
            Some(table) => table.get_by_id(id).await,
            None => None,
        }
    }

    pub async fn read_by_index(&self, index: &str, key: &IndexKey) -> Vec<R> {
        match &self.table {
            Some(table) => table.get_by_index(index, key).await,
            None => Vec::new(),
        }
    }

    pub async fn distinct_index_values(&self, index: &str) -> Vec<IndexKey> {
        match &self.table {
            Some(table) => table.distinct_index_values(index).await,
            None => Vec::new(),
        }
    }

    /// Local upsert. Remote writes are the service layer's concern.
    pub async fn write(&self, record: R) -> Result<(), StoreError> {
        match &self.table {
            Some(table) => table.put(record).await,
            None => {
                debug!("Store unavailable, write dropped");
                Ok(())
            }
        }
    }

    pub async fn remove(&self, id: i64) -> Result<(), StoreError> {
        match &self.table {
            Some(table) => table.delete(id).await,
            None => Ok(()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
