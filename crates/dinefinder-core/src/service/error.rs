use thiserror::Error;

use crate::api::ApiError;
use crate::cache::CacheError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// The operation targeted an id with no local record.
    #[error("record {id} not found")]
    NotFound { id: i64 },

    #[error("rejected review: {0}")]
    InvalidReview(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Network(#[from] ApiError),

    /// A batch sync attempted every dirty record; successes are committed,
    /// but at least one record failed and stays dirty for the next trigger.
    #[error("sync incomplete: {failed} failed, {synced} synced")]
    PartialSync { synced: usize, failed: usize },
}

impl From<CacheError> for ServiceError {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::Api(e) => ServiceError::Network(e),
            CacheError::Store(e) => ServiceError::Store(e),
        }
    }
}
