use async_trait::async_trait;

use crate::models::{Restaurant, Review, ReviewPayload};

use super::ApiError;

/// Read side of the remote data source: one full-collection fetch per
/// entity type. The cache layer only ever needs this for seeding.
#[async_trait]
pub trait RecordSource<R>: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<R>, ApiError>;
}

/// Write side of the remote data source, used by the sync routines.
#[async_trait]
pub trait RemoteWriter: Send + Sync {
    /// Push a restaurant's favorite flag, keyed by its id. Any non-2xx
    /// status surfaces as an error and leaves the record dirty.
    async fn put_favorite(&self, restaurant: &Restaurant) -> Result<(), ApiError>;

    /// Create a review on the server. Returns the record the server built,
    /// carrying its real (positive) id.
    async fn post_review(&self, payload: &ReviewPayload) -> Result<Review, ApiError>;
}
