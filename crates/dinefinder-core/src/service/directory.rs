use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::api::{ApiClient, RemoteWriter};
use crate::cache::CacheService;
use crate::config::Config;
use crate::models::{
    NewReview, Restaurant, RestaurantWithReviews, Review, ReviewPayload, BY_CUISINE,
    BY_NEIGHBORHOOD, BY_RESTAURANT, MAX_RATING,
};
use crate::store::{IndexKey, Record, Table};
use crate::sync::{SyncEvent, SyncScheduler};

use super::ServiceError;

/// Filter sentinel meaning "no filtering on this dimension".
pub const FILTER_ALL: &str = "all";

/// Maximum concurrent remote calls per synchronize run.
/// Bounds the fan-out so a large dirty set cannot flood the data server.
const MAX_CONCURRENT_SYNC_REQUESTS: usize = 8;

/// Hands out ids for reviews that exist only locally. The counter walks
/// down from the maximum representable integer and issued ids map strictly
/// below zero, so they can never collide with server-assigned (positive)
/// ids and every new id is strictly smaller than the one before it.
struct PlaceholderIds {
    next: AtomicI64,
}

impl PlaceholderIds {
    fn new() -> Self {
        Self {
            next: AtomicI64::new(i64::MAX),
        }
    }

    fn next_id(&self) -> i64 {
        let n = self.next.fetch_sub(1, Ordering::Relaxed);
        n - i64::MAX - 1
    }
}

/// Domain service over the cached restaurant and review tables.
///
/// Reads go to the local tables. Mutations write locally, mark the record
/// out of sync, and arm the deferred sync trigger; the synchronize
/// routines later replay dirty records against the server. Two mutations
/// racing on the same id resolve as last write wins.
pub struct DirectoryService {
    restaurants: CacheService<Restaurant>,
    reviews: CacheService<Review>,
    remote: Arc<dyn RemoteWriter>,
    scheduler: Arc<dyn SyncScheduler>,
    review_ids: PlaceholderIds,
}

impl DirectoryService {
    pub fn new(
        restaurants: CacheService<Restaurant>,
        reviews: CacheService<Review>,
        remote: Arc<dyn RemoteWriter>,
        scheduler: Arc<dyn SyncScheduler>,
    ) -> Self {
        Self {
            restaurants,
            reviews,
            remote,
            scheduler,
            review_ids: PlaceholderIds::new(),
        }
    }

    /// Wire a service from configuration: durable tables under the data
    /// directory and an HTTP remote. A table that cannot be opened leaves
    /// that entity in pass-through mode instead of failing.
    pub fn open(config: &Config, scheduler: Arc<dyn SyncScheduler>) -> Result<Self, ServiceError> {
        let client = Arc::new(ApiClient::new(config.base_url())?);
        let data_dir = config.table_dir();

        let restaurants = CacheService::new(
            open_table(data_dir.as_deref(), "restaurants"),
            client.clone(),
        );
        let reviews = CacheService::new(open_table(data_dir.as_deref(), "reviews"), client.clone());

        Ok(Self::new(restaurants, reviews, client, scheduler))
    }

    /// Seed both tables from the network. Reads are only trusted to return
    /// non-empty results after this has completed once.
    pub async fn initialize(&self) -> Result<(), ServiceError> {
        let (restaurants, reviews) = tokio::join!(
            self.restaurants.seed_if_empty(),
            self.reviews.seed_if_empty()
        );
        restaurants?;
        reviews?;
        Ok(())
    }

    /// Restaurants matching a cuisine and a neighborhood, either of which
    /// may be [`FILTER_ALL`]. At most one index lookup is used; the second
    /// filter narrows the already-indexed set linearly. Results keep the
    /// store's iteration order.
    pub async fn list_by_filter(&self, cuisine: &str, neighborhood: &str) -> Vec<Restaurant> {
        if cuisine != FILTER_ALL {
            let mut matches = self
                .restaurants
                .read_by_index(BY_CUISINE, &IndexKey::from(cuisine))
                .await;
            if neighborhood != FILTER_ALL {
                matches.retain(|r| r.neighborhood == neighborhood);
            }
            return matches;
        }

        if neighborhood != FILTER_ALL {
            return self
                .restaurants
                .read_by_index(BY_NEIGHBORHOOD, &IndexKey::from(neighborhood))
                .await;
        }

        self.restaurants.read_all().await
    }

    /// Every cuisine present in the directory, once, in ascending order.
    pub async fn distinct_cuisines(&self) -> Vec<String> {
        self.restaurants
            .distinct_index_values(BY_CUISINE)
            .await
            .into_iter()
            .filter_map(IndexKey::into_text)
            .collect()
    }

    /// Every neighborhood present in the directory, once, in ascending order.
    pub async fn distinct_neighborhoods(&self) -> Vec<String> {
        self.restaurants
            .distinct_index_values(BY_NEIGHBORHOOD)
            .await
            .into_iter()
            .filter_map(IndexKey::into_text)
            .collect()
    }

    /// A restaurant joined with its reviews at read time. `None` when the
    /// restaurant does not exist locally.
    pub async fn restaurant_with_reviews(&self, id: i64) -> Option<RestaurantWithReviews> {
        let restaurant = self.restaurants.read_by_id(id).await?;
        let reviews = self
            .reviews
            .read_by_index(BY_RESTAURANT, &IndexKey::Int(id))
            .await;
        Some(RestaurantWithReviews {
            restaurant,
            reviews,
        })
    }

    /// Set a restaurant's favorite flag locally, mark it out of sync, and
    /// arm the restaurant sync trigger.
    pub async fn toggle_favorite(
        &self,
        id: i64,
        is_favorite: bool,
    ) -> Result<Restaurant, ServiceError> {
        let mut restaurant = self
            .restaurants
            .read_by_id(id)
            .await
            .ok_or(ServiceError::NotFound { id })?;

        restaurant.is_favorite = is_favorite;
        restaurant.in_sync = false;
        self.restaurants.write(restaurant.clone()).await?;
        self.scheduler.arm(SyncEvent::Restaurants);
        Ok(restaurant)
    }

    /// Store a new review under a local placeholder id and arm the review
    /// sync trigger. Returns as soon as the record is stored locally; the
    /// server sees it when the trigger fires.
    pub async fn add_review(
        &self,
        restaurant_id: i64,
        new_review: NewReview,
    ) -> Result<Review, ServiceError> {
        if new_review.rating > MAX_RATING {
            return Err(ServiceError::InvalidReview(format!(
                "rating {} is out of range 0-{}",
                new_review.rating, MAX_RATING
            )));
        }
        if new_review.name.trim().is_empty() {
            return Err(ServiceError::InvalidReview(
                "reviewer name is required".to_string(),
            ));
        }
        // Reviews must point at a restaurant we know about.
        if self.restaurants.read_by_id(restaurant_id).await.is_none() {
            return Err(ServiceError::NotFound { id: restaurant_id });
        }

        let review = Review {
            id: self.review_ids.next_id(),
            restaurant_id,
            name: new_review.name,
            rating: new_review.rating,
            comments: new_review.comments,
            created_at: Utc::now().timestamp_millis(),
            in_sync: false,
        };

        self.reviews.write(review.clone()).await?;
        self.scheduler.arm(SyncEvent::Reviews);
        Ok(review)
    }

    /// Push every out-of-sync restaurant's favorite flag to the server.
    ///
    /// Records fail or succeed independently; successes are committed as
    /// they land, and only after every record has been attempted does an
    /// aggregate [`ServiceError::PartialSync`] surface. Returns the number
    /// of records synchronized on full success.
    pub async fn synchronize_restaurants(&self) -> Result<usize, ServiceError> {
        let dirty: Vec<Restaurant> = self
            .restaurants
            .read_all()
            .await
            .into_iter()
            .filter(|r| !r.in_sync())
            .collect();

        let results: Vec<Result<(), ServiceError>> = stream::iter(dirty)
            .map(|restaurant| async move {
                let id = restaurant.id;
                match self.remote.put_favorite(&restaurant).await {
                    Ok(()) => {
                        let mut synced = restaurant;
                        synced.in_sync = true;
                        self.restaurants.write(synced).await?;
                        debug!(id, "Restaurant synced");
                        Ok(())
                    }
                    Err(e) => {
                        warn!(id, error = %e, "Restaurant sync failed, left pending");
                        Err(ServiceError::Network(e))
                    }
                }
            })
            .buffer_unordered(MAX_CONCURRENT_SYNC_REQUESTS)
            .collect()
            .await;

        summarize(results)
    }

    /// Push every out-of-sync review to the server.
    ///
    /// A successful post stores the server's record (real id, in sync) and
    /// then deletes the placeholder one. The two steps are not a
    /// transaction: a crash in between leaves both present until the next
    /// run, which is accepted over losing the review. Failures keep the
    /// placeholder pending.
    pub async fn synchronize_reviews(&self) -> Result<usize, ServiceError> {
        let dirty: Vec<Review> = self
            .reviews
            .read_all()
            .await
            .into_iter()
            .filter(|r| !r.in_sync())
            .collect();

        let results: Vec<Result<(), ServiceError>> = stream::iter(dirty)
            .map(|review| async move {
                let payload = ReviewPayload::from_review(&review);
                match self.remote.post_review(&payload).await {
                    Ok(mut created) => {
                        created.in_sync = true;
                        let server_id = created.id;
                        self.reviews.write(created).await?;
                        if server_id != review.id {
                            self.reviews.remove(review.id).await?;
                        }
                        debug!(placeholder = review.id, id = server_id, "Review synced");
                        Ok(())
                    }
                    Err(e) => {
                        warn!(id = review.id, error = %e, "Review sync failed, left pending");
                        Err(ServiceError::Network(e))
                    }
                }
            })
            .buffer_unordered(MAX_CONCURRENT_SYNC_REQUESTS)
            .collect()
            .await;

        summarize(results)
    }
}

fn open_table<R: Record>(dir: Option<&Path>, name: &str) -> Option<Arc<Table<R>>> {
    let Some(dir) = dir else {
        warn!(table = name, "No data directory available, cache disabled");
        return None;
    };
    match Table::open(dir, name) {
        Ok(table) => Some(Arc::new(table)),
        Err(e) => {
            warn!(table = name, error = %e, "Failed to open table, cache disabled");
            None
        }
    }
}

fn summarize(results: Vec<Result<(), ServiceError>>) -> Result<usize, ServiceError> {
    let synced = results.iter().filter(|r| r.is_ok()).count();
    let failed = results.len() - synced;
    if failed > 0 {
        Err(ServiceError::PartialSync { synced, failed })
    } else {
        Ok(synced)
    }
}

// ============================================================================
// Tests
// ============================================================================
