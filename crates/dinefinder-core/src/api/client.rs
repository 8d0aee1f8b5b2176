//! HTTP client for the restaurant data server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::models::{Restaurant, Review, ReviewPayload};

use super::{ApiError, RecordSource, RemoteWriter};

/// HTTP request timeout in seconds.
/// 30s allows for slow responses while failing fast enough for retries
/// driven by the next sync trigger.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// REST client for the data server.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the server at `base_url` (e.g. `http://localhost:1337`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url, collection)
    }

    /// Check if a response is successful, returning an error carrying the
    /// body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn fetch_collection<T: DeserializeOwned>(
        &self,
        collection: &str,
    ) -> Result<Vec<T>, ApiError> {
        let response = self
            .client
            .get(self.collection_url(collection))
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let items: Vec<T> = response.json().await?;
        debug!(collection, count = items.len(), "Collection fetched");
        Ok(items)
    }
}

#[async_trait]
impl RecordSource<Restaurant> for ApiClient {
    async fn fetch_all(&self) -> Result<Vec<Restaurant>, ApiError> {
        self.fetch_collection("restaurants").await
    }
}

#[async_trait]
impl RecordSource<Review> for ApiClient {
    async fn fetch_all(&self) -> Result<Vec<Review>, ApiError> {
        self.fetch_collection("reviews").await
    }
}

#[async_trait]
impl RemoteWriter for ApiClient {
    async fn put_favorite(&self, restaurant: &Restaurant) -> Result<(), ApiError> {
        let url = format!(
            "{}/restaurants/{}?is_favorite={}",
            self.base_url, restaurant.id, restaurant.is_favorite
        );

        let response = self.client.put(url).json(restaurant).send().await?;
        // The response body echoes the record; the local copy stays the
        // source of truth, so only the status matters here.
        Self::check_response(response).await?;

        debug!(
            id = restaurant.id,
            is_favorite = restaurant.is_favorite,
            "Favorite flag pushed"
        );
        Ok(())
    }

    async fn post_review(&self, payload: &ReviewPayload) -> Result<Review, ApiError> {
        let response = self
            .client
            .post(self.collection_url("reviews"))
            .json(payload)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let created: Review = response.json().await?;
        debug!(
            id = created.id,
            restaurant_id = created.restaurant_id,
            "Review created remotely"
        );
        Ok(created)
    }
}
