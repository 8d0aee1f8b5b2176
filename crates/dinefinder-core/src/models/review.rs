use serde::{Deserialize, Serialize};

use crate::store::{IndexKey, Record};

/// Index over `restaurant_id`.
pub const BY_RESTAURANT: &str = "by-restaurant";

/// Ratings run 0 to 5 inclusive.
pub const MAX_RATING: u8 = 5;

/// A stored review.
///
/// `id` is the server-assigned positive id, or a negative local placeholder
/// for a review written offline and not yet pushed. Placeholders are
/// replaced wholesale by the server record on a successful sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub restaurant_id: i64,
    pub name: String,
    pub rating: u8,
    pub comments: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: i64,
    #[serde(default)]
    pub in_sync: bool,
}

impl Record for Review {
    fn key(&self) -> i64 {
        self.id
    }

    fn index_entries(&self) -> Vec<(&'static str, IndexKey)> {
        vec![(BY_RESTAURANT, IndexKey::Int(self.restaurant_id))]
    }

    fn in_sync(&self) -> bool {
        self.in_sync
    }

    fn set_in_sync(&mut self, in_sync: bool) {
        self.in_sync = in_sync;
    }
}

/// Review form data as submitted by a caller.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub name: String,
    pub rating: u8,
    pub comments: String,
}

/// Wire shape for creating a review on the server. The local placeholder
/// id is deliberately not part of it.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewPayload {
    pub restaurant_id: i64,
    pub name: String,
    pub rating: u8,
    pub comments: String,
}

impl ReviewPayload {
    pub fn from_review(review: &Review) -> Self {
        Self {
            restaurant_id: review.restaurant_id,
            name: review.name.clone(),
            rating: review.rating,
            comments: review.comments.clone(),
        }
    }
}
