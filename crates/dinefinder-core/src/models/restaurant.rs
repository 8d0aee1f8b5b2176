use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::store::{IndexKey, Record};
use super::review::Review;

/// Index over `cuisine_type`.
pub const BY_CUISINE: &str = "by-cuisine";

/// Index over `neighborhood`.
pub const BY_NEIGHBORHOOD: &str = "by-neighborhood";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// A directory entry as served by the data server, plus the local sync flag.
///
/// `in_sync` never comes from the wire; seeding stamps it true, local
/// mutations flip it false until the record is pushed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub neighborhood: String,
    pub cuisine_type: String,
    pub address: String,
    pub latlng: LatLng,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photograph: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub operating_hours: BTreeMap<String, String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub in_sync: bool,
}

impl Record for Restaurant {
    fn key(&self) -> i64 {
        self.id
    }

    fn index_entries(&self) -> Vec<(&'static str, IndexKey)> {
        vec![
            (BY_CUISINE, IndexKey::from(self.cuisine_type.as_str())),
            (BY_NEIGHBORHOOD, IndexKey::from(self.neighborhood.as_str())),
        ]
    }

    fn in_sync(&self) -> bool {
        self.in_sync
    }

    fn set_in_sync(&mut self, in_sync: bool) {
        self.in_sync = in_sync;
    }
}

/// Read-time join of a restaurant and its reviews. Never persisted; the
/// reviews field is dropped from serialized output when there are none.
#[derive(Debug, Clone, Serialize)]
pub struct RestaurantWithReviews {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reviews: Vec<Review>,
}
