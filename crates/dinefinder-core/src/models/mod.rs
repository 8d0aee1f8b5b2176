//! Data models for directory entities.
//!
//! This module contains the records served by the cache layer:
//!
//! - `Restaurant`: a directory entry with location, hours, and the
//!   favorite flag that can be toggled offline
//! - `Review`, `NewReview`, `ReviewPayload`: stored reviews, the form data
//!   they are created from, and the wire shape pushed to the server
//! - `RestaurantWithReviews`: the read-time join of the two

pub mod restaurant;
pub mod review;

pub use restaurant::{LatLng, Restaurant, RestaurantWithReviews, BY_CUISINE, BY_NEIGHBORHOOD};
pub use review::{NewReview, Review, ReviewPayload, BY_RESTAURANT, MAX_RATING};
