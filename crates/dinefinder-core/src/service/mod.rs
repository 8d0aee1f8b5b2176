//! Domain service for the restaurant directory.
//!
//! `DirectoryService` composes the two cache services (restaurants,
//! reviews) and implements the domain queries, the offline-first mutation
//! entry points, and the synchronize routines that reconcile dirty local
//! records with the data server.

pub mod directory;
pub mod error;

pub use directory::{DirectoryService, FILTER_ALL};
pub use error::ServiceError;
