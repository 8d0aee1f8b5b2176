//! Read-through cache layer.
//!
//! A `CacheService` pairs one local table with one remote collection. It
//! seeds the table from the network exactly once (when empty), serves all
//! reads from the table, and degrades to empty reads and no-op writes when
//! the underlying store could not be opened.

pub mod service;

pub use service::{CacheError, CacheService};
