//! Durable local tables with secondary indexes.
//!
//! This module provides the `Table` store underlying the cache layer.
//! Each table holds one entity type keyed by a numeric id, supports
//! non-unique secondary indexes, and persists itself as a JSON file so
//! cached data survives restarts.

pub mod table;

pub use table::{IndexKey, Record, StoreError, Table};
