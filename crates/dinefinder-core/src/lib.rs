//! Offline-first core for the dinefinder restaurant directory.
//!
//! The crate mediates between a remote REST data server and durable local
//! tables: reads are served from the local store (seeded from the network
//! once), while mutations are stored locally with a per-record dirty flag
//! and replayed against the server when a deferred sync trigger fires.
//!
//! Layering, leaves first:
//!
//! - [`store`] - ordered key-value tables with secondary indexes
//! - [`api`] - REST client plus the remote source/writer seams
//! - [`cache`] - one table + one remote collection, seed-once read-through
//! - [`service`] - domain queries, mutations, and synchronization
//! - [`sync`] - the deferred sync trigger the service arms after mutations
//! - [`config`] - file-backed configuration
//! - [`models`] - restaurant and review records

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod service;
pub mod store;
pub mod sync;

pub use config::Config;
pub use service::{DirectoryService, ServiceError};
