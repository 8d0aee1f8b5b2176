//! REST client module for the restaurant data server.
//!
//! This module provides the `ApiClient` for fetching the restaurant and
//! review collections and pushing local mutations back, plus the
//! `RecordSource`/`RemoteWriter` seams the cache and service layers depend
//! on so the remote side can be stubbed out.

pub mod client;
pub mod error;
pub mod remote;

pub use client::ApiClient;
pub use error::ApiError;
pub use remote::{RecordSource, RemoteWriter};
