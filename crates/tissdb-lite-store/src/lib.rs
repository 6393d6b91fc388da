//! Collection store for TissDB Lite.
//!
//! Documents are JSON objects grouped into named collections. Conditions are
//! compiled by `tissdb-lite-query` and either evaluated locally or shipped to
//! a [`RemoteStore`] as a [`tissdb_lite_query::Filter`].

pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod persistence;
pub mod remote;

pub use config::StoreConfig;
pub use database::{Collection, Database};
pub use document::Document;
pub use error::{StoreError, StoreResult};
pub use remote::{QueryCommand, RemoteStore};
