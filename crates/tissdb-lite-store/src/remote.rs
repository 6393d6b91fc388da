//! Boundary to a remote document store.

use std::fmt;

use serde::{Deserialize, Serialize};
use tissdb_lite_query::Filter;

use crate::document::Document;
use crate::error::StoreResult;

/// A document store that evaluates [`Filter`]s on its own side.
pub trait RemoteStore: Send + Sync + fmt::Debug {
    /// Return the documents of `collection` matching `filter`, or all of
    /// them when `filter` is `None`.
    ///
    /// # Errors
    ///
    /// Implementation specific; typically `StoreError::CollectionNotFound`.
    fn query(&self, collection: &str, filter: Option<&Filter>) -> StoreResult<Vec<Document>>;
}

/// A query to delegate to the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryCommand {
    /// Collection to query.
    pub collection: String,
    /// Condition text; empty selects every document.
    #[serde(default, alias = "condition_string")]
    pub condition: String,
}

impl QueryCommand {
    /// Build a command.
    #[must_use]
    pub fn new(collection: impl Into<String>, condition: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            condition: condition.into(),
        }
    }
}
