//! Error type for store operations.

use tissdb_lite_query::ExpressionError;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The named collection does not exist.
    #[error("Collection '{name}' does not exist.")]
    CollectionNotFound {
        /// Collection name.
        name: String,
    },

    /// No document with the given `_id` exists in the collection.
    #[error("Item with id '{id}' not found in collection '{collection}'.")]
    ItemNotFound {
        /// Document id.
        id: String,
        /// Collection name.
        collection: String,
    },

    /// An update was requested for a document without a string `_id`.
    #[error("Item must contain a string '_id' field.")]
    MissingId,

    /// The condition could not be compiled or evaluated.
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// Reading or writing the data file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The data file could not be encoded or decoded.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
