use thiserror::Error;

/// Boxed error returned by custom identifier generators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for adapter operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors surfaced by the adapter.
///
/// Usage errors are detected before any store call is made. Store errors are
/// passed through untouched.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A bare model was fetched without a `where` filter and none of its
    /// indexed attributes are set.
    #[error("cannot fetch model {model_type} with given attributes {attributes}")]
    UnscopedQuery {
        model_type: String,
        attributes: String,
    },

    /// No resolver produced a collection name.
    #[error("cannot get collection for {model_type}")]
    UnresolvedCollection { model_type: String },

    /// An increment was requested without naming the attribute.
    #[error("inc settings must be defined")]
    MissingIncrementAttribute,

    /// Both `after_id` and `before_id` were supplied.
    #[error("after_id and before_id cannot be combined")]
    ConflictingCursors,

    /// A write verb was sent to a collection.
    #[error("{method} is not supported on collection {model_type}")]
    UnsupportedMethod {
        method: &'static str,
        model_type: String,
    },

    /// A persisted model has no usable identifier.
    #[error("{model_type} has no identifier")]
    MissingId { model_type: String },

    /// A read matched no document.
    #[error("{model_type} ({id}) not found (read)")]
    NotFound { model_type: String, id: String },

    /// The identifier generator failed or produced an empty value.
    #[error("identifier generation failed: {0}")]
    IdGeneration(#[source] BoxError),

    /// Store transport failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Returns true for the synthesized not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::NotFound { .. })
    }
}

/// Errors raised by a document store implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The underlying lock primitive was poisoned.
    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),
    /// Storage-level error.
    #[error("store error: {0}")]
    Storage(String),
}
