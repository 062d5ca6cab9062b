//! Adapter configuration.

use serde::Deserialize;

/// Page size used when a call does not set `limit`.
pub const DEFAULT_LIMIT: usize = 50;

/// The store's own per-document key.
pub const RESERVED_ID_FIELD: &str = "_id";

/// Configuration for an [`Adapter`](crate::Adapter). Read-only once the adapter
/// is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Page size for multi-result reads without a `limit`.
    pub default_limit: usize,

    /// Name of the store's reserved identifier field as it may appear in
    /// model attributes and `where` filters.
    pub reserved_id_field: String,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            reserved_id_field: RESERVED_ID_FIELD.to_string(),
        }
    }
}

impl AdapterConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default page size. Zero is treated as the built-in default.
    #[must_use]
    pub fn default_limit(mut self, limit: usize) -> Self {
        self.default_limit = if limit == 0 { DEFAULT_LIMIT } else { limit };
        self
    }

    /// Sets the reserved identifier field name.
    #[must_use]
    pub fn reserved_id_field(mut self, field: impl Into<String>) -> Self {
        self.reserved_id_field = field.into();
        self
    }
}
