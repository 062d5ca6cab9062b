//! Document store contract consumed by the adapter.
//!
//! A [`DocumentStore`] resolves collection handles by name; a
//! [`CollectionHandle`] runs the five primitives the adapter needs. Any backend
//! (MongoDB, a KV store, the bundled [`InMemoryDocumentStore`]) plugs in by
//! implementing these two traits.

mod compare;
mod in_memory;

use serde_json::Number;

use crate::error::StoreError;
use crate::id::StoreId;
use crate::model::Attributes;
use crate::query::{Filter, FindQuery};

pub use compare::{compare_ids, compare_values};
pub use in_memory::{InMemoryCollection, InMemoryDocumentStore};

/// A document as stored: the reserved identifier plus every other field.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub id: StoreId,
    pub fields: Attributes,
}

/// Acknowledgement of a mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteResult {
    pub matched: u64,
    pub modified: u64,
    pub deleted: u64,
    /// Id of the document created by an upsert.
    pub upserted: Option<StoreId>,
}

impl WriteResult {
    /// Documents touched by the write.
    pub fn affected(&self) -> u64 {
        self.matched + self.deleted + u64::from(self.upserted.is_some())
    }
}

/// Resolves collection handles by name.
pub trait DocumentStore: Send + Sync {
    type Collection: CollectionHandle;

    fn collection(&self, name: &str) -> Result<Self::Collection, StoreError>;
}

/// Operations on one store collection.
pub trait CollectionHandle {
    /// First matching document in natural order.
    fn find_one(&self, filter: &Filter) -> Result<Option<RawDocument>, StoreError>;

    /// Matching documents, sorted, skipped, limited and projected.
    fn find(&self, query: &FindQuery) -> Result<Vec<RawDocument>, StoreError>;

    /// Set every field of `set` on the document with `id`, inserting it if absent.
    fn upsert(&self, id: &StoreId, set: &Attributes) -> Result<WriteResult, StoreError>;

    /// Remove the document with `id`.
    fn delete(&self, id: &StoreId) -> Result<WriteResult, StoreError>;

    /// Atomically add `amount` to `attribute` of the document with `id`.
    fn increment(
        &self,
        id: &StoreId,
        attribute: &str,
        amount: &Number,
        upsert: bool,
    ) -> Result<WriteResult, StoreError>;
}
