mod adapter;
mod config;
mod error;
mod id;
mod model;
mod query;
mod store;
mod sync;

pub use adapter::{
    from_options, from_related, from_target, normalize, normalize_all, resolve_collection, Ack,
    Adapter, CollectionResolver, Fetched, Saved, Target, DEFAULT_RESOLVERS,
};
pub use config::{AdapterConfig, DEFAULT_LIMIT, RESERVED_ID_FIELD};
pub use error::{BoxError, StoreError, SyncError, SyncResult};
pub use id::{
    coerce_id, create_id, resolve_id, IdGenerator, ObjectId, ParseObjectIdError, StoreId,
    OBJECT_ID_HEX_LEN,
};
pub use model::{Attributes, Collection, CollectionLink, Document, Model, ModelSchema};
pub use query::{
    plan_find, translate_filter, translate_projection, translate_sort, Direction, Filter,
    FindQuery, IdRange, IncOptions, Projection, QueryOptions, SortField, SortKey, SortPlan,
    SortSpec,
};
pub use store::{
    compare_ids, compare_values, CollectionHandle, DocumentStore, InMemoryCollection,
    InMemoryDocumentStore, RawDocument, WriteResult,
};
pub use sync::{CollectionSyncExt, ModelSyncExt, Response, SyncMethod, SyncTarget};

// Derive macro for typed documents; shares its name with the trait it implements.
pub use docsync_macros::Document;
