//! Operation dispatcher - maps model persistence calls onto store primitives.
//!
//! Every operation is one self-contained call: resolve the collection, resolve
//! identifiers, translate options, issue one store call (two handle lookups at
//! most for create-then-update), normalize the result. Returning is the single
//! completion signal. Usage errors are returned before any store call.
//!
//! ## Example
//!
//! ```ignore
//! use docsync::{Adapter, InMemoryDocumentStore, Model, ModelSchema, QueryOptions};
//! use std::sync::Arc;
//!
//! let adapter = Adapter::new(InMemoryDocumentStore::new());
//! let schema = Arc::new(ModelSchema::new("mymodel").collection("mymodels"));
//!
//! let mut model = Model::new(Arc::clone(&schema));
//! model.set("name", "a");
//! adapter.create(&mut model, &QueryOptions::new())?;
//!
//! let fetched = adapter.find(&model, &QueryOptions::new())?;
//! ```

mod normalize;
mod resolver;

use serde_json::{Number, Value};
use tracing::debug;

use crate::config::AdapterConfig;
use crate::error::{SyncError, SyncResult};
use crate::id::{create_id, resolve_id, StoreId};
use crate::model::{Attributes, Collection, Model, ModelSchema};
use crate::query::{plan_find, translate_filter, QueryOptions};
use crate::store::{CollectionHandle, DocumentStore, WriteResult};

pub use normalize::{normalize, normalize_all};
pub use resolver::{
    from_options, from_related, from_target, resolve_collection, CollectionResolver,
    DEFAULT_RESOLVERS,
};

/// What an operation acts on.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Model(&'a Model),
    Collection(&'a Collection),
}

impl<'a> Target<'a> {
    pub fn schema(self) -> &'a ModelSchema {
        match self {
            Target::Model(model) => model.schema(),
            Target::Collection(collection) => collection.schema(),
        }
    }

    pub fn type_name(self) -> &'a str {
        match self {
            Target::Model(model) => model.type_name(),
            Target::Collection(collection) => collection.type_name(),
        }
    }
}

impl<'a> From<&'a Model> for Target<'a> {
    fn from(model: &'a Model) -> Self {
        Target::Model(model)
    }
}

impl<'a> From<&'a Collection> for Target<'a> {
    fn from(collection: &'a Collection) -> Self {
        Target::Collection(collection)
    }
}

/// Result of a multi-result read.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    /// First match of a bare-model lookup.
    One(Attributes),
    /// Every match of a collection read.
    Many(Vec<Attributes>),
}

impl Fetched {
    pub fn into_many(self) -> Vec<Attributes> {
        match self {
            Fetched::One(row) => vec![row],
            Fetched::Many(rows) => rows,
        }
    }
}

/// Normalized acknowledgement of a delete or increment.
#[derive(Debug, Clone, PartialEq)]
pub struct Ack {
    /// 1 when the write touched a document or failures are ignored, else 0.
    pub signal: u64,
    pub raw: WriteResult,
}

impl Ack {
    fn new(raw: WriteResult, ignore_failures: bool) -> Self {
        let signal = u64::from(raw.affected() > 0 || ignore_failures);
        Self { signal, raw }
    }

    pub fn is_success(&self) -> bool {
        self.signal > 0
    }
}

/// Result of create/update.
#[derive(Debug, Clone, PartialEq)]
pub enum Saved {
    /// Full upsert; `data` echoes the written attributes.
    Replaced { data: Attributes, raw: WriteResult },
    /// Redirected to an atomic increment.
    Incremented(Ack),
}

impl Saved {
    pub fn data(&self) -> Option<&Attributes> {
        match self {
            Saved::Replaced { data, .. } => Some(data),
            Saved::Incremented(_) => None,
        }
    }

    pub fn raw(&self) -> &WriteResult {
        match self {
            Saved::Replaced { raw, .. } => raw,
            Saved::Incremented(ack) => &ack.raw,
        }
    }
}

/// The sync adapter. Holds the injected store and read-only configuration.
pub struct Adapter<S> {
    store: S,
    config: AdapterConfig,
    resolvers: Vec<CollectionResolver>,
}

impl<S: DocumentStore> Adapter<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, AdapterConfig::default())
    }

    pub fn with_config(store: S, config: AdapterConfig) -> Self {
        Self {
            store,
            config,
            resolvers: DEFAULT_RESOLVERS.to_vec(),
        }
    }

    /// Replace the collection resolution strategies, tried in order.
    #[must_use]
    pub fn resolvers(mut self, resolvers: Vec<CollectionResolver>) -> Self {
        self.resolvers = resolvers;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn reserved(&self) -> &str {
        &self.config.reserved_id_field
    }

    fn collection(&self, options: &QueryOptions, target: Target<'_>) -> SyncResult<S::Collection> {
        let name = resolve_collection(&self.resolvers, options, target)?;
        debug!(model_type = target.type_name(), collection = %name, "resolved collection");
        Ok(self.store.collection(&name)?)
    }

    fn require_id(&self, model: &Model) -> SyncResult<StoreId> {
        resolve_id(model, self.reserved()).ok_or_else(|| SyncError::MissingId {
            model_type: model.type_name().to_string(),
        })
    }

    /// Read one document: the `where` filter when given, else the model's id.
    pub fn find(&self, model: &Model, options: &QueryOptions) -> SyncResult<Attributes> {
        let reserved = self.reserved();
        let id_attribute = model.schema().id_attribute_name();
        let default_id = match options.filter {
            Some(_) => None,
            None => Some(resolve_id(model, reserved).ok_or_else(|| not_found(model))?),
        };
        let filter = translate_filter(
            options.filter.as_ref(),
            default_id,
            options,
            id_attribute,
            reserved,
        )?;

        debug!(model_type = model.type_name(), filter = ?filter, "find");
        let collection = self.collection(options, Target::Model(model))?;
        match collection.find_one(&filter)? {
            Some(document) => Ok(normalize(document, id_attribute, reserved)),
            None => Err(not_found(model)),
        }
    }

    /// Read many documents.
    ///
    /// On a bare model without a `where`, the filter is built from the set
    /// indexed attributes and only the first match is returned.
    pub fn find_all(&self, target: Target<'_>, options: &QueryOptions) -> SyncResult<Fetched> {
        let reserved = self.reserved();
        let id_attribute = target.schema().id_attribute_name();

        let synthesized;
        let conditions = match (target, options.filter.as_ref()) {
            (_, Some(filter)) => Some(filter),
            (Target::Model(model), None) => {
                debug!(model_type = model.type_name(), "fetch model by indexed attributes");
                synthesized = indexed_conditions(model)?;
                Some(&synthesized)
            }
            (Target::Collection(_), None) => None,
        };
        let query = plan_find(
            conditions,
            options,
            id_attribute,
            reserved,
            self.config.default_limit,
        )?;

        debug!(
            model_type = target.type_name(),
            filter = ?query.filter,
            limit = query.limit,
            offset = query.skip,
            sort = ?query.sort,
            projection = ?query.projection,
            "find_all"
        );
        let collection = self.collection(options, target)?;
        let rows = normalize_all(collection.find(&query)?, id_attribute, reserved);

        match target {
            Target::Model(model) => rows
                .into_iter()
                .next()
                .map(Fetched::One)
                .ok_or_else(|| not_found(model)),
            Target::Collection(_) => Ok(Fetched::Many(rows)),
        }
    }

    /// Assign an id to a new model, then write it as an update.
    pub fn create(&self, model: &mut Model, options: &QueryOptions) -> SyncResult<Saved> {
        if model.is_new() {
            create_id(model)?;
            debug!(model_type = model.type_name(), id = ?model.id(), "create");
        }
        self.write(model, options)
    }

    /// Assign a fresh id to `model` without writing it.
    pub fn create_id(&self, model: &mut Model) -> SyncResult<()> {
        create_id(model)
    }

    /// Upsert the model's attributes, or increment when `inc` is set.
    /// New models are redirected to [`create`](Self::create).
    pub fn update(&self, model: &mut Model, options: &QueryOptions) -> SyncResult<Saved> {
        if model.is_new() {
            return self.create(model, options);
        }
        self.write(model, options)
    }

    fn write(&self, model: &Model, options: &QueryOptions) -> SyncResult<Saved> {
        if options.inc.is_some() {
            return self.inc(model, options).map(Saved::Incremented);
        }

        let reserved = self.reserved();
        let id = self.require_id(model)?;
        let collection = self.collection(options, Target::Model(model))?;

        let mut data = model.to_json();
        data.remove(reserved);
        debug!(model_type = model.type_name(), id = %id, "update");
        let raw = collection.upsert(&id, &data)?;

        if model.schema().id_attribute_name() == reserved {
            data.insert(reserved.to_string(), id.to_value());
        }
        Ok(Saved::Replaced { data, raw })
    }

    /// Delete the model's document. New models are a no-op returning `None`.
    pub fn destroy(&self, model: &Model, options: &QueryOptions) -> SyncResult<Option<Ack>> {
        if model.is_new() {
            debug!(model_type = model.type_name(), "destroy skipped for new model");
            return Ok(None);
        }
        let id = self.require_id(model)?;
        let collection = self.collection(options, Target::Model(model))?;

        debug!(model_type = model.type_name(), id = %id, "destroy");
        let raw = collection.delete(&id)?;
        Ok(Some(Ack::new(raw, options.ignore_failures)))
    }

    /// Atomically add `inc.amount` (default 1) to `inc.attribute`.
    pub fn inc(&self, model: &Model, options: &QueryOptions) -> SyncResult<Ack> {
        let inc = options.inc.as_ref();
        let Some(attribute) = inc
            .and_then(|inc| inc.attribute.as_deref())
            .filter(|attribute| !attribute.is_empty())
        else {
            return Err(SyncError::MissingIncrementAttribute);
        };
        let amount = inc
            .and_then(|inc| inc.amount.clone())
            .unwrap_or_else(|| Number::from(1));

        let id = self.require_id(model)?;
        let collection = self.collection(options, Target::Model(model))?;

        debug!(model_type = model.type_name(), id = %id, attribute, amount = %amount, "inc");
        let raw = collection.increment(&id, attribute, &amount, options.upsert)?;
        Ok(Ack::new(raw, options.ignore_failures))
    }
}

fn not_found(model: &Model) -> SyncError {
    let id = match model.id() {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "undefined".to_string(),
    };
    SyncError::NotFound {
        model_type: model.type_name().to_string(),
        id,
    }
}

fn indexed_conditions(model: &Model) -> SyncResult<Attributes> {
    let schema = model.schema();
    let conditions: Attributes = model
        .attributes()
        .iter()
        .filter(|(attribute, _)| schema.is_indexed(attribute))
        .map(|(attribute, value)| (attribute.clone(), value.clone()))
        .collect();

    if conditions.is_empty() {
        return Err(SyncError::UnscopedQuery {
            model_type: model.type_name().to_string(),
            attributes: Value::Object(conditions).to_string(),
        });
    }
    Ok(conditions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BoxError, StoreError};
    use crate::id::ObjectId;
    use crate::query::IncOptions;
    use crate::store::InMemoryDocumentStore;
    use serde_json::json;
    use std::sync::Arc;

    fn schema() -> Arc<ModelSchema> {
        Arc::new(
            ModelSchema::new("mymodel")
                .collection("mymodels")
                .index("email"),
        )
    }

    fn adapter() -> Adapter<InMemoryDocumentStore> {
        Adapter::new(InMemoryDocumentStore::new())
    }

    fn model_with(attrs: Value) -> Model {
        let Value::Object(attrs) = attrs else {
            panic!("expected object");
        };
        Model::with_attributes(schema(), attrs)
    }

    #[test]
    fn create_assigns_object_id_and_upserts() {
        let adapter = adapter();
        let mut model = model_with(json!({"data": "foo", "counter": 5}));

        let saved = adapter.create(&mut model, &QueryOptions::new()).unwrap();
        let id = model.id().cloned().unwrap();
        assert!(ObjectId::parse_str(id.as_str().unwrap()).is_ok());
        assert!(saved.raw().upserted.is_some());
        assert_eq!(saved.data().unwrap().get("data"), Some(&json!("foo")));

        let docs = adapter.store().documents("mymodels").unwrap();
        assert_eq!(docs.len(), 1);
        assert!(matches!(docs[0].id, StoreId::Object(_)));
    }

    #[test]
    fn create_keeps_existing_id() {
        let adapter = adapter();
        let mut model = model_with(json!({"id": 1, "asd": "das"}));
        adapter.create(&mut model, &QueryOptions::new()).unwrap();
        assert_eq!(model.id(), Some(&json!(1)));

        let docs = adapter.store().documents("mymodels").unwrap();
        assert_eq!(docs[0].id, StoreId::Value(json!(1)));
    }

    #[test]
    fn update_on_new_model_creates() {
        let adapter = adapter();
        let mut model = model_with(json!({"data": "x"}));
        adapter.update(&mut model, &QueryOptions::new()).unwrap();
        assert!(!model.is_new());
        assert_eq!(adapter.store().documents("mymodels").unwrap().len(), 1);
    }

    #[test]
    fn update_strips_reserved_field_from_payload() {
        let adapter = adapter();
        let mut model = model_with(json!({"id": 3, "_id": 3, "data": "x"}));
        let saved = adapter.update(&mut model, &QueryOptions::new()).unwrap();
        assert!(!saved.data().unwrap().contains_key("_id"));
    }

    #[test]
    fn update_echoes_reserved_id_attribute() {
        let adapter = adapter();
        let schema = Arc::new(ModelSchema::new("raw").collection("raws").id_attribute("_id"));
        let mut model = Model::new(schema);
        model.set("name", "n");
        let saved = adapter.create(&mut model, &QueryOptions::new()).unwrap();
        assert_eq!(saved.data().unwrap().get("_id"), model.id());

        let fetched = adapter.find(&model, &QueryOptions::new()).unwrap();
        assert_eq!(fetched.get("_id"), model.id());
        assert_eq!(fetched.get("name"), Some(&json!("n")));
    }

    #[test]
    fn find_by_id_normalizes() {
        let adapter = adapter();
        let mut model = model_with(json!({"name": "a"}));
        adapter.create(&mut model, &QueryOptions::new()).unwrap();

        let mut lookup = Model::new(schema());
        lookup.set("id", model.id().cloned().unwrap());
        let found = adapter.find(&lookup, &QueryOptions::new()).unwrap();
        assert_eq!(found.get("name"), Some(&json!("a")));
        assert_eq!(found.get("id"), model.id());
        assert!(!found.contains_key("_id"));
    }

    #[test]
    fn find_missing_is_not_found() {
        let adapter = adapter();
        let mut lookup = Model::new(schema());
        lookup.set("id", 99);
        let err = adapter.find(&lookup, &QueryOptions::new()).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "mymodel (99) not found (read)");
    }

    #[test]
    fn find_without_id_fails_before_store_call() {
        let adapter = adapter();
        let err = adapter.find(&Model::new(schema()), &QueryOptions::new()).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(adapter.store().call_count(), 0);
    }

    #[test]
    fn find_with_where() {
        let adapter = adapter();
        let mut model = model_with(json!({"id": 1, "name": "a"}));
        adapter.create(&mut model, &QueryOptions::new()).unwrap();

        let options = QueryOptions::new().where_eq("name", "a");
        let found = adapter.find(&Model::new(schema()), &options).unwrap();
        assert_eq!(found.get("id"), Some(&json!(1)));
    }

    #[test]
    fn bare_model_find_all_uses_indexed_attributes() {
        let adapter = adapter();
        let mut model = model_with(json!({"id": 1, "email": "a@x", "name": "a"}));
        adapter.create(&mut model, &QueryOptions::new()).unwrap();

        let lookup = model_with(json!({"email": "a@x", "name": "ignored"}));
        let fetched = adapter.find_all(Target::Model(&lookup), &QueryOptions::new()).unwrap();
        match fetched {
            Fetched::One(row) => assert_eq!(row.get("name"), Some(&json!("a"))),
            other => panic!("expected one row, got {other:?}"),
        }

        let missing = model_with(json!({"email": "b@x"}));
        let err = adapter
            .find_all(Target::Model(&missing), &QueryOptions::new())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn unscoped_bare_model_find_all_makes_no_store_call() {
        let adapter = adapter();
        let lookup = model_with(json!({"name": "not indexed"}));
        let err = adapter
            .find_all(Target::Model(&lookup), &QueryOptions::new())
            .unwrap_err();
        assert!(matches!(err, SyncError::UnscopedQuery { .. }));
        assert_eq!(adapter.store().call_count(), 0);
    }

    #[test]
    fn unresolved_collection_makes_no_store_call() {
        let adapter = adapter();
        let mut model = Model::new(Arc::new(ModelSchema::new("orphan")));
        model.set("id", 1);
        let err = adapter.update(&mut model, &QueryOptions::new()).unwrap_err();
        assert!(matches!(err, SyncError::UnresolvedCollection { .. }));
        assert_eq!(adapter.store().call_count(), 0);
    }

    #[test]
    fn conflicting_cursors_make_no_store_call() {
        let adapter = adapter();
        let collection = Collection::new(schema());
        let options = QueryOptions::new().after_id(1).before_id(3);
        let err = adapter
            .find_all(Target::Collection(&collection), &options)
            .unwrap_err();
        assert!(matches!(err, SyncError::ConflictingCursors));
        assert_eq!(adapter.store().call_count(), 0);
    }

    #[test]
    fn inc_requires_attribute() {
        let adapter = adapter();
        let model = model_with(json!({"id": 1}));
        let options = QueryOptions::new().inc(IncOptions::default());
        let err = adapter.inc(&model, &options).unwrap_err();
        assert!(matches!(err, SyncError::MissingIncrementAttribute));
        assert_eq!(adapter.store().call_count(), 0);
    }

    #[test]
    fn update_with_inc_increments() {
        let adapter = adapter();
        let mut model = model_with(json!({"id": 1, "counter": 5}));
        adapter.create(&mut model, &QueryOptions::new()).unwrap();

        let mut target = model_with(json!({"id": 1}));
        let options = QueryOptions::new().inc(IncOptions::new("counter"));
        let saved = adapter.update(&mut target, &options).unwrap();
        assert!(matches!(saved, Saved::Incremented(ref ack) if ack.is_success()));

        let options = QueryOptions::new().inc(IncOptions::new("counter").amount(4));
        adapter.update(&mut target, &options).unwrap();

        let found = adapter.find(&target, &QueryOptions::new()).unwrap();
        assert_eq!(found.get("counter"), Some(&json!(10)));
    }

    #[test]
    fn explicit_zero_increment_is_kept() {
        let adapter = adapter();
        let mut model = model_with(json!({"id": 1, "counter": 5}));
        adapter.create(&mut model, &QueryOptions::new()).unwrap();

        let options = QueryOptions::new().inc(IncOptions::new("counter").amount(0));
        let ack = adapter.inc(&model, &options).unwrap();
        assert_eq!(ack.signal, 1);

        let found = adapter.find(&model, &QueryOptions::new()).unwrap();
        assert_eq!(found.get("counter"), Some(&json!(5)));
    }

    #[test]
    fn inc_on_missing_document() {
        let adapter = adapter();
        let model = model_with(json!({"id": 7}));
        let options = QueryOptions::new().inc(IncOptions::new("hits"));

        let ack = adapter.inc(&model, &options).unwrap();
        assert_eq!(ack.signal, 0);

        let ack = adapter.inc(&model, &options.clone().ignore_failures(true)).unwrap();
        assert_eq!(ack.signal, 1);
        assert!(adapter.find(&model, &QueryOptions::new()).unwrap_err().is_not_found());

        let ack = adapter.inc(&model, &options.upsert(true)).unwrap();
        assert_eq!(ack.signal, 1);
        let found = adapter.find(&model, &QueryOptions::new()).unwrap();
        assert_eq!(found.get("hits"), Some(&json!(1)));
    }

    #[test]
    fn destroy_new_model_is_noop() {
        let adapter = adapter();
        let model = model_with(json!({"name": "never saved"}));
        assert_eq!(adapter.destroy(&model, &QueryOptions::new()).unwrap(), None);
        assert_eq!(adapter.store().call_count(), 0);
    }

    #[test]
    fn destroy_signals() {
        let adapter = adapter();
        let mut model = model_with(json!({"id": 1}));
        adapter.create(&mut model, &QueryOptions::new()).unwrap();

        let ack = adapter.destroy(&model, &QueryOptions::new()).unwrap().unwrap();
        assert_eq!(ack.signal, 1);
        assert_eq!(ack.raw.deleted, 1);

        let ack = adapter.destroy(&model, &QueryOptions::new()).unwrap().unwrap();
        assert_eq!(ack.signal, 0);

        let options = QueryOptions::new().ignore_failures(true);
        let ack = adapter.destroy(&model, &options).unwrap().unwrap();
        assert_eq!(ack.signal, 1);
        assert_eq!(ack.raw.deleted, 0);
    }

    #[test]
    fn generator_error_stops_create() {
        let adapter = adapter();
        let schema = ModelSchema::new("seq")
            .collection("seqs")
            .id_generator(|| -> Result<Value, BoxError> { Err("no ids left".into()) });
        let mut model = Model::new(Arc::new(schema));
        let err = adapter.create(&mut model, &QueryOptions::new()).unwrap_err();
        assert!(matches!(err, SyncError::IdGeneration(_)));
        assert_eq!(adapter.store().call_count(), 0);
    }

    struct FailingStore;

    struct FailingCollection;

    impl DocumentStore for FailingStore {
        type Collection = FailingCollection;

        fn collection(&self, _name: &str) -> Result<FailingCollection, StoreError> {
            Ok(FailingCollection)
        }
    }

    impl CollectionHandle for FailingCollection {
        fn find_one(
            &self,
            _filter: &crate::query::Filter,
        ) -> Result<Option<crate::store::RawDocument>, StoreError> {
            Err(StoreError::Storage("connection reset".into()))
        }

        fn find(
            &self,
            _query: &crate::query::FindQuery,
        ) -> Result<Vec<crate::store::RawDocument>, StoreError> {
            Err(StoreError::Storage("connection reset".into()))
        }

        fn upsert(&self, _id: &StoreId, _set: &Attributes) -> Result<WriteResult, StoreError> {
            Err(StoreError::Storage("connection reset".into()))
        }

        fn delete(&self, _id: &StoreId) -> Result<WriteResult, StoreError> {
            Err(StoreError::Storage("connection reset".into()))
        }

        fn increment(
            &self,
            _id: &StoreId,
            _attribute: &str,
            _amount: &Number,
            _upsert: bool,
        ) -> Result<WriteResult, StoreError> {
            Err(StoreError::Storage("connection reset".into()))
        }
    }

    #[test]
    fn store_errors_pass_through_even_when_ignoring_failures() {
        let adapter = Adapter::new(FailingStore);
        let model = model_with(json!({"id": 1}));
        let options = QueryOptions::new().ignore_failures(true);

        let err = adapter.destroy(&model, &options).unwrap_err();
        assert!(matches!(err, SyncError::Store(StoreError::Storage(ref m)) if m == "connection reset"));

        let err = adapter
            .inc(&model, &options.inc(IncOptions::new("n")))
            .unwrap_err();
        assert!(matches!(err, SyncError::Store(_)));

        let err = adapter.find(&model, &QueryOptions::new()).unwrap_err();
        assert!(matches!(err, SyncError::Store(_)));
    }
}
