//! InMemoryDocumentStore - HashMap-backed document store for testing and development.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{Number, Value};

use super::compare::{compare_ids, compare_values, id_rank};
use super::{CollectionHandle, DocumentStore, RawDocument, WriteResult};
use crate::error::StoreError;
use crate::id::StoreId;
use crate::model::Attributes;
use crate::query::{Direction, Filter, FindQuery, Projection, SortField, SortPlan};

/// The store's own key; `$set`-style writes never touch it.
const NATIVE_ID_FIELD: &str = "_id";

type Collections = HashMap<String, Vec<RawDocument>>;

/// In-memory document store.
///
/// Collections are created on first use and keep documents in insertion
/// order, which is the natural order of unsorted reads. Clone-friendly via Arc;
/// clones share both the data and the call counter.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<Collections>>,
    calls: Arc<AtomicU64>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store calls made so far (handle lookups included).
    pub fn call_count(&self) -> u64 {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    /// Snapshot of a collection in natural order.
    pub fn documents(&self, collection: &str) -> Result<Vec<RawDocument>, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::LockPoisoned("snapshot"))?;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }
}

impl DocumentStore for InMemoryDocumentStore {
    type Collection = InMemoryCollection;

    fn collection(&self, name: &str) -> Result<InMemoryCollection, StoreError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        if name.is_empty() {
            return Err(StoreError::Storage("collection name must not be empty".into()));
        }
        Ok(InMemoryCollection {
            name: name.to_string(),
            collections: Arc::clone(&self.collections),
            calls: Arc::clone(&self.calls),
        })
    }
}

/// Handle on one collection of an [`InMemoryDocumentStore`].
#[derive(Clone)]
pub struct InMemoryCollection {
    name: String,
    collections: Arc<RwLock<Collections>>,
    calls: Arc<AtomicU64>,
}

impl InMemoryCollection {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn read(&self, operation: &'static str) -> Result<RwLockReadGuard<'_, Collections>, StoreError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.collections
            .read()
            .map_err(|_| StoreError::LockPoisoned(operation))
    }

    fn write(
        &self,
        operation: &'static str,
    ) -> Result<RwLockWriteGuard<'_, Collections>, StoreError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.collections
            .write()
            .map_err(|_| StoreError::LockPoisoned(operation))
    }
}

fn same_id(a: &StoreId, b: &StoreId) -> bool {
    compare_ids(a, b) == Ordering::Equal
}

/// Strict bounds only match ids of the same type class.
fn bounded(id: &StoreId, bound: &StoreId, expected: Ordering) -> bool {
    id_rank(id) == id_rank(bound) && compare_ids(id, bound) == expected
}

fn matches(document: &RawDocument, filter: &Filter) -> bool {
    let range = &filter.id;
    if let Some(eq) = &range.eq {
        if !same_id(&document.id, eq) {
            return false;
        }
    }
    if let Some(gt) = &range.gt {
        if !bounded(&document.id, gt, Ordering::Greater) {
            return false;
        }
    }
    if let Some(lt) = &range.lt {
        if !bounded(&document.id, lt, Ordering::Less) {
            return false;
        }
    }

    filter.fields.iter().all(|(field, expected)| {
        let actual = document.fields.get(field).unwrap_or(&Value::Null);
        compare_values(actual, expected) == Ordering::Equal
    })
}

fn compare_documents(a: &RawDocument, b: &RawDocument, plan: &SortPlan) -> Ordering {
    plan.keys()
        .iter()
        .map(|key| {
            let ordering = match &key.field {
                SortField::Id => compare_ids(&a.id, &b.id),
                SortField::Attribute(name) => {
                    let left = a.fields.get(name).unwrap_or(&Value::Null);
                    let right = b.fields.get(name).unwrap_or(&Value::Null);
                    compare_values(left, right)
                }
            };
            match key.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn project(document: RawDocument, projection: &Projection) -> RawDocument {
    match projection {
        Projection::All => document,
        Projection::Include(fields) => {
            let kept: Attributes = fields
                .iter()
                .filter_map(|field| {
                    document
                        .fields
                        .get(field)
                        .map(|value| (field.clone(), value.clone()))
                })
                .collect();
            RawDocument {
                id: document.id,
                fields: kept,
            }
        }
    }
}

fn add_numbers(current: &Number, amount: &Number) -> Result<Number, StoreError> {
    if let (Some(a), Some(b)) = (current.as_i64(), amount.as_i64()) {
        if let Some(sum) = a.checked_add(b) {
            return Ok(Number::from(sum));
        }
    }
    let sum = current.as_f64().unwrap_or(0.0) + amount.as_f64().unwrap_or(0.0);
    Number::from_f64(sum).ok_or_else(|| StoreError::Storage(format!("increment overflowed to {}", sum)))
}

impl CollectionHandle for InMemoryCollection {
    fn find_one(&self, filter: &Filter) -> Result<Option<RawDocument>, StoreError> {
        let collections = self.read("find_one")?;
        Ok(collections
            .get(&self.name)
            .and_then(|documents| documents.iter().find(|document| matches(document, filter)))
            .cloned())
    }

    fn find(&self, query: &FindQuery) -> Result<Vec<RawDocument>, StoreError> {
        let collections = self.read("find")?;
        let Some(documents) = collections.get(&self.name) else {
            return Ok(Vec::new());
        };

        let mut results: Vec<&RawDocument> = documents
            .iter()
            .filter(|document| matches(document, &query.filter))
            .collect();
        if !query.sort.is_natural() {
            results.sort_by(|a, b| compare_documents(a, b, &query.sort));
        }

        Ok(results
            .into_iter()
            .skip(query.skip)
            .take(query.limit)
            .map(|document| project(document.clone(), &query.projection))
            .collect())
    }

    fn upsert(&self, id: &StoreId, set: &Attributes) -> Result<WriteResult, StoreError> {
        let mut collections = self.write("upsert")?;
        let documents = collections.entry(self.name.clone()).or_default();
        let fields = set
            .iter()
            .filter(|(field, _)| field.as_str() != NATIVE_ID_FIELD)
            .map(|(field, value)| (field.clone(), value.clone()));

        match documents.iter_mut().find(|document| same_id(&document.id, id)) {
            Some(document) => {
                let mut modified = false;
                for (field, value) in fields {
                    if document.fields.get(&field) != Some(&value) {
                        document.fields.insert(field, value);
                        modified = true;
                    }
                }
                Ok(WriteResult {
                    matched: 1,
                    modified: u64::from(modified),
                    ..WriteResult::default()
                })
            }
            None => {
                documents.push(RawDocument {
                    id: id.clone(),
                    fields: fields.collect(),
                });
                Ok(WriteResult {
                    upserted: Some(id.clone()),
                    ..WriteResult::default()
                })
            }
        }
    }

    fn delete(&self, id: &StoreId) -> Result<WriteResult, StoreError> {
        let mut collections = self.write("delete")?;
        let deleted = match collections.get_mut(&self.name) {
            Some(documents) => match documents.iter().position(|document| same_id(&document.id, id)) {
                Some(position) => {
                    documents.remove(position);
                    1
                }
                None => 0,
            },
            None => 0,
        };
        Ok(WriteResult {
            deleted,
            ..WriteResult::default()
        })
    }

    fn increment(
        &self,
        id: &StoreId,
        attribute: &str,
        amount: &Number,
        upsert: bool,
    ) -> Result<WriteResult, StoreError> {
        let mut collections = self.write("increment")?;
        let documents = collections.entry(self.name.clone()).or_default();

        match documents.iter_mut().find(|document| same_id(&document.id, id)) {
            Some(document) => {
                let next = match document.fields.get(attribute) {
                    None | Some(Value::Null) => amount.clone(),
                    Some(Value::Number(current)) => add_numbers(current, amount)?,
                    Some(other) => {
                        return Err(StoreError::Storage(format!(
                            "cannot increment non-numeric field {} ({})",
                            attribute, other
                        )))
                    }
                };
                document
                    .fields
                    .insert(attribute.to_string(), Value::Number(next));
                Ok(WriteResult {
                    matched: 1,
                    modified: 1,
                    ..WriteResult::default()
                })
            }
            None if upsert => {
                let mut fields = Attributes::new();
                fields.insert(attribute.to_string(), Value::Number(amount.clone()));
                documents.push(RawDocument {
                    id: id.clone(),
                    fields,
                });
                Ok(WriteResult {
                    upserted: Some(id.clone()),
                    ..WriteResult::default()
                })
            }
            None => Ok(WriteResult::default()),
        }
    }
}
