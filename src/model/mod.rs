//! Models - attribute bags addressed by an identifier, grouped into collections.
//!
//! A [`Model`] is one addressable record; a [`Collection`] aggregates models of
//! one [`ModelSchema`] and drives multi-result queries. The adapter only reads
//! and writes attributes and the id field; it never restructures either.
//!
//! ## Example
//!
//! ```ignore
//! use docsync::{Model, ModelSchema};
//! use std::sync::Arc;
//!
//! let schema = Arc::new(ModelSchema::new("mymodel").collection("mymodels").index("name"));
//! let mut model = Model::new(schema);
//! model.set("name", "a");
//! assert!(model.is_new());
//! ```

mod collection;
mod schema;

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

pub use collection::{Collection, CollectionLink};
pub use schema::ModelSchema;

/// Attribute bag of a model, and the shape of normalized store documents.
pub type Attributes = serde_json::Map<String, Value>;

/// Typed structs that can be turned into models.
///
/// Usually derived with `#[derive(Document)]`.
pub trait Document: Serialize + DeserializeOwned {
    /// Static description of this type: collection, id attribute, indexes.
    fn schema() -> ModelSchema;
}

/// A single addressable record.
#[derive(Debug, Clone)]
pub struct Model {
    schema: Arc<ModelSchema>,
    attributes: Attributes,
    collection: Option<Arc<CollectionLink>>,
}

impl Model {
    pub fn new(schema: Arc<ModelSchema>) -> Self {
        Self::with_attributes(schema, Attributes::new())
    }

    pub fn with_attributes(schema: Arc<ModelSchema>, attributes: Attributes) -> Self {
        Self {
            schema,
            attributes,
            collection: None,
        }
    }

    /// Build a model from a typed document.
    pub fn from_document<D: Document>(document: &D) -> Result<Self, serde_json::Error> {
        let attributes = match serde_json::to_value(document)? {
            Value::Object(map) => map,
            other => {
                return Err(serde::ser::Error::custom(format!(
                    "document must serialize to an object, got {}",
                    other
                )))
            }
        };
        Ok(Self::with_attributes(Arc::new(D::schema()), attributes))
    }

    /// Read the attributes back as a typed document.
    pub fn to_document<D: Document>(&self) -> Result<D, serde_json::Error> {
        serde_json::from_value(Value::Object(self.attributes.clone()))
    }

    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    pub fn type_name(&self) -> &str {
        self.schema.type_name()
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(attribute.into(), value.into());
    }

    /// Merge `attributes` into this model, overwriting existing keys.
    pub fn set_all(&mut self, attributes: Attributes) {
        for (key, value) in attributes {
            self.attributes.insert(key, value);
        }
    }

    pub fn unset(&mut self, attribute: &str) -> Option<Value> {
        self.attributes.remove(attribute)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Value of the declared id attribute.
    pub fn id(&self) -> Option<&Value> {
        self.get(self.schema.id_attribute_name())
            .filter(|value| !value.is_null())
    }

    /// True until an identifier has been assigned.
    pub fn is_new(&self) -> bool {
        self.id().is_none()
    }

    /// Plain attribute map sent to the store.
    pub fn to_json(&self) -> Attributes {
        self.attributes.clone()
    }

    /// The collection this model belongs to, if any.
    pub fn collection(&self) -> Option<&CollectionLink> {
        self.collection.as_deref()
    }

    pub(crate) fn attach(&mut self, link: Arc<CollectionLink>) {
        self.collection = Some(link);
    }
}
