use std::sync::Arc;

use serde_json::Value;

use super::{Attributes, Model, ModelSchema};

/// What a model knows about the collection that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionLink {
    pub type_name: String,
    /// Store collection declared on the collection type itself.
    pub collection: Option<String>,
}

/// An ordered group of models sharing one schema.
#[derive(Debug, Clone)]
pub struct Collection {
    schema: Arc<ModelSchema>,
    link: Arc<CollectionLink>,
    models: Vec<Model>,
}

impl Collection {
    pub fn new(schema: Arc<ModelSchema>) -> Self {
        let link = CollectionLink {
            type_name: schema.type_name().to_string(),
            collection: None,
        };
        Self {
            schema,
            link: Arc::new(link),
            models: Vec::new(),
        }
    }

    /// Declare the store collection on the collection type, taking precedence
    /// over the one declared on the model schema.
    #[must_use]
    pub fn named(mut self, collection: impl Into<String>) -> Self {
        let link = CollectionLink {
            type_name: self.link.type_name.clone(),
            collection: Some(collection.into()),
        };
        self.link = Arc::new(link);
        for model in &mut self.models {
            model.attach(Arc::clone(&self.link));
        }
        self
    }

    /// Schema of the models this collection holds.
    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    pub fn link(&self) -> &CollectionLink {
        &self.link
    }

    pub fn type_name(&self) -> &str {
        &self.link.type_name
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn at(&self, index: usize) -> Option<&Model> {
        self.models.get(index)
    }

    /// Model whose id equals `id`.
    pub fn get(&self, id: &Value) -> Option<&Model> {
        self.models.iter().find(|model| model.id() == Some(id))
    }

    /// A new model of this collection's schema, linked back to it.
    pub fn build(&self, attributes: Attributes) -> Model {
        let mut model = Model::with_attributes(Arc::clone(&self.schema), attributes);
        model.attach(Arc::clone(&self.link));
        model
    }

    /// Append a model, linking it to this collection.
    pub fn add(&mut self, mut model: Model) {
        model.attach(Arc::clone(&self.link));
        self.models.push(model);
    }

    /// Remove the model whose id equals `id`.
    pub fn remove(&mut self, id: &Value) -> Option<Model> {
        let position = self.models.iter().position(|model| model.id() == Some(id))?;
        Some(self.models.remove(position))
    }

    /// Replace every model with ones built from `rows`.
    pub fn reset(&mut self, rows: Vec<Attributes>) {
        let models = rows.into_iter().map(|row| self.build(row)).collect();
        self.models = models;
    }

    /// Value of `attribute` on every model, `Null` where unset.
    pub fn pluck(&self, attribute: &str) -> Vec<Value> {
        self.models
            .iter()
            .map(|model| model.get(attribute).cloned().unwrap_or(Value::Null))
            .collect()
    }
}
