use std::fmt;
use std::sync::Arc;

use crate::id::IdGenerator;

const DEFAULT_ID_ATTRIBUTE: &str = "id";

/// Static description of a model type.
///
/// Shared by every model of the type and by the collections holding them.
#[derive(Clone)]
pub struct ModelSchema {
    type_name: String,
    collection: Option<String>,
    id_attribute: String,
    indexes: Vec<String>,
    id_generator: Option<Arc<dyn IdGenerator>>,
}

impl ModelSchema {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            collection: None,
            id_attribute: DEFAULT_ID_ATTRIBUTE.to_string(),
            indexes: Vec::new(),
            id_generator: None,
        }
    }

    /// Store collection holding documents of this type.
    #[must_use]
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = Some(name.into());
        self
    }

    /// Attribute carrying the model id (default `id`).
    #[must_use]
    pub fn id_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.id_attribute = attribute.into();
        self
    }

    /// Declare an indexed attribute, usable to look up a bare model.
    #[must_use]
    pub fn index(mut self, attribute: impl Into<String>) -> Self {
        self.indexes.push(attribute.into());
        self
    }

    /// Replace the default object id generator.
    #[must_use]
    pub fn id_generator(mut self, generator: impl IdGenerator + 'static) -> Self {
        self.id_generator = Some(Arc::new(generator));
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn collection_name(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn id_attribute_name(&self) -> &str {
        &self.id_attribute
    }

    pub fn indexes(&self) -> &[String] {
        &self.indexes
    }

    pub fn is_indexed(&self, attribute: &str) -> bool {
        self.indexes.iter().any(|index| index == attribute)
    }

    pub(crate) fn generator(&self) -> Option<&dyn IdGenerator> {
        self.id_generator.as_deref()
    }
}

impl fmt::Debug for ModelSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSchema")
            .field("type_name", &self.type_name)
            .field("collection", &self.collection)
            .field("id_attribute", &self.id_attribute)
            .field("indexes", &self.indexes)
            .field("id_generator", &self.id_generator.is_some())
            .finish()
    }
}
