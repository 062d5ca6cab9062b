//! Model-side sync: method dispatch and helpers that apply results back onto
//! models and collections.

use std::fmt;

use serde::Deserialize;
use tracing::debug;

use crate::adapter::{Ack, Adapter, Fetched, Saved, Target};
use crate::error::{SyncError, SyncResult};
use crate::model::{Attributes, Collection, Model};
use crate::query::QueryOptions;
use crate::store::DocumentStore;

/// Persistence verb issued by a model framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMethod {
    Create,
    Read,
    Update,
    Delete,
}

impl SyncMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMethod::Create => "create",
            SyncMethod::Read => "read",
            SyncMethod::Update => "update",
            SyncMethod::Delete => "delete",
        }
    }
}

impl fmt::Display for SyncMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a sync call acts on. Writes need the model mutably so a created id
/// lands on it.
#[derive(Debug)]
pub enum SyncTarget<'a> {
    Model(&'a mut Model),
    Collection(&'a Collection),
}

/// Outcome of [`Adapter::sync`].
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    One(Attributes),
    Many(Vec<Attributes>),
    Saved(Saved),
    /// `None` when a new model was destroyed.
    Destroyed(Option<Ack>),
}

impl From<Fetched> for Response {
    fn from(fetched: Fetched) -> Self {
        match fetched {
            Fetched::One(row) => Response::One(row),
            Fetched::Many(rows) => Response::Many(rows),
        }
    }
}

impl<S: DocumentStore> Adapter<S> {
    /// Route one framework sync call to the matching operation.
    pub fn sync(
        &self,
        method: SyncMethod,
        target: SyncTarget<'_>,
        options: &QueryOptions,
    ) -> SyncResult<Response> {
        debug!(method = %method, "sync");
        match (method, target) {
            (SyncMethod::Read, SyncTarget::Collection(collection)) => self
                .find_all(Target::Collection(collection), options)
                .map(Response::from),
            (SyncMethod::Read, SyncTarget::Model(model)) if options.filter.is_some() => self
                .find_all(Target::Model(model), options)
                .map(Response::from),
            (SyncMethod::Read, SyncTarget::Model(model)) => {
                self.find(model, options).map(Response::One)
            }
            (SyncMethod::Create, SyncTarget::Model(model)) => {
                self.create(model, options).map(Response::Saved)
            }
            (SyncMethod::Update, SyncTarget::Model(model)) => {
                self.update(model, options).map(Response::Saved)
            }
            (SyncMethod::Delete, SyncTarget::Model(model)) => {
                self.destroy(model, options).map(Response::Destroyed)
            }
            (method, SyncTarget::Collection(collection)) => Err(SyncError::UnsupportedMethod {
                method: method.as_str(),
                model_type: collection.type_name().to_string(),
            }),
        }
    }
}

/// Save, fetch and destroy a model through an adapter.
pub trait ModelSyncExt {
    /// Create or update, merging the echoed attributes back.
    fn save<S: DocumentStore>(
        &mut self,
        adapter: &Adapter<S>,
        options: &QueryOptions,
    ) -> SyncResult<Saved>;

    /// Merge the stored document into local attributes. With a `where` filter
    /// the first match is read instead of the model's own id.
    fn fetch<S: DocumentStore>(
        &mut self,
        adapter: &Adapter<S>,
        options: &QueryOptions,
    ) -> SyncResult<()>;

    fn destroy<S: DocumentStore>(
        &self,
        adapter: &Adapter<S>,
        options: &QueryOptions,
    ) -> SyncResult<Option<Ack>>;
}

impl ModelSyncExt for Model {
    fn save<S: DocumentStore>(
        &mut self,
        adapter: &Adapter<S>,
        options: &QueryOptions,
    ) -> SyncResult<Saved> {
        let saved = adapter.update(self, options)?;
        if let Saved::Replaced { data, .. } = &saved {
            self.set_all(data.clone());
        }
        Ok(saved)
    }

    fn fetch<S: DocumentStore>(
        &mut self,
        adapter: &Adapter<S>,
        options: &QueryOptions,
    ) -> SyncResult<()> {
        let row = adapter.find(self, options)?;
        self.set_all(row);
        Ok(())
    }

    fn destroy<S: DocumentStore>(
        &self,
        adapter: &Adapter<S>,
        options: &QueryOptions,
    ) -> SyncResult<Option<Ack>> {
        adapter.destroy(self, options)
    }
}

/// Fetch and create through a collection.
pub trait CollectionSyncExt {
    /// Replace the members with the stored page. Returns the new length.
    fn fetch<S: DocumentStore>(
        &mut self,
        adapter: &Adapter<S>,
        options: &QueryOptions,
    ) -> SyncResult<usize>;

    /// Build a member from `attributes`, save it and add it.
    fn create<S: DocumentStore>(
        &mut self,
        attributes: Attributes,
        adapter: &Adapter<S>,
        options: &QueryOptions,
    ) -> SyncResult<Saved>;
}

impl CollectionSyncExt for Collection {
    fn fetch<S: DocumentStore>(
        &mut self,
        adapter: &Adapter<S>,
        options: &QueryOptions,
    ) -> SyncResult<usize> {
        let rows = adapter
            .find_all(Target::Collection(self), options)?
            .into_many();
        self.reset(rows);
        Ok(self.len())
    }

    fn create<S: DocumentStore>(
        &mut self,
        attributes: Attributes,
        adapter: &Adapter<S>,
        options: &QueryOptions,
    ) -> SyncResult<Saved> {
        let mut model = self.build(attributes);
        let saved = model.save(adapter, options)?;
        self.add(model);
        Ok(saved)
    }
}
