//! Collection resolution - ordered strategies mapping a call onto a store collection.

use crate::error::{SyncError, SyncResult};
use crate::query::QueryOptions;

use super::Target;

/// A pure strategy from call options and target to a collection name.
pub type CollectionResolver = fn(&QueryOptions, Target<'_>) -> Option<String>;

/// Per-call override.
pub fn from_options(options: &QueryOptions, _target: Target<'_>) -> Option<String> {
    options.collection.clone()
}

/// Name declared on the target's own type: the model schema for a model, the
/// collection type for a collection.
pub fn from_target(_options: &QueryOptions, target: Target<'_>) -> Option<String> {
    match target {
        Target::Model(model) => model.schema().collection_name().map(String::from),
        Target::Collection(collection) => collection.link().collection.clone(),
    }
}

/// Name declared one level removed: the model schema of a collection, or the
/// collection a model belongs to.
pub fn from_related(_options: &QueryOptions, target: Target<'_>) -> Option<String> {
    match target {
        Target::Model(model) => model.collection().and_then(|link| link.collection.clone()),
        Target::Collection(collection) => collection.schema().collection_name().map(String::from),
    }
}

pub const DEFAULT_RESOLVERS: [CollectionResolver; 3] = [from_options, from_target, from_related];

/// First non-empty name any strategy yields.
pub fn resolve_collection(
    resolvers: &[CollectionResolver],
    options: &QueryOptions,
    target: Target<'_>,
) -> SyncResult<String> {
    resolvers
        .iter()
        .find_map(|resolve| resolve(options, target).filter(|name| !name.is_empty()))
        .ok_or_else(|| SyncError::UnresolvedCollection {
            model_type: target.type_name().to_string(),
        })
}
