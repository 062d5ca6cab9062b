//! Query options accepted by the adapter, and their translation into store plans.

mod plan;
mod translate;

use serde::Deserialize;
use serde_json::{Number, Value};

use crate::model::Attributes;

pub use plan::{
    Direction, Filter, FindQuery, IdRange, Projection, SortField, SortKey, SortPlan,
};
pub use translate::{plan_find, translate_filter, translate_projection, translate_sort};

/// A sort given as one key or an ordered list of keys. A leading `-` sorts
/// that key descending.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SortSpec {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for SortSpec {
    fn from(key: &str) -> Self {
        SortSpec::One(key.to_string())
    }
}

impl From<String> for SortSpec {
    fn from(key: String) -> Self {
        SortSpec::One(key)
    }
}

impl From<Vec<&str>> for SortSpec {
    fn from(keys: Vec<&str>) -> Self {
        SortSpec::Many(keys.into_iter().map(String::from).collect())
    }
}

impl From<Vec<String>> for SortSpec {
    fn from(keys: Vec<String>) -> Self {
        SortSpec::Many(keys)
    }
}

/// Atomic increment request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IncOptions {
    pub attribute: Option<String>,
    /// Defaults to 1.
    pub amount: Option<Number>,
}

impl IncOptions {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: Some(attribute.into()),
            amount: None,
        }
    }

    #[must_use]
    pub fn amount(mut self, amount: impl Into<Number>) -> Self {
        self.amount = Some(amount.into());
        self
    }
}

/// Per-call options for every adapter operation.
///
/// Field names follow the wire form (`where`, `after_id`, `ignoreFailures`)
/// so options can be deserialized straight from a request body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Equality filter.
    #[serde(rename = "where")]
    pub filter: Option<Attributes>,
    pub sort: Option<SortSpec>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub after_id: Option<Value>,
    pub before_id: Option<Value>,
    /// Projection allow-list.
    pub fields: Option<Vec<String>>,
    pub inc: Option<IncOptions>,
    pub upsert: bool,
    #[serde(rename = "ignoreFailures")]
    pub ignore_failures: bool,
    /// Store collection override for this call.
    pub collection: Option<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition to the `where` filter.
    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter
            .get_or_insert_with(Attributes::new)
            .insert(field.into(), value.into());
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: impl Into<SortSpec>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn after_id(mut self, id: impl Into<Value>) -> Self {
        self.after_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn before_id(mut self, id: impl Into<Value>) -> Self {
        self.before_id = Some(id.into());
        self
    }

    #[must_use]
    pub fn fields<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn inc(mut self, inc: IncOptions) -> Self {
        self.inc = Some(inc);
        self
    }

    #[must_use]
    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }

    #[must_use]
    pub fn ignore_failures(mut self, ignore: bool) -> Self {
        self.ignore_failures = ignore;
        self
    }

    #[must_use]
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = Some(name.into());
        self
    }
}
