//! Store-facing query plan produced by the translator.

use crate::id::StoreId;
use crate::model::Attributes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// What a sort key orders by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortField {
    /// The store identifier, whatever name the caller used for it.
    Id,
    Attribute(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub direction: Direction,
}

impl SortKey {
    pub fn id(direction: Direction) -> Self {
        Self {
            field: SortField::Id,
            direction,
        }
    }

    pub fn attribute(name: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: SortField::Attribute(name.into()),
            direction,
        }
    }
}

/// Ordered sort keys; earlier keys take priority. Empty means natural order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortPlan(pub Vec<SortKey>);

impl SortPlan {
    pub fn keys(&self) -> &[SortKey] {
        &self.0
    }

    pub fn is_natural(&self) -> bool {
        self.0.is_empty()
    }
}

/// Conditions on the store's reserved identifier field. All set bounds must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdRange {
    pub eq: Option<StoreId>,
    pub gt: Option<StoreId>,
    pub lt: Option<StoreId>,
}

impl IdRange {
    pub fn is_unbounded(&self) -> bool {
        self.eq.is_none() && self.gt.is_none() && self.lt.is_none()
    }
}

/// Conjunction of an id range and top-level field equalities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub id: IdRange,
    pub fields: Attributes,
}

impl Filter {
    /// Match exactly one identifier.
    pub fn by_id(id: StoreId) -> Self {
        Self {
            id: IdRange {
                eq: Some(id),
                ..IdRange::default()
            },
            fields: Attributes::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    All,
    /// Only these fields, plus the identifier.
    Include(Vec<String>),
}

/// A multi-result read: filter, then sort, then skip/limit, then project.
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
    pub filter: Filter,
    pub sort: SortPlan,
    pub skip: usize,
    pub limit: usize,
    pub projection: Projection,
}
