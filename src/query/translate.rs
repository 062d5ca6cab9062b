//! Query translator - turns [`QueryOptions`] into a [`FindQuery`] the store runs.

use crate::error::{SyncError, SyncResult};
use crate::id::{coerce_id, StoreId};
use crate::model::Attributes;

use super::plan::{Direction, Filter, FindQuery, Projection, SortField, SortKey, SortPlan};
use super::{QueryOptions, SortSpec};

/// Translate a sort spec, keeping key order. A leading `-` flips that key
/// to descending. Empty keys are dropped. Keys naming the public id attribute
/// or the reserved field sort by the store identifier.
pub fn translate_sort(spec: &SortSpec, id_attribute: &str, reserved_field: &str) -> SortPlan {
    let keys: Vec<&str> = match spec {
        SortSpec::One(key) => vec![key.as_str()],
        SortSpec::Many(keys) => keys.iter().map(String::as_str).collect(),
    };

    let plan = keys
        .into_iter()
        .filter_map(|key| {
            let (field, direction) = match key.strip_prefix('-') {
                Some(field) => (field, Direction::Descending),
                None => (key, Direction::Ascending),
            };
            if field.is_empty() {
                None
            } else if field == id_attribute || field == reserved_field {
                Some(SortKey::id(direction))
            } else {
                Some(SortKey::attribute(field, direction))
            }
        })
        .collect();

    SortPlan(plan)
}

/// Build the store filter.
///
/// Starts from `conditions` when given, otherwise from an equality on
/// `default_id` (or from nothing). Cursor bounds add a strict inequality on the
/// identifier. A condition on the public id attribute, or on the reserved
/// field, is moved onto the identifier.
pub fn translate_filter(
    conditions: Option<&Attributes>,
    default_id: Option<StoreId>,
    options: &QueryOptions,
    id_attribute: &str,
    reserved_field: &str,
) -> SyncResult<Filter> {
    if options.after_id.is_some() && options.before_id.is_some() {
        return Err(SyncError::ConflictingCursors);
    }

    let mut filter = match conditions {
        Some(conditions) => Filter {
            fields: conditions.clone(),
            ..Filter::default()
        },
        None => default_id.map(Filter::by_id).unwrap_or_default(),
    };

    if let Some(after) = &options.after_id {
        filter.id.gt = Some(coerce_id(after.clone()));
    } else if let Some(before) = &options.before_id {
        filter.id.lt = Some(coerce_id(before.clone()));
    }

    for key in [reserved_field, id_attribute] {
        if let Some(value) = filter.fields.remove(key) {
            filter.id.eq = Some(coerce_id(value));
        }
    }

    Ok(filter)
}

/// Inclusion projection for an allow-list, or the full document.
pub fn translate_projection(fields: Option<&[String]>) -> Projection {
    match fields {
        Some(fields) => Projection::Include(fields.to_vec()),
        None => Projection::All,
    }
}

/// Full plan for a multi-result read.
///
/// `limit` falls back to `default_limit` when unset or zero; `offset` to 0.
pub fn plan_find(
    conditions: Option<&Attributes>,
    options: &QueryOptions,
    id_attribute: &str,
    reserved_field: &str,
    default_limit: usize,
) -> SyncResult<FindQuery> {
    let filter = translate_filter(conditions, None, options, id_attribute, reserved_field)?;
    let sort = options
        .sort
        .as_ref()
        .map(|spec| translate_sort(spec, id_attribute, reserved_field))
        .unwrap_or_default();
    let limit = options.limit.filter(|limit| *limit > 0).unwrap_or(default_limit);

    Ok(FindQuery {
        filter,
        sort,
        skip: options.offset.unwrap_or(0),
        limit,
        projection: translate_projection(options.fields.as_deref()),
    })
}
