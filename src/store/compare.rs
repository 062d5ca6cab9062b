//! Total order over stored values, used for filtering, sorting and id bounds.
//!
//! Type order: null < numbers < strings < objects < arrays < object ids < booleans.

use std::cmp::Ordering;

use serde_json::{Number, Value};

use crate::id::StoreId;

const OBJECT_ID_RANK: u8 = 5;

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 6,
    }
}

/// Type class of an id; strict bounds only compare ids of the same class.
pub(crate) fn id_rank(id: &StoreId) -> u8 {
    match id {
        StoreId::Object(_) => OBJECT_ID_RANK,
        StoreId::Value(value) => rank(value),
    }
}

fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => {
            let x = a.as_f64().unwrap_or(f64::NAN);
            let y = b.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
    }
}

pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(l, r)| compare_values(l, r))
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Value::Object(x), Value::Object(y)) => x
            .iter()
            .zip(y.iter())
            .map(|((lk, lv), (rk, rv))| lk.cmp(rk).then_with(|| compare_values(lv, rv)))
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => rank(a).cmp(&rank(b)),
    }
}

pub fn compare_ids(a: &StoreId, b: &StoreId) -> Ordering {
    match (a, b) {
        (StoreId::Object(x), StoreId::Object(y)) => x.cmp(y),
        (StoreId::Value(x), StoreId::Value(y)) => compare_values(x, y),
        (StoreId::Object(_), StoreId::Value(v)) => OBJECT_ID_RANK.cmp(&rank(v)),
        (StoreId::Value(v), StoreId::Object(_)) => rank(v).cmp(&OBJECT_ID_RANK),
    }
}
