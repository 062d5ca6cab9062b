//! Result normalizer - reshapes raw store documents into model attributes.

use crate::id::is_truthy;
use crate::model::Attributes;
use crate::store::RawDocument;

/// Turn one raw document into model attributes.
///
/// The store id is copied into the public id attribute when that attribute is
/// unset, and the reserved field never appears in the output unless it is the
/// public id attribute itself. No id is ever invented.
pub fn normalize(document: RawDocument, id_attribute: &str, reserved_field: &str) -> Attributes {
    let RawDocument { id, mut fields } = document;
    fields.remove(reserved_field);

    if id_attribute == reserved_field {
        fields.insert(reserved_field.to_string(), id.to_value());
    } else if !fields.get(id_attribute).map(is_truthy).unwrap_or(false) {
        fields.insert(id_attribute.to_string(), id.to_value());
    }
    fields
}

/// Normalize every document, keeping order.
pub fn normalize_all(
    documents: Vec<RawDocument>,
    id_attribute: &str,
    reserved_field: &str,
) -> Vec<Attributes> {
    documents
        .into_iter()
        .map(|document| normalize(document, id_attribute, reserved_field))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{ObjectId, StoreId};
    use serde_json::{json, Value};

    fn doc(id: StoreId, fields: Value) -> RawDocument {
        let Value::Object(fields) = fields else {
            panic!("expected object");
        };
        RawDocument { id, fields }
    }

    #[test]
    fn copies_store_id_into_unset_attribute() {
        let oid = ObjectId::new();
        let out = normalize(doc(oid.into(), json!({"name": "a"})), "id", "_id");
        assert_eq!(out.get("id"), Some(&json!(oid.to_hex())));
        assert!(!out.contains_key("_id"));
    }

    #[test]
    fn keeps_existing_public_id() {
        let out = normalize(
            doc(StoreId::Value(json!(1)), json!({"id": "natural", "name": "a"})),
            "id",
            "_id",
        );
        assert_eq!(out.get("id"), Some(&json!("natural")));
        assert!(!out.contains_key("_id"));
    }

    #[test]
    fn reserved_id_attribute_is_kept() {
        let out = normalize(doc(StoreId::Value(json!("k")), json!({"name": "a"})), "_id", "_id");
        assert_eq!(out.get("_id"), Some(&json!("k")));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn normalizes_lists_elementwise() {
        let docs = vec![
            doc(StoreId::Value(json!(1)), json!({"v": 1})),
            doc(StoreId::Value(json!(2)), json!({"v": 2})),
        ];
        let out = normalize_all(docs, "id", "_id");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get("id"), Some(&json!(1)));
        assert_eq!(out[1].get("id"), Some(&json!(2)));
    }
}
