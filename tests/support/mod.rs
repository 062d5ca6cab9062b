//! Shared fixtures for the adapter integration suites.

#![allow(dead_code)]

use std::sync::Arc;

use docsync::{
    Adapter, AdapterConfig, Attributes, InMemoryDocumentStore, Model, ModelSchema, QueryOptions,
};
use serde_json::Value;

/// Install a test subscriber once; `RUST_LOG=docsync=debug` shows dispatch decisions.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn my_model_schema() -> Arc<ModelSchema> {
    Arc::new(
        ModelSchema::new("mymodel")
            .collection("mymodels")
            .index("value")
            .index("name"),
    )
}

pub fn adapter() -> Adapter<InMemoryDocumentStore> {
    init_tracing();
    Adapter::new(InMemoryDocumentStore::new())
}

pub fn adapter_with(config: AdapterConfig) -> Adapter<InMemoryDocumentStore> {
    init_tracing();
    Adapter::with_config(InMemoryDocumentStore::new(), config)
}

pub fn attrs(value: Value) -> Attributes {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

pub fn my_model(value: Value) -> Model {
    Model::with_attributes(my_model_schema(), attrs(value))
}

/// Four documents: ids 1..=4, `value` 1,2,3,2 and `name` a,b,c,c.
pub fn seed(adapter: &Adapter<InMemoryDocumentStore>) {
    let fixtures = [(1, 1, "a"), (2, 2, "b"), (3, 3, "c"), (4, 2, "c")];
    for (id, value, name) in fixtures {
        let mut model = my_model(serde_json::json!({"id": id, "value": value, "name": name}));
        adapter
            .create(&mut model, &QueryOptions::new())
            .expect("seed fixture");
    }
}

pub fn ids(rows: &[Attributes]) -> Vec<Value> {
    rows.iter()
        .map(|row| row.get("id").cloned().unwrap_or(Value::Null))
        .collect()
}

pub fn values(rows: &[Attributes], attribute: &str) -> Vec<Value> {
    rows.iter()
        .map(|row| row.get(attribute).cloned().unwrap_or(Value::Null))
        .collect()
}
