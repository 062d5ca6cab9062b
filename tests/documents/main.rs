//! Typed documents via `#[derive(Document)]`.

#[path = "../support/mod.rs"]
mod support;
mod views;

use docsync::{Document, Fetched, IncOptions, Model, ModelSyncExt, QueryOptions, Target};
use serde_json::json;
use support::adapter;
use views::{BlogPost, User};

#[test]
fn derived_schema() {
    let schema = User::schema();
    assert_eq!(schema.type_name(), "user");
    assert_eq!(schema.collection_name(), Some("users"));
    assert_eq!(schema.id_attribute_name(), "key");
    assert_eq!(schema.indexes(), ["email".to_string()]);
}

#[test]
fn default_collection_and_renamed_index() {
    let schema = BlogPost::schema();
    assert_eq!(schema.type_name(), "blog_post");
    assert_eq!(schema.collection_name(), Some("blog_posts"));
    assert_eq!(schema.id_attribute_name(), "id");
    assert!(schema.is_indexed("postTitle"));
    assert!(!schema.is_indexed("title"));
}

#[test]
fn typed_round_trip() {
    let adapter = adapter();
    let user = User::new("u-1", "ada@example.com", "Ada");

    let mut model = Model::from_document(&user).unwrap();
    assert!(!model.is_new());
    model.save(&adapter, &QueryOptions::new()).unwrap();

    let stored = adapter.store().documents("users").unwrap();
    assert_eq!(stored.len(), 1);

    let mut fetched = Model::from_document(&User::new("u-1", "", "")).unwrap();
    fetched.fetch(&adapter, &QueryOptions::new()).unwrap();
    assert_eq!(fetched.to_document::<User>().unwrap(), user);
}

#[test]
fn lookup_by_indexed_field() {
    let adapter = adapter();
    let mut model = Model::from_document(&User::new("u-2", "grace@example.com", "Grace")).unwrap();
    model.save(&adapter, &QueryOptions::new()).unwrap();

    let mut probe = Model::from_document(&User::new("", "grace@example.com", "")).unwrap();
    probe.unset("key");
    probe.unset("name");
    let Fetched::One(row) = adapter
        .find_all(Target::Model(&probe), &QueryOptions::new())
        .unwrap()
    else {
        panic!("expected a single row");
    };
    assert_eq!(row.get("key"), Some(&json!("u-2")));
    assert_eq!(row.get("name"), Some(&json!("Grace")));
}

#[test]
fn new_document_gets_an_object_id() {
    let adapter = adapter();
    let post = BlogPost {
        id: None,
        title: "Hello".to_string(),
        views: 0,
    };

    let mut model = Model::from_document(&post).unwrap();
    assert!(model.is_new());
    model.save(&adapter, &QueryOptions::new()).unwrap();

    let options = QueryOptions::new().inc(IncOptions::new("views").amount(3));
    model.save(&adapter, &options).unwrap();
    model.fetch(&adapter, &QueryOptions::new()).unwrap();

    let saved: BlogPost = model.to_document().unwrap();
    assert_eq!(saved.id.as_ref().map(String::len), Some(24));
    assert_eq!(saved.title, "Hello");
    assert_eq!(saved.views, 3);
}
