use docsync::Document;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Document)]
#[document(collection = "users")]
pub struct User {
    #[document(id)]
    pub key: String,
    #[document(index)]
    pub email: String,
    pub name: String,
}

impl User {
    pub fn new(key: &str, email: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            email: email.to_string(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Document)]
pub struct BlogPost {
    pub id: Option<String>,
    #[document(index)]
    #[serde(rename = "postTitle")]
    pub title: String,
    pub views: u64,
}
