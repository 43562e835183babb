use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A todo as stored in the `todos` collection.
///
/// Every field except `_id` is optional: creates and updates write only what the
/// client sent, and `order` exists only on documents written by a bulk replace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl Todo {
    pub fn new(title: Option<String>, completed: Option<bool>) -> Self {
        Self {
            id: None,
            title,
            completed,
            order: None,
        }
    }
}
