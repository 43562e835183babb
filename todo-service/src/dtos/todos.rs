use crate::models::Todo;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Body of `POST /todos` and `PUT /todos/:id`. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl From<TodoInput> for Todo {
    fn from(input: TodoInput) -> Self {
        Todo::new(input.title, input.completed)
    }
}

/// One element of the `POST /save-todos` array.
///
/// A previously fetched list can be posted back as-is, so `_id` is accepted and kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkTodoInput {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl BulkTodoInput {
    /// Builds the document to insert at position `order`.
    pub fn into_todo(self, order: usize) -> Result<Todo, mongodb::bson::oid::Error> {
        let id = self.id.as_deref().map(ObjectId::parse_str).transpose()?;
        Ok(Todo {
            id,
            title: self.title,
            completed: self.completed,
            order: Some(order as i64),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodoResponse {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl From<Todo> for TodoResponse {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: todo.title,
            completed: todo.completed,
            order: todo.order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_renders_id_as_hex_string() {
        let id = ObjectId::new();
        let todo = Todo {
            id: Some(id),
            title: Some("write tests".to_string()),
            completed: Some(false),
            order: None,
        };

        let body = serde_json::to_value(TodoResponse::from(todo)).unwrap();
        assert_eq!(
            body,
            json!({ "_id": id.to_hex(), "title": "write tests", "completed": false })
        );
    }

    #[test]
    fn todo_input_ignores_extra_fields() {
        let input: TodoInput =
            serde_json::from_value(json!({ "title": "x", "completed": true, "color": "red" }))
                .unwrap();
        assert_eq!(input.title.as_deref(), Some("x"));
        assert_eq!(input.completed, Some(true));
    }

    #[test]
    fn todo_input_rejects_wrong_types() {
        let result: Result<TodoInput, _> = serde_json::from_value(json!({ "completed": "yes" }));
        assert!(result.is_err());
    }

    #[test]
    fn bulk_input_keeps_valid_id_and_sets_order() {
        let id = ObjectId::new();
        let input = BulkTodoInput {
            id: Some(id.to_hex()),
            title: Some("b".to_string()),
            completed: None,
        };

        let todo = input.into_todo(1).unwrap();
        assert_eq!(todo.id, Some(id));
        assert_eq!(todo.order, Some(1));
    }

    #[test]
    fn bulk_input_rejects_malformed_id() {
        let input = BulkTodoInput {
            id: Some("not-an-object-id".to_string()),
            ..Default::default()
        };
        assert!(input.into_todo(0).is_err());
    }
}
