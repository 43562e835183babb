pub mod health;
pub mod todos;

pub use health::{health_check, metrics, readiness_check};
pub use todos::{create_todo, delete_todo, list_todos, replace_todos, update_todo};
