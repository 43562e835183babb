pub mod todos;

pub use todos::{BulkTodoInput, TodoInput, TodoResponse};
