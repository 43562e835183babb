use super::error::StoreError;
use super::store::{parse_id, TodoStore};
use crate::dtos::TodoInput;
use crate::models::Todo;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::collections::HashSet;
use std::sync::Mutex;

/// In-memory `TodoStore` with the same observable behaviour as the MongoDB one,
/// including the non-atomic bulk replace. Used to exercise the router without a server.
pub struct MockTodoStore {
    pub todos: Mutex<Vec<Todo>>,
    failure: Mutex<Option<String>>,
}

impl Default for MockTodoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTodoStore {
    pub fn new() -> Self {
        Self {
            todos: Mutex::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }

    /// Makes every subsequent call fail with `message`; `None` restores normal behaviour.
    pub fn set_failure(&self, message: Option<&str>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = message.map(str::to_string);
        }
    }

    pub fn snapshot(&self) -> Vec<Todo> {
        self.todos.lock().map(|t| t.clone()).unwrap_or_default()
    }

    fn check(&self) -> Result<(), StoreError> {
        let failure = self
            .failure
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock failure mutex poisoned: {}", e))?;
        match failure.as_ref() {
            Some(message) => Err(StoreError::Internal(anyhow::anyhow!(message.clone()))),
            None => Ok(()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Todo>>, StoreError> {
        self.todos
            .lock()
            .map_err(|e| StoreError::Internal(anyhow::anyhow!("Mock store mutex poisoned: {}", e)))
    }
}

#[async_trait]
impl TodoStore for MockTodoStore {
    async fn list(&self) -> Result<Vec<Todo>, StoreError> {
        self.check()?;
        Ok(self.lock()?.clone())
    }

    async fn create(&self, mut todo: Todo) -> Result<Todo, StoreError> {
        self.check()?;
        todo.id = Some(ObjectId::new());
        self.lock()?.push(todo.clone());
        Ok(todo)
    }

    async fn delete(&self, id: &str) -> Result<Option<Todo>, StoreError> {
        self.check()?;
        let id = parse_id(id)?;
        let mut todos = self.lock()?;
        let removed = todos
            .iter()
            .position(|t| t.id == Some(id))
            .map(|index| todos.remove(index));
        Ok(removed)
    }

    async fn update(&self, id: &str, input: TodoInput) -> Result<Option<Todo>, StoreError> {
        self.check()?;
        let id = parse_id(id)?;
        let mut todos = self.lock()?;
        Ok(todos.iter_mut().find(|t| t.id == Some(id)).map(|todo| {
            todo.title = input.title;
            todo.completed = input.completed;
            todo.clone()
        }))
    }

    async fn replace_all(&self, todos: Vec<Todo>) -> Result<Vec<Todo>, StoreError> {
        self.check()?;
        let mut stored = self.lock()?;
        stored.clear();

        let mut seen = HashSet::new();
        let mut inserted = Vec::with_capacity(todos.len());
        for mut todo in todos {
            let id = *todo.id.get_or_insert_with(ObjectId::new);
            if !seen.insert(id) {
                return Err(StoreError::Internal(anyhow::anyhow!(
                    "E11000 duplicate key error collection: todos index: _id_ dup key: {{ _id: ObjectId('{}') }}",
                    id.to_hex()
                )));
            }
            stored.push(todo.clone());
            inserted.push(todo);
        }
        Ok(inserted)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.check()
    }
}
