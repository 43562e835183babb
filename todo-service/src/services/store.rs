use super::database::MongoDb;
use super::error::StoreError;
use crate::dtos::TodoInput;
use crate::models::Todo;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, Document},
    options::{FindOneAndUpdateOptions, ReturnDocument},
    results::InsertManyResult,
    ClientSession, Collection,
};

/// Everything the HTTP layer needs from the todo collection.
#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Todo>, StoreError>;

    /// Inserts `todo` and returns it with its generated id.
    async fn create(&self, todo: Todo) -> Result<Todo, StoreError>;

    /// Removes the todo and returns it, or `None` when no document has this id.
    async fn delete(&self, id: &str) -> Result<Option<Todo>, StoreError>;

    /// Overwrites `title` and `completed` (absent input fields are removed) and returns
    /// the document as it is after the write. `order` is left alone.
    async fn update(&self, id: &str, input: TodoInput) -> Result<Option<Todo>, StoreError>;

    /// Deletes every todo, then inserts `todos` in the given order.
    async fn replace_all(&self, todos: Vec<Todo>) -> Result<Vec<Todo>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

pub fn parse_id(id: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
}

/// `$set` for the fields the client sent, `$unset` for the ones it left out.
pub fn update_document(input: &TodoInput) -> Document {
    let mut set = Document::new();
    let mut unset = Document::new();

    match &input.title {
        Some(title) => set.insert("title", title.as_str()),
        None => unset.insert("title", ""),
    };
    match input.completed {
        Some(completed) => set.insert("completed", completed),
        None => unset.insert("completed", ""),
    };

    let mut update = Document::new();
    if !set.is_empty() {
        update.insert("$set", set);
    }
    if !unset.is_empty() {
        update.insert("$unset", unset);
    }
    update
}

fn assign_inserted_ids(todos: &mut [Todo], result: &InsertManyResult) {
    for (index, todo) in todos.iter_mut().enumerate() {
        if let Some(id) = result.inserted_ids.get(&index).and_then(Bson::as_object_id) {
            todo.id = Some(id);
        }
    }
}

pub struct MongoTodoStore {
    db: MongoDb,
    transactional_replace: bool,
}

impl MongoTodoStore {
    pub fn new(db: MongoDb, transactional_replace: bool) -> Self {
        Self {
            db,
            transactional_replace,
        }
    }

    fn todos(&self) -> Collection<Todo> {
        self.db.todos()
    }

    async fn replace_unguarded(&self, mut todos: Vec<Todo>) -> Result<Vec<Todo>, StoreError> {
        let collection = self.todos();

        let removed = collection.delete_many(doc! {}, None).await?;
        tracing::debug!(removed = removed.deleted_count, "Cleared todos collection");

        // A failure past this point leaves the collection empty.
        if todos.is_empty() {
            return Ok(todos);
        }
        let result = collection.insert_many(&todos, None).await?;
        assign_inserted_ids(&mut todos, &result);
        Ok(todos)
    }

    async fn replace_in_transaction(&self, mut todos: Vec<Todo>) -> Result<Vec<Todo>, StoreError> {
        let mut session = self.db.client().start_session(None).await?;
        session.start_transaction(None).await?;

        match Self::replace_with_session(&self.todos(), &todos, &mut session).await {
            Ok(result) => {
                session.commit_transaction().await?;
                if let Some(result) = result {
                    assign_inserted_ids(&mut todos, &result);
                }
                Ok(todos)
            }
            Err(e) => {
                if let Err(abort_err) = session.abort_transaction().await {
                    tracing::warn!(error = %abort_err, "Failed to abort bulk replace transaction");
                }
                Err(e)
            }
        }
    }

    async fn replace_with_session(
        collection: &Collection<Todo>,
        todos: &[Todo],
        session: &mut ClientSession,
    ) -> Result<Option<InsertManyResult>, StoreError> {
        collection
            .delete_many_with_session(doc! {}, None, session)
            .await?;

        if todos.is_empty() {
            return Ok(None);
        }
        let result = collection
            .insert_many_with_session(todos, None, session)
            .await?;
        Ok(Some(result))
    }
}

#[async_trait]
impl TodoStore for MongoTodoStore {
    async fn list(&self) -> Result<Vec<Todo>, StoreError> {
        let cursor = self.todos().find(doc! {}, None).await?;
        let todos: Vec<Todo> = cursor.try_collect().await?;
        Ok(todos)
    }

    async fn create(&self, mut todo: Todo) -> Result<Todo, StoreError> {
        let result = self.todos().insert_one(&todo, None).await?;
        todo.id = result.inserted_id.as_object_id();
        Ok(todo)
    }

    async fn delete(&self, id: &str) -> Result<Option<Todo>, StoreError> {
        let id = parse_id(id)?;
        Ok(self
            .todos()
            .find_one_and_delete(doc! { "_id": id }, None)
            .await?)
    }

    async fn update(&self, id: &str, input: TodoInput) -> Result<Option<Todo>, StoreError> {
        let id = parse_id(id)?;
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .todos()
            .find_one_and_update(doc! { "_id": id }, update_document(&input), options)
            .await?)
    }

    async fn replace_all(&self, todos: Vec<Todo>) -> Result<Vec<Todo>, StoreError> {
        if self.transactional_replace {
            self.replace_in_transaction(todos).await
        } else {
            self.replace_unguarded(todos).await
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(self.db.health_check().await?)
    }
}

/// Stand-in used when no client could be built from the configured connection string.
/// The listener still starts; every call fails with the parse error.
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> StoreError {
        StoreError::Unavailable(self.reason.clone())
    }
}

#[async_trait]
impl TodoStore for UnavailableStore {
    async fn list(&self) -> Result<Vec<Todo>, StoreError> {
        Err(self.error())
    }

    async fn create(&self, _todo: Todo) -> Result<Todo, StoreError> {
        Err(self.error())
    }

    async fn delete(&self, _id: &str) -> Result<Option<Todo>, StoreError> {
        Err(self.error())
    }

    async fn update(&self, _id: &str, _input: TodoInput) -> Result<Option<Todo>, StoreError> {
        Err(self.error())
    }

    async fn replace_all(&self, _todos: Vec<Todo>) -> Result<Vec<Todo>, StoreError> {
        Err(self.error())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Err(self.error())
    }
}
