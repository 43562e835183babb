//! CRUD handlers for `/todos` and the bulk `/save-todos` endpoint.
//!
//! Each handler picks the HTTP class for datastore failures itself: reads, deletes and
//! updates report them as 500, creates and bulk replaces as 400. An update body that
//! fails to parse is reported the same way as a failed update.

use crate::dtos::{BulkTodoInput, TodoInput, TodoResponse};
use crate::models::Todo;
use crate::services::record_operation;
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use service_core::error::AppError;

const TODO_NOT_FOUND: &str = "Todo not found";

/// Tags the result with an outcome for `todo_operations_total`.
fn observe<T>(operation: &'static str, result: Result<T, AppError>) -> Result<T, AppError> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(AppError::NotFound(_)) => "not_found",
        Err(_) => "error",
    };
    record_operation(operation, outcome);
    result
}

pub async fn list_todos(
    State(state): State<AppState>,
) -> Result<Json<Vec<TodoResponse>>, AppError> {
    let result = state
        .store
        .list()
        .await
        .map(|todos| Json(todos.into_iter().map(TodoResponse::from).collect()))
        .map_err(|e| AppError::DatabaseError(e.into()));

    observe("list", result)
}

pub async fn create_todo(
    State(state): State<AppState>,
    WithRejection(Json(input), _): WithRejection<Json<TodoInput>, AppError>,
) -> Result<(StatusCode, Json<TodoResponse>), AppError> {
    let result = state
        .store
        .create(Todo::from(input))
        .await
        .map_err(|e| AppError::BadRequest(e.into()));

    let todo = observe("create", result)?;
    let response = TodoResponse::from(todo);
    tracing::info!(todo_id = %response.id, "Todo created");

    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TodoResponse>, AppError> {
    let result = match state.store.delete(&id).await {
        Ok(Some(todo)) => Ok(todo),
        Ok(None) => Err(AppError::NotFound(anyhow::anyhow!(TODO_NOT_FOUND))),
        Err(e) => Err(AppError::DatabaseError(e.into())),
    };

    let todo = observe("delete", result)?;
    tracing::info!(todo_id = %id, "Todo deleted");

    Ok(Json(TodoResponse::from(todo)))
}

pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<TodoInput>, JsonRejection>,
) -> Result<Json<TodoResponse>, AppError> {
    let input = match body {
        Ok(Json(input)) => input,
        Err(rejection) => {
            let error = AppError::DatabaseError(anyhow::anyhow!(rejection.body_text()));
            return observe("update", Err(error));
        }
    };

    let result = match state.store.update(&id, input).await {
        Ok(Some(todo)) => Ok(todo),
        Ok(None) => Err(AppError::NotFound(anyhow::anyhow!(TODO_NOT_FOUND))),
        Err(e) => Err(AppError::DatabaseError(e.into())),
    };

    let todo = observe("update", result)?;
    tracing::info!(todo_id = %id, "Todo updated");

    Ok(Json(TodoResponse::from(todo)))
}

/// Replaces the whole collection with the posted list, tagging each entry with its index
/// as `order`. The delete and the insert are separate writes unless the store was built
/// with transactional replace.
pub async fn replace_todos(
    State(state): State<AppState>,
    WithRejection(Json(items), _): WithRejection<Json<Vec<BulkTodoInput>>, AppError>,
) -> Result<(StatusCode, Json<Vec<TodoResponse>>), AppError> {
    let todos = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let raw_id = item.id.clone();
            item.into_todo(index).map_err(|_| {
                AppError::BadRequest(anyhow::anyhow!(
                    "Cast to ObjectId failed for value \"{}\"",
                    raw_id.unwrap_or_default()
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>();

    let result = match todos {
        Ok(todos) => state
            .store
            .replace_all(todos)
            .await
            .map_err(|e| AppError::BadRequest(e.into())),
        Err(e) => Err(e),
    };

    let saved = observe("replace_all", result)?;
    tracing::info!(count = saved.len(), "Todo collection replaced");

    Ok((
        StatusCode::CREATED,
        Json(saved.into_iter().map(TodoResponse::from).collect()),
    ))
}
