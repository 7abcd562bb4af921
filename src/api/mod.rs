use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query};
use axum::routing::patch;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::db::{Filter, TodoUpdate};
use crate::error::{AppError, INVALID_BODY, INVALID_ID};
use crate::models::*;
use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Default, Deserialize)]
pub struct TodoQueryParams {
    pub date: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl TodoQueryParams {
    /// `date` wins over `start`/`end`. A range needs both bounds: a lone
    /// `start` or `end` is ignored and every todo is returned.
    pub fn filter(&self) -> Filter {
        if let Some(date) = non_empty(&self.date) {
            return Filter::on_date(date);
        }
        match (non_empty(&self.start), non_empty(&self.end)) {
            (Some(start), Some(end)) => Filter::date_between(start, end),
            _ => Filter::all(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

pub fn router(state: AppState) -> Router {
    let todos = Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{id}",
            patch(update_todo).put(update_todo).delete(delete_todo),
        );

    Router::new()
        .route("/health", get(health))
        .nest(API_PREFIX, todos)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn invalid_body(rejection: JsonRejection) -> AppError {
    debug!(%rejection, "rejected request body");
    AppError::BadRequest(INVALID_BODY)
}

fn parse_id(id: Result<Path<String>, PathRejection>) -> Result<TodoId, AppError> {
    let Path(id) = id.map_err(|_| AppError::BadRequest(INVALID_ID))?;
    id.parse().map_err(|_| AppError::BadRequest(INVALID_ID))
}

async fn list_todos(
    State(state): State<AppState>,
    Query(params): Query<TodoQueryParams>,
) -> Result<Json<Vec<Todo>>, AppError> {
    let filter = params.filter();
    debug!(?filter, "listing todos");

    let mut cursor = state
        .todos
        .find(filter)
        .await
        .map_err(AppError::store("Error fetching todos"))?;

    let mut todos = Vec::new();
    let drained = cursor.all(&mut todos).await;
    if let Err(e) = cursor.close().await {
        warn!("failed to close cursor: {}", e);
    }
    drained.map_err(AppError::store("Error parsing todos"))?;

    Ok(Json(todos))
}

async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<NewTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    let Json(req) = payload.map_err(invalid_body)?;
    req.validate()?;

    let mut todo = req.into_todo(now_rfc3339());
    let id = state
        .todos
        .insert_one(&todo)
        .await
        .map_err(AppError::store("Error creating todo"))?;
    todo.id = Some(id);

    info!(%id, date = %todo.date, "todo created");
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateTodoStatusRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(id)?;
    let Json(req) = payload.map_err(invalid_body)?;

    let update = TodoUpdate {
        completed: req.completed,
        updated_at: now_rfc3339(),
    };
    let outcome = state
        .todos
        .update_one(Filter::by_id(id), update)
        .await
        .map_err(AppError::from_write("Error updating todo"))?;

    if outcome.matched_count == 0 {
        return Err(AppError::NotFound);
    }

    info!(%id, completed = req.completed, "todo status updated");
    Ok(Json(MessageResponse::new("Todo status updated successfully")))
}

async fn delete_todo(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(id)?;

    let outcome = state
        .todos
        .delete_one(Filter::by_id(id))
        .await
        .map_err(AppError::from_write("Error deleting todo"))?;

    if outcome.deleted_count == 0 {
        return Err(AppError::NotFound);
    }

    info!(%id, "todo deleted");
    Ok(Json(MessageResponse::new("Todo deleted")))
}
