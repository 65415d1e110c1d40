//! Resource CRUD handlers: create, list, read, update, delete.
//! The resource comes from the route's `Extension`, set when the routes are built from the model.

use crate::config::ResolvedResource;
use crate::error::AppError;
use crate::extractors::JsonBody;
use crate::response;
use crate::service::{CrudService, RequestValidator};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension,
};
use serde_json::{Map, Value};
use std::sync::Arc;

fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id '{}'", id_str)))
}

fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

/// Take `id` out of an update body. Must be an integer when present.
fn take_body_id(body: &mut Map<String, Value>) -> Result<Option<i64>, AppError> {
    match body.remove("id") {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| AppError::Validation("id must be an integer".into())),
    }
}

fn not_found(resource: &ResolvedResource) -> AppError {
    AppError::NotFound(resource.label.clone())
}

pub async fn list(
    State(state): State<AppState>,
    Extension(resource): Extension<Arc<ResolvedResource>>,
) -> Result<impl IntoResponse, AppError> {
    let rows = CrudService::list(&state.pool, &resource).await?;
    Ok(response::records(rows))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(resource): Extension<Arc<ResolvedResource>>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, AppError> {
    let body = body_to_map(body)?;
    RequestValidator::validate(&body, &resource)?;
    let row = CrudService::create(&state.pool, &resource, &body).await?;
    tracing::info!(resource = %resource.name, id = %row["id"], "created");
    Ok(response::record(row))
}

pub async fn read(
    State(state): State<AppState>,
    Extension(resource): Extension<Arc<ResolvedResource>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let row = CrudService::read(&state.pool, &resource, id)
        .await?
        .ok_or_else(|| not_found(&resource))?;
    Ok(response::record(row))
}

/// PUT `{path}/{id}`. An `id` in the body must match the path.
pub async fn update(
    State(state): State<AppState>,
    Extension(resource): Extension<Arc<ResolvedResource>>,
    Path(id_str): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let mut body = body_to_map(body)?;
    if let Some(body_id) = take_body_id(&mut body)? {
        if body_id != id {
            return Err(AppError::BadRequest("id in body does not match path".into()));
        }
    }
    apply_update(&state, &resource, id, body).await
}

/// PUT `{path}` with the id in the body.
pub async fn update_from_body(
    State(state): State<AppState>,
    Extension(resource): Extension<Arc<ResolvedResource>>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, AppError> {
    let mut body = body_to_map(body)?;
    let id = take_body_id(&mut body)?.ok_or_else(|| AppError::Validation("id is required".into()))?;
    apply_update(&state, &resource, id, body).await
}

async fn apply_update(
    state: &AppState,
    resource: &ResolvedResource,
    id: i64,
    body: Map<String, Value>,
) -> Result<impl IntoResponse, AppError> {
    RequestValidator::validate_partial(&body, resource)?;
    let row = CrudService::update(&state.pool, resource, id, &body)
        .await?
        .ok_or_else(|| not_found(resource))?;
    Ok(response::record(row))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(resource): Extension<Arc<ResolvedResource>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    if !CrudService::delete(&state.pool, &resource, id).await? {
        return Err(not_found(&resource));
    }
    tracing::info!(resource = %resource.name, id, "deleted");
    Ok(response::message(format!("{} deleted successfully", resource.label)))
}
