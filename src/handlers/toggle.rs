//! `PUT {path}/settings`: enable or disable a keyed setting (e.g. notification per module/action).

use crate::config::settings::parse_bool;
use crate::config::{FieldType, ResolvedField, ResolvedResource};
use crate::error::AppError;
use crate::response;
use crate::service::CrudService;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Extension,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Convert a query string value to the JSON type of its field. Unparseable values stay strings
/// and are reported by the field type check.
fn query_value_for_field(field: Option<&ResolvedField>, s: &str) -> Value {
    match field.map(|f| f.field_type) {
        Some(FieldType::Integer) => s.parse::<i64>().map(Value::from).unwrap_or_else(|_| Value::String(s.to_string())),
        Some(FieldType::Number) => s
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(s.to_string())),
        Some(FieldType::Boolean) => parse_bool(s).map(Value::Bool).unwrap_or_else(|| Value::String(s.to_string())),
        _ => Value::String(s.to_string()),
    }
}

pub async fn set_toggle(
    State(state): State<AppState>,
    Extension(resource): Extension<Arc<ResolvedResource>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let toggle = resource
        .toggle
        .as_ref()
        .ok_or_else(|| AppError::NotFound(format!("{} settings", resource.label)))?;

    let raw_flag = params
        .get(&toggle.param)
        .ok_or_else(|| AppError::Validation(format!("{} is required", toggle.param)))?;
    let flag = parse_bool(raw_flag)
        .ok_or_else(|| AppError::Validation(format!("{} must be true or false", toggle.param)))?;

    let mut keys = Map::new();
    for k in &toggle.keys {
        let v = params
            .get(k)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Validation(format!("{} is required", k)))?;
        keys.insert(k.clone(), query_value_for_field(resource.field(k), v));
    }

    CrudService::set_toggle(&state.pool, &resource, &keys, flag).await?;
    tracing::info!(resource = %resource.name, ?keys, flag, "settings updated");
    Ok(response::message(format!("{} settings updated", resource.label)))
}
