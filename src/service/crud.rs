//! Generic CRUD execution against PostgreSQL. One statement per operation, each on its own
//! pooled connection.

use crate::config::{FieldType, ResolvedResource, ID_COLUMN};
use crate::error::AppError;
use crate::service::RequestValidator;
use crate::sql::{self, QueryBuf};
use serde_json::{Map, Value};
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row};

pub struct CrudService;

impl CrudService {
    /// All rows, id ascending. Empty table yields an empty vec.
    pub async fn list(pool: &PgPool, resource: &ResolvedResource) -> Result<Vec<Value>, AppError> {
        let q = sql::select_list(resource);
        let mut conn = Self::acquire(pool).await?;
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_all(&q).fetch_all(&mut *conn).await?;
        rows.iter().map(|r| row_to_json(r, resource)).collect()
    }

    /// Fetch one row by id. Returns JSON object or None.
    pub async fn read(pool: &PgPool, resource: &ResolvedResource, id: i64) -> Result<Option<Value>, AppError> {
        let q = sql::select_by_id(resource, id);
        Self::fetch_optional(pool, resource, &q).await
    }

    /// Insert one row. Body must already be validated. Returns created row.
    pub async fn create(
        pool: &PgPool,
        resource: &ResolvedResource,
        body: &Map<String, Value>,
    ) -> Result<Value, AppError> {
        let q = sql::insert(resource, body)?;
        Self::fetch_optional(pool, resource, &q)
            .await?
            .ok_or_else(|| AppError::Unexpected(sqlx::Error::RowNotFound))
    }

    /// Apply present fields to row `id`. Returns updated row, or None when `id` does not exist.
    pub async fn update(
        pool: &PgPool,
        resource: &ResolvedResource,
        id: i64,
        body: &Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        let q = sql::update(resource, id, body)?;
        Self::fetch_optional(pool, resource, &q).await
    }

    /// Delete row `id`. Returns false when it did not exist.
    pub async fn delete(pool: &PgPool, resource: &ResolvedResource, id: i64) -> Result<bool, AppError> {
        let q = sql::delete(resource, id);
        let mut conn = Self::acquire(pool).await?;
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_all(&q).fetch_optional(&mut *conn).await?;
        Ok(row.is_some())
    }

    /// Set the toggle flag for the records matching `keys` (field name → value), inserting one if none match.
    pub async fn set_toggle(
        pool: &PgPool,
        resource: &ResolvedResource,
        keys: &Map<String, Value>,
        flag: bool,
    ) -> Result<(), AppError> {
        let toggle = resource
            .toggle
            .as_ref()
            .ok_or_else(|| AppError::BadRequest(format!("{} has no settings toggle", resource.label)))?;
        RequestValidator::validate_partial(keys, resource)?;
        let mut key_values = Vec::with_capacity(toggle.keys.len());
        let mut message = toggle.message_template.clone();
        for k in &toggle.keys {
            let v = keys
                .get(k)
                .ok_or_else(|| AppError::Validation(format!("{} is required", k)))?;
            let ty = resource.field(k).map(|f| f.field_type).unwrap_or(FieldType::Text);
            key_values.push(sql::PgBindValue::for_field(ty, v)?);
            let shown = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
            message = message.replace(&format!("{{{}}}", k), &shown);
        }
        let q = sql::toggle_upsert(resource, toggle, key_values, flag, &message);
        let mut conn = Self::acquire(pool).await?;
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        bind_all(&q).execute(&mut *conn).await?;
        Ok(())
    }

    /// Check a connection out of the pool. It goes back when the guard drops, on every exit path.
    async fn acquire(pool: &PgPool) -> Result<PoolConnection<Postgres>, AppError> {
        pool.acquire().await.map_err(|e| match AppError::from(e) {
            AppError::Unexpected(e) => AppError::StorageUnavailable(e),
            other => other,
        })
    }

    async fn fetch_optional(
        pool: &PgPool,
        resource: &ResolvedResource,
        q: &QueryBuf,
    ) -> Result<Option<Value>, AppError> {
        let mut conn = Self::acquire(pool).await?;
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_all(q).fetch_optional(&mut *conn).await?;
        row.map(|r| row_to_json(&r, resource)).transpose()
    }
}

fn bind_all(q: &QueryBuf) -> sqlx::query::Query<'_, Postgres, sqlx::postgres::PgArguments> {
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(p.clone());
    }
    query
}

/// Map a row to a JSON object using the catalog's column types; timestamps as RFC 3339.
fn row_to_json(row: &PgRow, resource: &ResolvedResource) -> Result<Value, AppError> {
    let mut map = Map::new();
    let id: i64 = row.try_get(ID_COLUMN)?;
    map.insert(ID_COLUMN.to_string(), Value::from(id));
    for f in &resource.fields {
        let name = f.name.as_str();
        let v = match f.field_type {
            FieldType::Text => row.try_get::<Option<String>, _>(name)?.map(Value::String),
            FieldType::Integer => row.try_get::<Option<i64>, _>(name)?.map(Value::from),
            FieldType::Number => row
                .try_get::<Option<f64>, _>(name)?
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            FieldType::Boolean => row.try_get::<Option<bool>, _>(name)?.map(Value::Bool),
        };
        map.insert(name.to_string(), v.unwrap_or(Value::Null));
    }
    for name in [&resource.created_column, &resource.updated_column] {
        let ts: chrono::DateTime<chrono::Utc> = row.try_get(name.as_str())?;
        map.insert(name.clone(), Value::String(ts.to_rfc3339()));
    }
    Ok(Value::Object(map))
}
