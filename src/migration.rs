//! Create the tables behind the mounted resources: schema (if any), then one table per resource.
//! Idempotent; existing tables are left untouched.

use crate::config::{FieldType, ResolvedModel, ResolvedResource, ID_COLUMN};
use crate::error::AppError;
use crate::sql::qualified_table;
use serde_json::Value;
use sqlx::PgPool;

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub async fn apply_migrations(pool: &PgPool, model: &ResolvedModel) -> Result<(), AppError> {
    let mut schemas: Vec<&str> = model
        .resources
        .iter()
        .filter_map(|r| r.schema_name.as_deref())
        .collect();
    schemas.dedup();
    for s in schemas {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote(s)))
            .execute(pool)
            .await?;
    }

    for r in &model.resources {
        let sql = create_table_sql(r);
        tracing::debug!(sql = %sql, "migration");
        sqlx::query(&sql).execute(pool).await?;
        tracing::info!(resource = %r.name, table = %r.table_name, "table ready");
    }
    Ok(())
}

pub fn create_table_sql(r: &ResolvedResource) -> String {
    let mut col_defs = vec![format!("{} BIGSERIAL PRIMARY KEY", quote(ID_COLUMN))];
    for f in &r.fields {
        let mut def = format!("{} {}", quote(&f.name), f.field_type.pg_type().to_uppercase());
        if !f.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(d) = f.default.as_ref().and_then(|d| default_literal(f.field_type, d)) {
            def.push_str(" DEFAULT ");
            def.push_str(&d);
        }
        col_defs.push(def);
    }
    for name in [&r.created_column, &r.updated_column] {
        col_defs.push(format!("{} TIMESTAMPTZ NOT NULL DEFAULT NOW()", quote(name)));
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        qualified_table(r),
        col_defs.join(",\n  ")
    )
}

/// SQL literal for a catalog default. Type agreement is checked at catalog validation.
fn default_literal(ty: FieldType, v: &Value) -> Option<String> {
    match (ty, v) {
        (_, Value::Null) => Some("NULL".into()),
        (FieldType::Text, Value::String(s)) => Some(format!("'{}'", s.replace('\'', "''"))),
        (FieldType::Integer, Value::Number(n)) => n.as_i64().map(|i| i.to_string()),
        (FieldType::Number, Value::Number(n)) => n.as_f64().map(|f| f.to_string()),
        (FieldType::Boolean, Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    }
}
