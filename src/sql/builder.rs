//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from a resolved resource.

use crate::config::{FieldType, ResolvedResource, ToggleConfig, ID_COLUMN};
use crate::error::AppError;
use crate::sql::PgBindValue;
use serde_json::{Map, Value};

/// Quote identifier for PostgreSQL (safe: only from the validated catalog).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Table name, schema-qualified when the catalog names a schema.
pub fn qualified_table(resource: &ResolvedResource) -> String {
    match &resource.schema_name {
        Some(schema) => format!("{}.{}", quoted(schema), quoted(&resource.table_name)),
        None => quoted(&resource.table_name),
    }
}

fn placeholder(n: usize, ty: FieldType) -> String {
    format!("${}::{}", n, ty.pg_type())
}

/// Update timestamp expression: strictly after the stored value even when the clock has not moved.
fn next_updated_at(resource: &ResolvedResource) -> String {
    format!(
        "GREATEST(NOW(), {} + INTERVAL '1 microsecond')",
        quoted(&resource.updated_column)
    )
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: PgBindValue) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// id, fields, created, updated.
fn select_column_list(resource: &ResolvedResource) -> String {
    resource.column_names().map(quoted).collect::<Vec<_>>().join(", ")
}

/// SELECT one row by id.
pub fn select_by_id(resource: &ResolvedResource, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(PgBindValue::I64(id));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(resource),
        qualified_table(resource),
        quoted(ID_COLUMN),
        placeholder(n, FieldType::Integer)
    );
    q
}

/// SELECT all rows, id ascending.
pub fn select_list(resource: &ResolvedResource) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} ORDER BY {}",
        select_column_list(resource),
        qualified_table(resource),
        quoted(ID_COLUMN)
    );
    q
}

/// INSERT the fields present in body (in catalog order); omitted fields fall back to the column
/// default or NULL. Both timestamps are set to the same NOW().
pub fn insert(resource: &ResolvedResource, body: &Map<String, Value>) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut values = Vec::new();
    for f in &resource.fields {
        let Some(v) = body.get(&f.name) else { continue };
        let bind = PgBindValue::for_field(f.field_type, v).map_err(|e| field_error(&f.name, e))?;
        let n = q.push_param(bind);
        cols.push(quoted(&f.name));
        values.push(placeholder(n, f.field_type));
    }
    cols.push(quoted(&resource.created_column));
    values.push("NOW()".into());
    cols.push(quoted(&resource.updated_column));
    values.push("NOW()".into());
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        qualified_table(resource),
        cols.join(", "),
        values.join(", "),
        select_column_list(resource)
    );
    Ok(q)
}

/// UPDATE by id: SET only fields present and non-null in body, always advance the update timestamp.
/// Single statement; no row returned means the id does not exist.
pub fn update(resource: &ResolvedResource, id: i64, body: &Map<String, Value>) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for f in &resource.fields {
        let Some(v) = body.get(&f.name) else { continue };
        if v.is_null() {
            continue;
        }
        let bind = PgBindValue::for_field(f.field_type, v).map_err(|e| field_error(&f.name, e))?;
        let n = q.push_param(bind);
        sets.push(format!("{} = {}", quoted(&f.name), placeholder(n, f.field_type)));
    }
    sets.push(format!("{} = {}", quoted(&resource.updated_column), next_updated_at(resource)));
    let id_param = q.push_param(PgBindValue::I64(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        qualified_table(resource),
        sets.join(", "),
        quoted(ID_COLUMN),
        placeholder(id_param, FieldType::Integer),
        select_column_list(resource)
    );
    Ok(q)
}

/// DELETE by id, returning the id when a row was removed.
pub fn delete(resource: &ResolvedResource, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(PgBindValue::I64(id));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        qualified_table(resource),
        quoted(ID_COLUMN),
        placeholder(n, FieldType::Integer),
        quoted(ID_COLUMN)
    );
    q
}

/// Set the toggle flag on every row matching the keys; insert one row when none match.
/// `key_values` follow `toggle.keys` order.
pub fn toggle_upsert(
    resource: &ResolvedResource,
    toggle: &ToggleConfig,
    key_values: Vec<PgBindValue>,
    flag: bool,
    message: &str,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = qualified_table(resource);

    let mut key_cols = Vec::new();
    let mut key_phs = Vec::new();
    for (name, v) in toggle.keys.iter().zip(key_values) {
        let ty = resource.field(name).map(|f| f.field_type).unwrap_or(FieldType::Text);
        let n = q.push_param(v);
        key_cols.push(quoted(name));
        key_phs.push(placeholder(n, ty));
    }
    let flag_ph = placeholder(q.push_param(PgBindValue::Bool(flag)), FieldType::Boolean);
    let message_ph = placeholder(q.push_param(PgBindValue::Text(message.to_string())), FieldType::Text);

    let matches = key_cols
        .iter()
        .zip(&key_phs)
        .map(|(c, p)| format!("{} = {}", c, p))
        .collect::<Vec<_>>()
        .join(" AND ");

    let mut insert_cols = key_cols.clone();
    insert_cols.push(quoted(&toggle.flag));
    insert_cols.push(quoted(&toggle.message_field));
    insert_cols.push(quoted(&resource.created_column));
    insert_cols.push(quoted(&resource.updated_column));
    let mut insert_vals = key_phs.clone();
    insert_vals.push(flag_ph.clone());
    insert_vals.push(message_ph);
    insert_vals.push("NOW()".into());
    insert_vals.push("NOW()".into());

    q.sql = format!(
        "WITH updated AS (UPDATE {table} SET {flag} = {flag_ph}, {upd} = {next} WHERE {matches} RETURNING {id}) \
         INSERT INTO {table} ({cols}) SELECT {vals} WHERE NOT EXISTS (SELECT 1 FROM updated)",
        table = table,
        flag = quoted(&toggle.flag),
        flag_ph = flag_ph,
        upd = quoted(&resource.updated_column),
        next = next_updated_at(resource),
        matches = matches,
        id = quoted(ID_COLUMN),
        cols = insert_cols.join(", "),
        vals = insert_vals.join(", "),
    );
    q
}

fn field_error(field: &str, e: AppError) -> AppError {
    match e {
        AppError::Validation(msg) => AppError::Validation(format!("{}: {}", field, msg)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin_catalog, resolve, ResolvedModel};
    use serde_json::json;

    fn model() -> ResolvedModel {
        resolve(&builtin_catalog().unwrap(), None).unwrap()
    }

    fn body(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn list_is_ordered_by_id() {
        let m = model();
        let q = select_list(m.resource("currency").unwrap());
        assert_eq!(
            q.sql,
            r#"SELECT "id", "currencyname", "country", "createdat", "updatedat" FROM "currencies" ORDER BY "id""#
        );
        assert!(q.params.is_empty());
    }

    #[test]
    fn select_by_id_binds_id() {
        let m = model();
        let q = select_by_id(m.resource("tax").unwrap(), 7);
        assert!(q.sql.ends_with(r#"FROM "taxes" WHERE "id" = $1::bigint"#));
        assert_eq!(q.params, [PgBindValue::I64(7)]);
    }

    #[test]
    fn insert_sets_both_timestamps_and_skips_omitted() {
        let m = model();
        let q = insert(
            m.resource("notification").unwrap(),
            &body(json!({"message": "m", "module": "orders", "action": "created"})),
        )
        .unwrap();
        assert_eq!(
            q.sql,
            r#"INSERT INTO "notifications" ("message", "module", "action", "created_at", "updated_at") VALUES ($1::text, $2::text, $3::text, NOW(), NOW()) RETURNING "id", "message", "module", "action", "read", "created_at", "updated_at""#
        );
        assert_eq!(q.params.len(), 3);
    }

    #[test]
    fn insert_ignores_unknown_and_server_keys() {
        let m = model();
        let q = insert(
            m.resource("currency").unwrap(),
            &body(json!({"id": 99, "createdat": "x", "currencyname": "Dollar", "country": "USA", "extra": 1})),
        )
        .unwrap();
        assert_eq!(q.params, [PgBindValue::Text("Dollar".into()), PgBindValue::Text("USA".into())]);
    }

    #[test]
    fn update_touches_only_present_non_null_fields() {
        let m = model();
        let q = update(
            m.resource("currency").unwrap(),
            3,
            &body(json!({"country": "United States", "currencyname": null})),
        )
        .unwrap();
        assert_eq!(
            q.sql,
            r#"UPDATE "currencies" SET "country" = $1::text, "updatedat" = GREATEST(NOW(), "updatedat" + INTERVAL '1 microsecond') WHERE "id" = $2::bigint RETURNING "id", "currencyname", "country", "createdat", "updatedat""#
        );
        assert_eq!(q.params, [PgBindValue::Text("United States".into()), PgBindValue::I64(3)]);
    }

    #[test]
    fn empty_update_still_advances_timestamp() {
        let m = model();
        let q = update(m.resource("terms_conditions").unwrap(), 1, &Map::new()).unwrap();
        assert!(q.sql.starts_with(r#"UPDATE "terms_conditions" SET "updated_at" = GREATEST("#));
        assert_eq!(q.params, [PgBindValue::I64(1)]);
    }

    #[test]
    fn update_rejects_wrong_type_with_field_name() {
        let m = model();
        let err = update(m.resource("tax").unwrap(), 1, &body(json!({"value": "ten"}))).unwrap_err();
        assert_eq!(err.to_string(), "value: expected a number, got string");
    }

    #[test]
    fn delete_returns_id() {
        let m = model();
        let q = delete(m.resource("privacy_policy").unwrap(), 4);
        assert_eq!(q.sql, r#"DELETE FROM "privacy_policies" WHERE "id" = $1::bigint RETURNING "id""#);
    }

    #[test]
    fn schema_qualifies_table() {
        let mut catalog = builtin_catalog().unwrap();
        catalog.schema = Some("settings".into());
        let m = resolve(&catalog, None).unwrap();
        assert_eq!(qualified_table(m.resource("language").unwrap()), r#""settings"."languages""#);
    }

    #[test]
    fn toggle_is_single_statement_upsert() {
        let m = model();
        let r = m.resource("notification").unwrap();
        let toggle = r.toggle.as_ref().unwrap();
        let q = toggle_upsert(
            r,
            toggle,
            vec![PgBindValue::Text("orders".into()), PgBindValue::Text("created".into())],
            true,
            "Notification for created updated",
        );
        assert!(q.sql.starts_with(r#"WITH updated AS (UPDATE "notifications" SET "read" = $3::boolean"#));
        assert!(q.sql.contains(r#"WHERE "module" = $1::text AND "action" = $2::text RETURNING "id")"#));
        assert!(q.sql.contains(
            r#"INSERT INTO "notifications" ("module", "action", "read", "message", "created_at", "updated_at") SELECT $1::text, $2::text, $3::boolean, $4::text, NOW(), NOW()"#
        ));
        assert!(q.sql.ends_with("WHERE NOT EXISTS (SELECT 1 FROM updated)"));
        assert_eq!(q.params.len(), 4);
    }
}
