//! Convert validated JSON field values into typed values sqlx can bind.

use crate::config::FieldType;
use crate::error::AppError;
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::Database;

/// A value bound to a PostgreSQL query, typed by the field it targets.
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    Null(FieldType),
    Bool(bool),
    I64(i64),
    F64(f64),
    Text(String),
}

impl PgBindValue {
    /// Convert `v` for a column of type `ty`. Integers are accepted for number columns.
    pub fn for_field(ty: FieldType, v: &Value) -> Result<Self, AppError> {
        let mismatch = || AppError::Validation(format!("expected {}, got {}", ty.name(), json_kind(v)));
        Ok(match (ty, v) {
            (_, Value::Null) => PgBindValue::Null(ty),
            (FieldType::Text, Value::String(s)) => PgBindValue::Text(s.clone()),
            (FieldType::Integer, Value::Number(n)) => PgBindValue::I64(n.as_i64().ok_or_else(mismatch)?),
            (FieldType::Number, Value::Number(n)) => PgBindValue::F64(n.as_f64().ok_or_else(mismatch)?),
            (FieldType::Boolean, Value::Bool(b)) => PgBindValue::Bool(*b),
            _ => return Err(mismatch()),
        })
    }

    fn pg_type_info(&self) -> PgTypeInfo {
        let ty = match self {
            PgBindValue::Null(ty) => *ty,
            PgBindValue::Bool(_) => FieldType::Boolean,
            PgBindValue::I64(_) => FieldType::Integer,
            PgBindValue::F64(_) => FieldType::Number,
            PgBindValue::Text(_) => FieldType::Text,
        };
        match ty {
            FieldType::Text => PgTypeInfo::with_name("TEXT"),
            FieldType::Integer => PgTypeInfo::with_name("INT8"),
            FieldType::Number => PgTypeInfo::with_name("FLOAT8"),
            FieldType::Boolean => PgTypeInfo::with_name("BOOL"),
        }
    }
}

pub(crate) fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            PgBindValue::Null(_) => IsNull::Yes,
            PgBindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            PgBindValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            PgBindValue::Text(s) => {
                let s_ref: &str = s.as_str();
                <&str as Encode<Postgres>>::encode_by_ref(&s_ref, buf)?
            }
        })
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(self.pg_type_info())
    }
}

impl sqlx::Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}
