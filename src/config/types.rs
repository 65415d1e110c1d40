//! Raw catalog types matching the JSON catalog format (see resources/catalog.json).

use serde::{Deserialize, Serialize};

/// Column type of a resource field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Integer,
    Number,
    Boolean,
}

impl FieldType {
    /// PostgreSQL type used for DDL and parameter casts.
    pub fn pg_type(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Integer => "bigint",
            FieldType::Number => "double precision",
            FieldType::Boolean => "boolean",
        }
    }

    /// Whether a JSON value has the shape this field type accepts.
    pub fn accepts(&self, v: &serde_json::Value) -> bool {
        match self {
            FieldType::Text => v.is_string(),
            FieldType::Integer => v.is_i64(),
            FieldType::Number => v.is_number(),
            FieldType::Boolean => v.is_boolean(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Text => "a string",
            FieldType::Integer => "an integer",
            FieldType::Number => "a number",
            FieldType::Boolean => "a boolean",
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: FieldType,
    /// Must be present and non-null on create.
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub nullable: bool,
    /// Column default used when create omits the field.
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub validation: ValidationRule,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimestampColumns {
    #[serde(default = "default_created")]
    pub created: String,
    #[serde(default = "default_updated")]
    pub updated: String,
}

impl Default for TimestampColumns {
    fn default() -> Self {
        TimestampColumns {
            created: default_created(),
            updated: default_updated(),
        }
    }
}

fn default_created() -> String {
    "created_at".into()
}

fn default_updated() -> String {
    "updated_at".into()
}

/// Upsert-by-key endpoint (`PUT {path}/settings`): sets `flag` on records matching `keys`,
/// inserting one with a rendered message when none match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToggleConfig {
    pub keys: Vec<String>,
    pub flag: String,
    /// Query parameter carrying the flag value.
    #[serde(default = "default_toggle_param")]
    pub param: String,
    pub message_field: String,
    /// `{key}` placeholders are replaced with the key values.
    pub message_template: String,
}

fn default_toggle_param() -> String {
    "enabled".into()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub name: String,
    /// Human-readable name used in messages ("Currency not found").
    pub label: String,
    pub table: String,
    /// URL prefix, e.g. "/currency" or "/api/privacy".
    pub path: String,
    pub fields: Vec<FieldConfig>,
    #[serde(default)]
    pub timestamps: TimestampColumns,
    #[serde(default)]
    pub toggle: Option<ToggleConfig>,
}

/// Whole catalog file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Schema holding every resource table. None = connection's search_path.
    #[serde(default)]
    pub schema: Option<String>,
    pub resources: Vec<ResourceConfig>,
}
