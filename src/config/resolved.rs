//! Resolved resource model: catalog validated and flattened for runtime use.

use crate::config::{FieldType, ToggleConfig, ValidationRule};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// Primary key column shared by every resource table.
pub const ID_COLUMN: &str = "id";

#[derive(Clone, Debug)]
pub struct ResolvedField {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub nullable: bool,
    pub default: Option<serde_json::Value>,
    pub rule: ValidationRule,
    /// Compiled `rule.pattern`.
    pub pattern: Option<Regex>,
}

#[derive(Clone, Debug)]
pub struct ResolvedResource {
    pub name: String,
    pub label: String,
    pub schema_name: Option<String>,
    pub table_name: String,
    pub path: String,
    pub fields: Vec<ResolvedField>,
    pub created_column: String,
    pub updated_column: String,
    pub toggle: Option<ToggleConfig>,
}

impl ResolvedResource {
    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Column names in response order: id, fields, created, updated.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(ID_COLUMN)
            .chain(self.fields.iter().map(|f| f.name.as_str()))
            .chain([self.created_column.as_str(), self.updated_column.as_str()])
    }
}

#[derive(Clone, Debug, Default)]
pub struct ResolvedModel {
    pub resources: Vec<Arc<ResolvedResource>>,
    by_name: HashMap<String, Arc<ResolvedResource>>,
}

impl ResolvedModel {
    pub fn new(resources: Vec<ResolvedResource>) -> Self {
        let resources: Vec<Arc<ResolvedResource>> = resources.into_iter().map(Arc::new).collect();
        let by_name = resources.iter().map(|r| (r.name.clone(), Arc::clone(r))).collect();
        ResolvedModel { resources, by_name }
    }

    pub fn resource(&self, name: &str) -> Option<&Arc<ResolvedResource>> {
        self.by_name.get(name)
    }
}
