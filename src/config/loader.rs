//! Load the catalog (built-in or from a JSON file) and resolve it into the runtime model.

use crate::config::resolved::{ResolvedField, ResolvedModel, ResolvedResource};
use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use regex::Regex;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../../resources/catalog.json");

/// The nine business-settings resources shipped with the crate.
pub fn builtin_catalog() -> Result<CatalogConfig, ConfigError> {
    parse_catalog(BUILTIN_CATALOG)
}

pub fn parse_catalog(json: &str) -> Result<CatalogConfig, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

pub async fn load_catalog_from_path(path: &Path) -> Result<CatalogConfig, ConfigError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse_catalog(&raw)
}

/// Build resolved model from the catalog. `enabled` restricts the mounted resources by name;
/// None mounts all. Order follows the catalog.
pub fn resolve(catalog: &CatalogConfig, enabled: Option<&[String]>) -> Result<ResolvedModel, ConfigError> {
    validate(catalog)?;

    if let Some(names) = enabled {
        for n in names {
            if !catalog.resources.iter().any(|r| &r.name == n) {
                return Err(ConfigError::UnknownResource(n.clone()));
            }
        }
    }

    let mut resources = Vec::new();
    for r in &catalog.resources {
        if let Some(names) = enabled {
            if !names.contains(&r.name) {
                continue;
            }
        }
        let mut fields = Vec::with_capacity(r.fields.len());
        for f in &r.fields {
            let pattern = f
                .validation
                .pattern
                .as_deref()
                .map(Regex::new)
                .transpose()
                .map_err(|e| ConfigError::Validation(format!("pattern for {}.{}: {}", r.name, f.name, e)))?;
            fields.push(ResolvedField {
                name: f.name.clone(),
                field_type: f.type_,
                required: f.required,
                nullable: f.nullable,
                default: f.default.clone(),
                rule: f.validation.clone(),
                pattern,
            });
        }
        resources.push(ResolvedResource {
            name: r.name.clone(),
            label: r.label.clone(),
            schema_name: catalog.schema.clone(),
            table_name: r.table.clone(),
            path: r.path.clone(),
            fields,
            created_column: r.timestamps.created.clone(),
            updated_column: r.timestamps.updated.clone(),
            toggle: r.toggle.clone(),
        });
    }
    Ok(ResolvedModel::new(resources))
}
