//! Catalog validation: identifiers, uniqueness, field consistency.

use crate::config::{CatalogConfig, FieldConfig, ResourceConfig};
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;

const RESERVED_ID: &str = "id";
const RESERVED_PATHS: [&str; 4] = ["/health", "/ready", "/version", "/info"];

pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    s.len() <= 63 && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn is_route_path(s: &str) -> bool {
    s.starts_with('/')
        && s[1..].split('/').all(|seg| {
            !seg.is_empty()
                && seg
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        })
}

fn check_identifier(kind: &'static str, value: &str) -> Result<(), ConfigError> {
    if is_identifier(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            kind,
            value: value.to_string(),
        })
    }
}

pub fn validate(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.resources.is_empty() {
        return Err(ConfigError::Validation("at least one resource required".into()));
    }
    if let Some(schema) = &catalog.schema {
        check_identifier("schema", schema)?;
    }

    let mut names = HashSet::new();
    let mut tables = HashSet::new();
    let mut paths = HashSet::new();
    for r in &catalog.resources {
        check_identifier("resource", &r.name)?;
        check_identifier("table", &r.table)?;
        if !is_route_path(&r.path) {
            return Err(ConfigError::Validation(format!(
                "resource {}: path '{}' must look like /segment or /segment/segment",
                r.name, r.path
            )));
        }
        if !names.insert(r.name.as_str()) {
            return Err(ConfigError::Duplicate { kind: "resource", value: r.name.clone() });
        }
        if !tables.insert(r.table.as_str()) {
            return Err(ConfigError::Duplicate { kind: "table", value: r.table.clone() });
        }
        if !paths.insert(r.path.as_str()) {
            return Err(ConfigError::Duplicate { kind: "path", value: r.path.clone() });
        }
        if RESERVED_PATHS.contains(&r.path.as_str()) {
            return Err(ConfigError::Validation(format!("resource {}: path '{}' is reserved", r.name, r.path)));
        }
        validate_resource(r)?;
    }
    // A path nested under another resource's path would collide with its `/:id` and `/settings` routes.
    for a in &paths {
        if let Some(b) = paths.iter().find(|b| b.starts_with(&format!("{}/", a))) {
            return Err(ConfigError::Validation(format!("path '{}' is nested under '{}'", b, a)));
        }
    }
    Ok(())
}

fn validate_resource(r: &ResourceConfig) -> Result<(), ConfigError> {
    check_identifier("timestamp column", &r.timestamps.created)?;
    check_identifier("timestamp column", &r.timestamps.updated)?;
    if r.timestamps.created == r.timestamps.updated {
        return Err(ConfigError::Validation(format!(
            "resource {}: created and updated timestamp columns must differ",
            r.name
        )));
    }
    if r.fields.is_empty() {
        return Err(ConfigError::Validation(format!("resource {}: no fields", r.name)));
    }

    let reserved = [RESERVED_ID, r.timestamps.created.as_str(), r.timestamps.updated.as_str()];
    let mut seen = HashSet::new();
    for f in &r.fields {
        check_identifier("field", &f.name)?;
        if reserved.contains(&f.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "resource {}: field '{}' collides with a server-managed column",
                r.name, f.name
            )));
        }
        if !seen.insert(f.name.as_str()) {
            return Err(ConfigError::Duplicate {
                kind: "field",
                value: format!("{}.{}", r.name, f.name),
            });
        }
        validate_field(&r.name, f)?;
    }

    if let Some(t) = &r.toggle {
        let field = |name: &str| r.fields.iter().find(|f| f.name == name);
        if t.keys.is_empty() {
            return Err(ConfigError::Validation(format!("resource {}: toggle needs at least one key", r.name)));
        }
        for k in &t.keys {
            if field(k).is_none() {
                return Err(ConfigError::Validation(format!("resource {}: toggle key '{}' is not a field", r.name, k)));
            }
        }
        match field(&t.flag) {
            Some(f) if f.type_ == crate::config::FieldType::Boolean => {}
            _ => {
                return Err(ConfigError::Validation(format!(
                    "resource {}: toggle flag '{}' must be a boolean field",
                    r.name, t.flag
                )))
            }
        }
        match field(&t.message_field) {
            Some(f) if f.type_ == crate::config::FieldType::Text => {}
            _ => {
                return Err(ConfigError::Validation(format!(
                    "resource {}: toggle message field '{}' must be a text field",
                    r.name, t.message_field
                )))
            }
        }
        if t.keys.contains(&t.flag) || t.keys.contains(&t.message_field) || t.flag == t.message_field {
            return Err(ConfigError::Validation(format!(
                "resource {}: toggle keys, flag and message field must be distinct",
                r.name
            )));
        }
        for f in r.fields.iter().filter(|f| f.required) {
            let covered = t.keys.contains(&f.name) || f.name == t.flag || f.name == t.message_field;
            if !covered {
                return Err(ConfigError::Validation(format!(
                    "resource {}: required field '{}' is not set by the toggle insert",
                    r.name, f.name
                )));
            }
        }
    }
    Ok(())
}

fn validate_field(resource: &str, f: &FieldConfig) -> Result<(), ConfigError> {
    if !f.required && !f.nullable && f.default.is_none() {
        return Err(ConfigError::Validation(format!(
            "resource {}: field '{}' must be required, nullable, or have a default",
            resource, f.name
        )));
    }
    if let Some(d) = &f.default {
        if !f.type_.accepts(d) {
            return Err(ConfigError::Validation(format!(
                "resource {}: default for '{}' must be {}",
                resource,
                f.name,
                f.type_.name()
            )));
        }
    }
    if let Some(p) = &f.validation.pattern {
        Regex::new(p).map_err(|e| {
            ConfigError::Validation(format!("resource {}: invalid pattern for '{}': {}", resource, f.name, e))
        })?;
    }
    if let Some(format) = &f.validation.format {
        if !format.eq_ignore_ascii_case("email") {
            return Err(ConfigError::Validation(format!(
                "resource {}: unknown format '{}' for '{}'",
                resource, format, f.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FieldType, TimestampColumns, ToggleConfig, ValidationRule};

    fn text(name: &str) -> FieldConfig {
        FieldConfig {
            name: name.into(),
            type_: FieldType::Text,
            required: true,
            nullable: false,
            default: None,
            validation: ValidationRule::default(),
        }
    }

    fn resource(name: &str, path: &str) -> ResourceConfig {
        ResourceConfig {
            name: name.into(),
            label: name.into(),
            table: format!("{}s", name),
            path: path.into(),
            fields: vec![text("title")],
            timestamps: TimestampColumns::default(),
            toggle: None,
        }
    }

    fn catalog(resources: Vec<ResourceConfig>) -> CatalogConfig {
        CatalogConfig { schema: None, resources }
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("created_at"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("Title"));
        assert!(!is_identifier("a\"b"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn route_paths() {
        assert!(is_route_path("/currency"));
        assert!(is_route_path("/api/privacy"));
        assert!(!is_route_path("currency"));
        assert!(!is_route_path("/currency/"));
        assert!(!is_route_path("/"));
        assert!(!is_route_path("/a/:id"));
    }

    #[test]
    fn reserved_and_nested_paths_rejected() {
        assert!(validate(&catalog(vec![resource("a", "/health")])).is_err());
        assert!(validate(&catalog(vec![resource("a", "/api"), resource("b", "/api/b")])).is_err());
        assert!(validate(&catalog(vec![resource("a", "/api/a"), resource("b", "/api/b")])).is_ok());
    }

    #[test]
    fn empty_catalog_rejected() {
        assert!(validate(&catalog(vec![])).is_err());
    }

    #[test]
    fn duplicate_path_rejected() {
        let err = validate(&catalog(vec![resource("a", "/x"), resource("b", "/x")])).unwrap_err();
        assert!(matches!(err, ConfigError::Duplicate { kind: "path", .. }));
    }

    #[test]
    fn field_named_like_timestamp_rejected() {
        let mut r = resource("a", "/a");
        r.fields.push(text("updated_at"));
        assert!(validate(&catalog(vec![r])).is_err());
    }

    #[test]
    fn optional_field_needs_nullable_or_default() {
        let mut r = resource("a", "/a");
        let mut f = text("note");
        f.required = false;
        r.fields.push(f.clone());
        assert!(validate(&catalog(vec![r.clone()])).is_err());

        r.fields.pop();
        f.default = Some(serde_json::json!(""));
        r.fields.push(f);
        assert!(validate(&catalog(vec![r])).is_ok());
    }

    #[test]
    fn default_type_must_match() {
        let mut r = resource("a", "/a");
        r.fields.push(FieldConfig {
            name: "read".into(),
            type_: FieldType::Boolean,
            required: false,
            nullable: false,
            default: Some(serde_json::json!("no")),
            validation: ValidationRule::default(),
        });
        assert!(validate(&catalog(vec![r])).is_err());
    }

    #[test]
    fn bad_pattern_rejected() {
        let mut r = resource("a", "/a");
        r.fields[0].validation.pattern = Some("([".into());
        assert!(validate(&catalog(vec![r])).is_err());
    }

    #[test]
    fn toggle_flag_must_be_boolean() {
        let mut r = resource("a", "/a");
        r.fields.push(text("module"));
        r.toggle = Some(ToggleConfig {
            keys: vec!["module".into()],
            flag: "title".into(),
            param: "enabled".into(),
            message_field: "title".into(),
            message_template: "x".into(),
        });
        assert!(validate(&catalog(vec![r])).is_err());
    }
}
