//! Request validation from catalog field types and rules.

use crate::config::{ResolvedField, ResolvedResource};
use crate::error::AppError;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a create body: every required field present and non-null, every present field well-typed.
    pub fn validate(body: &Map<String, Value>, resource: &ResolvedResource) -> Result<(), AppError> {
        for f in &resource.fields {
            match body.get(&f.name) {
                None | Some(Value::Null) if f.required => {
                    return Err(AppError::Validation(format!("{} is required", f.name)));
                }
                Some(Value::Null) if !f.nullable => {
                    return Err(AppError::Validation(format!("{} cannot be null", f.name)));
                }
                Some(v) if !v.is_null() => validate_field(f, v)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Validate only the fields present in body (for update). Null means "keep the stored value".
    pub fn validate_partial(body: &Map<String, Value>, resource: &ResolvedResource) -> Result<(), AppError> {
        for f in &resource.fields {
            if let Some(v) = body.get(&f.name) {
                if !v.is_null() {
                    validate_field(f, v)?;
                }
            }
        }
        Ok(())
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email pattern"))
}

fn validate_field(f: &ResolvedField, v: &Value) -> Result<(), AppError> {
    let col = f.name.as_str();
    if !f.field_type.accepts(v) {
        return Err(AppError::Validation(format!("{} must be {}", col, f.field_type.name())));
    }
    let rule = &f.rule;
    if let Some(format) = &rule.format {
        if format.eq_ignore_ascii_case("email") {
            if let Some(s) = v.as_str() {
                if !email_regex().is_match(s) {
                    return Err(AppError::Validation(format!("{} must be a valid email", col)));
                }
            }
        }
    }
    if let Some(s) = v.as_str() {
        let len = s.chars().count();
        if let Some(max) = rule.max_length {
            if len > max as usize {
                return Err(AppError::Validation(format!(
                    "{} must be at most {} characters",
                    col, max
                )));
            }
        }
        if let Some(min) = rule.min_length {
            if len < min as usize {
                return Err(AppError::Validation(format!(
                    "{} must be at least {} characters",
                    col, min
                )));
            }
        }
        if let Some(re) = &f.pattern {
            if !re.is_match(s) {
                return Err(AppError::Validation(format!("{} does not match required pattern", col)));
            }
        }
    }
    if let Some(ref allowed) = rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            return Err(AppError::Validation(format!(
                "{} must be one of: {:?}",
                col,
                allowed.iter().take(5).collect::<Vec<_>>()
            )));
        }
    }
    if let Some(n) = v.as_f64() {
        if let Some(min) = rule.minimum {
            if n < min {
                return Err(AppError::Validation(format!("{} must be at least {}", col, min)));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                return Err(AppError::Validation(format!("{} must be at most {}", col, max)));
            }
        }
    }
    Ok(())
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}
