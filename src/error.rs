//! Typed errors and HTTP mapping.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("catalog load: {0}")]
    Load(String),
    #[error("catalog validation: {0}")]
    Validation(String),
    #[error("duplicate {kind}: {value}")]
    Duplicate { kind: &'static str, value: String },
    #[error("invalid identifier for {kind}: '{value}'")]
    InvalidIdentifier { kind: &'static str, value: String },
    #[error("unknown resource: {0}")]
    UnknownResource(String),
    #[error("settings: {0}")]
    Settings(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] sqlx::Error),
    #[error("unexpected: {0}")]
    Unexpected(#[source] sqlx::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => AppError::StorageUnavailable(e),
            sqlx::Error::RowNotFound => AppError::NotFound("Record".into()),
            sqlx::Error::Database(db) => {
                let code = db.code();
                match code.as_deref().map(sqlstate_class) {
                    // connection exception, insufficient resources, operator intervention
                    Some("08") | Some("53") | Some("57") => AppError::StorageUnavailable(e),
                    // data exception, integrity constraint violation
                    Some("22") | Some("23") => {
                        tracing::warn!(error = %db, "statement rejected by database");
                        AppError::Validation("value rejected by the database".into())
                    }
                    _ => AppError::Unexpected(e),
                }
            }
            _ => AppError::Unexpected(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "request body rejected");
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                AppError::BadRequest("content type must be application/json".into())
            }
            _ => AppError::BadRequest("body must be valid JSON".into()),
        }
    }
}

fn sqlstate_class(code: &str) -> &str {
    code.get(..2).unwrap_or(code)
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation_error",
            AppError::BadRequest(_) => "bad_request",
            AppError::StorageUnavailable(_) => "storage_unavailable",
            AppError::Unexpected(_) => "internal_error",
        }
    }

    /// Message safe to return to the caller. Server-side failures are logged here with full detail.
    fn public_message(&self) -> String {
        match self {
            AppError::StorageUnavailable(e) => {
                tracing::error!(error = %e, "database connection failed");
                "Database connection failed".into()
            }
            AppError::Unexpected(e) => {
                tracing::error!(error = ?e, "unexpected storage error");
                "Internal Server Error".into()
            }
            AppError::Config(e) => {
                tracing::error!(error = %e, "configuration error at request time");
                "Internal Server Error".into()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.public_message(),
            },
        };
        (status, Json(body)).into_response()
    }
}
