use crate::error::AppError;
use axum::extract::FromRequest;

/// `axum::Json` with rejections reported as `AppError`, so a bad body gets the usual error shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
