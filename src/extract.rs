use axum::extract::FromRequest;

use crate::error::AppError;

/// JSON request body whose rejections render as `AppError::Validation`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
