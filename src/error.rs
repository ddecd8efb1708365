use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::datasource::DataSourceError;
use crate::domain::{AddressParseError, DebtIdParseError};
use crate::engine::ShareError;
use crate::orchestration::SplitError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl From<DataSourceError> for AppError {
    fn from(err: DataSourceError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

impl From<AddressParseError> for AppError {
    fn from(err: AddressParseError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<DebtIdParseError> for AppError {
    fn from(err: DebtIdParseError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<SplitError> for AppError {
    fn from(err: SplitError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<ShareError> for AppError {
    fn from(err: ShareError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
