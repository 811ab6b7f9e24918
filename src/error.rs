use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("database binding is not configured")]
    DbUnavailable,
    #[error("missing or wrong backup key")]
    Unauthorized,
    #[error("invalid {0} id")]
    InvalidId(&'static str),
    #[error("request validation failed")]
    ValidationFailed(Vec<String>),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("query failed: {0}")]
    QueryFailed(#[from] sqlx::Error),
    #[error("create failed: {0}")]
    CreateFailed(sqlx::Error),
    #[error("update failed: {0}")]
    UpdateFailed(sqlx::Error),
    #[error("delete failed: {0}")]
    DeleteFailed(sqlx::Error),
}

/// A query string serde cannot map onto the filter struct, e.g. a repeated key.
impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::ValidationFailed(vec![rejection.body_text()])
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorPayload,
}

#[derive(Serialize)]
struct ErrorPayload {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InvalidId(_) | AppError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::DbUnavailable
            | AppError::QueryFailed(_)
            | AppError::CreateFailed(_)
            | AppError::UpdateFailed(_)
            | AppError::DeleteFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::DbUnavailable => "DB_BINDING_MISSING",
            AppError::Unauthorized => "BACKUP_AUTH_FAILED",
            AppError::InvalidId(_) => "INVALID_ID",
            AppError::ValidationFailed(_) => "VALIDATION_FAILED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            AppError::QueryFailed(_) => "QUERY_FAILED",
            AppError::CreateFailed(_) => "CREATE_FAILED",
            AppError::UpdateFailed(_) => "UPDATE_FAILED",
            AppError::DeleteFailed(_) => "DELETE_FAILED",
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            AppError::ValidationFailed(fields) => Some(json!({ "fields": fields })),
            AppError::QueryFailed(e)
            | AppError::CreateFailed(e)
            | AppError::UpdateFailed(e)
            | AppError::DeleteFailed(e) => Some(json!({ "cause": e.to_string() })),
            _ => None,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::QueryFailed(_) => "failed to query the database".to_string(),
            AppError::CreateFailed(_) => "failed to create record".to_string(),
            AppError::UpdateFailed(_) => "failed to update record".to_string(),
            AppError::DeleteFailed(_) => "failed to delete record".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Unauthorized => tracing::warn!("Rejected backup request: {self}"),
            _ if status.is_server_error() => tracing::error!("Request failed: {self}"),
            _ => tracing::debug!("Request rejected: {self}"),
        }

        let body = ErrorBody {
            error: ErrorPayload {
                code: self.code(),
                message: self.message(),
                details: self.details(),
            },
        };
        (status, Json(body)).into_response()
    }
}
