pub mod admin;
pub mod dishes;
pub mod logs;

use axum::extract::{rejection::PathRejection, Path};
use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Serialize)]
pub struct Created {
    pub id: i64,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

/// The raw `{id}` segment. A segment axum cannot decode counts as an invalid id.
pub(crate) fn id_segment(
    segment: Result<Path<String>, PathRejection>,
    resource: &'static str,
) -> Result<String, AppError> {
    segment.map(|Path(raw)| raw).map_err(|rejection| {
        tracing::debug!("Rejected {resource} id segment: {}", rejection.body_text());
        AppError::InvalidId(resource)
    })
}
