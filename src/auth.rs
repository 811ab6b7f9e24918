use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::AppState;

pub const BACKUP_KEY_HEADER: &str = "x-backup-key";

/// Proof that the caller may download a backup. When no key is configured
/// the endpoint is open and this always succeeds.
pub struct BackupAccess;

impl FromRequestParts<AppState> for BackupAccess {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.backup_key.as_deref() else {
            return Ok(BackupAccess);
        };

        let provided = parts
            .headers
            .get(BACKUP_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();

        if keys_match(provided.as_bytes(), expected.as_bytes()) {
            Ok(BackupAccess)
        } else {
            Err(AppError::Unauthorized)
        }
    }
}

/// Compares every byte regardless of where the first mismatch is.
fn keys_match(provided: &[u8], expected: &[u8]) -> bool {
    if provided.len() != expected.len() {
        return false;
    }
    provided
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
