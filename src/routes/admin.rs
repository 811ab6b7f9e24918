use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::auth::BackupAccess;
use crate::backup;
use crate::db;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Serialize)]
struct Stats {
    total_dishes: i64,
    total_categories: i64,
    total_logs: i64,
    last_updated: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/stats", get(stats))
        .route("/admin/backup", get(export_backup))
}

async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let db = state.db()?;

    let (total_dishes, total_categories, last_updated): (i64, i64, Option<String>) =
        sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(DISTINCT CASE WHEN category IS NOT NULL AND TRIM(category) != '' THEN category END),
                MAX(updated_at)
            FROM dishes
            "#,
        )
        .fetch_one(db)
        .await?;

    let total_logs = if db::table_exists(db, "cooking_log").await? {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cooking_log")
            .fetch_one(db)
            .await?;
        count
    } else {
        0
    };

    Ok(Json(Stats {
        total_dishes,
        total_categories,
        total_logs,
        last_updated,
    }))
}

async fn export_backup(
    _access: BackupAccess,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db()?;

    let tables = backup::collect(db).await?;
    let generated_at = chrono::Utc::now();
    let dump = backup::render(&tables, generated_at);
    tracing::info!(bytes = dump.len(), "Exported backup");

    let content_disposition = format!(
        "attachment; filename=\"{}\"",
        backup::filename(generated_at)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/sql; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition),
        ],
        dump,
    ))
}
