use axum::{
    body::Bytes,
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::db;
use crate::error::AppError;
use crate::models::CookingLog;
use crate::query::LogFilter;
use crate::routes::{id_segment, Created, Message};
use crate::validation::{parse_body, parse_id, validate_log_changes, validate_new_log, NewLog};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LogParams {
    dish_id: Option<String>,
    id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/logs",
            get(list_logs)
                .post(create_log)
                .put(update_log_by_query)
                .delete(delete_log_by_query),
        )
        .route("/logs/{id}", get(get_log).put(update_log).delete(delete_log))
        .route(
            "/dishes/{id}/logs",
            get(list_dish_logs).post(create_dish_log),
        )
}

async fn fetch_logs(db: &SqlitePool, filter: LogFilter) -> Result<Vec<CookingLog>, AppError> {
    let built = filter.build();
    let logs = built.fetch_as::<CookingLog>().fetch_all(db).await?;
    Ok(logs)
}

async fn list_logs(
    State(state): State<AppState>,
    params: Result<Query<LogParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db()?;
    let Query(params) = params?;
    let dish_id = match params.dish_id.as_deref() {
        Some(raw) => Some(parse_id(raw).ok_or(AppError::InvalidId("dish"))?),
        None => None,
    };

    Ok(Json(fetch_logs(db, LogFilter { dish_id }).await?))
}

async fn list_dish_logs(
    State(state): State<AppState>,
    segment: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db()?;
    let raw_id = id_segment(segment, "dish")?;
    let dish_id = parse_id(&raw_id).ok_or(AppError::InvalidId("dish"))?;

    Ok(Json(
        fetch_logs(
            db,
            LogFilter {
                dish_id: Some(dish_id),
            },
        )
        .await?,
    ))
}

async fn get_log(
    State(state): State<AppState>,
    segment: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db()?;
    let raw_id = id_segment(segment, "log")?;
    let id = parse_id(&raw_id).ok_or(AppError::InvalidId("log"))?;

    let log: Option<CookingLog> = sqlx::query_as(
        r#"
        SELECT cl.id, cl.dish_id, cl.image_url, cl.notes, cl.cooked_at,
               d.name AS dish_name, d.image AS dish_preview
        FROM cooking_log cl LEFT JOIN dishes d ON d.id = cl.dish_id
        WHERE cl.id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    log.map(Json).ok_or(AppError::NotFound("cooking log"))
}

async fn insert_log(db: &SqlitePool, log: NewLog) -> Result<(StatusCode, Json<Created>), AppError> {
    let dish: Option<(i64,)> = sqlx::query_as("SELECT id FROM dishes WHERE id = ?")
        .bind(log.dish_id)
        .fetch_optional(db)
        .await?;
    if dish.is_none() {
        return Err(AppError::NotFound("dish"));
    }

    let result = sqlx::query(
        "INSERT INTO cooking_log (dish_id, image_url, notes, cooked_at) VALUES (?, ?, ?, ?)",
    )
    .bind(log.dish_id)
    .bind(&log.image_url)
    .bind(&log.notes)
    .bind(db::now())
    .execute(db)
    .await
    .map_err(AppError::CreateFailed)?;

    let id = result.last_insert_rowid();
    tracing::info!(log_id = id, dish_id = log.dish_id, "Logged cooking session");

    Ok((
        StatusCode::CREATED,
        Json(Created {
            id,
            message: "cooking log created",
        }),
    ))
}

async fn create_log(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db()?;
    let log = validate_new_log(&parse_body(&body), None).map_err(AppError::ValidationFailed)?;
    insert_log(db, log).await
}

async fn create_dish_log(
    State(state): State<AppState>,
    segment: Result<Path<String>, PathRejection>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db()?;
    let raw_id = id_segment(segment, "dish")?;
    let dish_id = parse_id(&raw_id).ok_or(AppError::InvalidId("dish"))?;
    let log = validate_new_log(&parse_body(&body), Some(dish_id))
        .map_err(AppError::ValidationFailed)?;
    insert_log(db, log).await
}

/// Resolve the target log id from the first place that supplies one.
fn resolve_log_id(candidates: &[Option<String>]) -> Result<i64, AppError> {
    let raw = candidates
        .iter()
        .flatten()
        .find(|raw| !raw.trim().is_empty())
        .ok_or(AppError::InvalidId("log"))?;
    parse_id(raw).ok_or(AppError::InvalidId("log"))
}

fn body_id(body: &Value) -> Option<String> {
    match body.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

async fn apply_log_update(db: &SqlitePool, id: i64, body: &Value) -> Result<Message, AppError> {
    let changes = validate_log_changes(body).map_err(AppError::ValidationFailed)?;

    let result = sqlx::query(
        r#"
        UPDATE cooking_log
        SET image_url = ?, notes = ?, cooked_at = COALESCE(?, cooked_at)
        WHERE id = ?
        "#,
    )
    .bind(&changes.image_url)
    .bind(&changes.notes)
    .bind(&changes.cooked_at)
    .bind(id)
    .execute(db)
    .await
    .map_err(AppError::UpdateFailed)?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("cooking log"));
    }
    tracing::info!(log_id = id, "Updated cooking log");

    Ok(Message {
        message: "cooking log updated",
    })
}

async fn update_log(
    State(state): State<AppState>,
    segment: Result<Path<String>, PathRejection>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db()?;
    let id = resolve_log_id(&[Some(id_segment(segment, "log")?)])?;
    Ok(Json(apply_log_update(db, id, &parse_body(&body)).await?))
}

async fn update_log_by_query(
    State(state): State<AppState>,
    params: Result<Query<LogParams>, QueryRejection>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db()?;
    let Query(params) = params?;
    let body = parse_body(&body);
    let id = resolve_log_id(&[params.id, body_id(&body)])?;
    Ok(Json(apply_log_update(db, id, &body).await?))
}

async fn remove_log(db: &SqlitePool, id: i64) -> Result<Message, AppError> {
    let result = sqlx::query("DELETE FROM cooking_log WHERE id = ?")
        .bind(id)
        .execute(db)
        .await
        .map_err(AppError::DeleteFailed)?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("cooking log"));
    }
    tracing::info!(log_id = id, "Deleted cooking log");

    Ok(Message {
        message: "cooking log deleted",
    })
}

async fn delete_log(
    State(state): State<AppState>,
    segment: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db()?;
    let id = resolve_log_id(&[Some(id_segment(segment, "log")?)])?;
    Ok(Json(remove_log(db, id).await?))
}

async fn delete_log_by_query(
    State(state): State<AppState>,
    params: Result<Query<LogParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db()?;
    let Query(params) = params?;
    let id = resolve_log_id(&[params.id])?;
    Ok(Json(remove_log(db, id).await?))
}
