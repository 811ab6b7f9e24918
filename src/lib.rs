pub mod auth;
pub mod backup;
pub mod cli;
pub mod columns;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod routes;
pub mod validation;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::error::AppError;

/// Handlers receive the store through this state; a missing pool is reported
/// per request as `DB_BINDING_MISSING` rather than failing at startup.
#[derive(Clone)]
pub struct AppState {
    pub db: Option<SqlitePool>,
    pub backup_key: Option<String>,
}

impl AppState {
    pub fn db(&self) -> Result<&SqlitePool, AppError> {
        self.db.as_ref().ok_or(AppError::DbUnavailable)
    }
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "runtime": "axum",
        "timestamp": db::now(),
    }))
}

async fn unknown_route() -> AppError {
    AppError::NotFound("route")
}

async fn unsupported_method() -> AppError {
    AppError::MethodNotAllowed
}

/// Build the full Axum application router, with every route under `/api`.
///
/// Caller is responsible for running database migrations on the pool beforehand.
pub fn build_app(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .merge(routes::dishes::router())
        .merge(routes::logs::router())
        .merge(routes::admin::router())
        .method_not_allowed_fallback(unsupported_method);

    Router::new()
        .nest("/api", api)
        .fallback(unknown_route)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
