use axum::{
    body::Bytes,
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use sqlx::SqlitePool;

use crate::db;
use crate::error::AppError;
use crate::models::{Dish, DishRow};
use crate::query::{DishFilter, DISH_COLUMNS};
use crate::routes::{id_segment, Created, Message};
use crate::validation::{parse_body, parse_id, validate_dish};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dishes", get(list_dishes).post(create_dish))
        .route("/dishes/categories", get(list_categories))
        .route(
            "/dishes/{id}",
            get(get_dish).put(update_dish).delete(delete_dish),
        )
}

async fn fetch_dish(db: &SqlitePool, id: i64) -> Result<Option<Dish>, sqlx::Error> {
    let row: Option<DishRow> =
        sqlx::query_as(&format!("SELECT {DISH_COLUMNS} FROM dishes WHERE id = ?"))
            .bind(id)
            .fetch_optional(db)
            .await?;
    Ok(row.map(Dish::from))
}

/// One read operation for both shapes of `GET /dishes`: a supplied id segment
/// fetches that dish, otherwise the filtered list is returned.
async fn read_dishes(
    state: &AppState,
    raw_id: Option<&str>,
    filter: &DishFilter,
) -> Result<Response, AppError> {
    let db = state.db()?;

    if let Some(raw_id) = raw_id {
        let id = parse_id(raw_id).ok_or(AppError::InvalidId("dish"))?;
        let dish = fetch_dish(db, id).await?.ok_or(AppError::NotFound("dish"))?;
        return Ok(Json(dish).into_response());
    }

    let built = filter.build();
    let rows: Vec<DishRow> = built.fetch_as::<DishRow>().fetch_all(db).await?;
    let dishes: Vec<Dish> = rows.into_iter().map(Dish::from).collect();
    Ok(Json(dishes).into_response())
}

async fn list_dishes(
    State(state): State<AppState>,
    filter: Result<Query<DishFilter>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(filter) = filter?;
    read_dishes(&state, None, &filter).await
}

async fn get_dish(
    State(state): State<AppState>,
    segment: Result<Path<String>, PathRejection>,
) -> Result<Response, AppError> {
    let raw_id = id_segment(segment, "dish")?;
    read_dishes(&state, Some(&raw_id), &DishFilter::default()).await
}

async fn create_dish(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db()?;
    let input = validate_dish(&parse_body(&body)).map_err(AppError::ValidationFailed)?;

    let id = Dish::insert(db, &input, &db::now())
        .await
        .map_err(AppError::CreateFailed)?;
    tracing::info!(dish_id = id, name = %input.name, "Created dish");

    Ok((
        StatusCode::CREATED,
        Json(Created {
            id,
            message: "dish created",
        }),
    ))
}

async fn update_dish(
    State(state): State<AppState>,
    segment: Result<Path<String>, PathRejection>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db()?;
    let raw_id = id_segment(segment, "dish")?;
    let id = parse_id(&raw_id).ok_or(AppError::InvalidId("dish"))?;
    let input = validate_dish(&parse_body(&body)).map_err(AppError::ValidationFailed)?;

    let changed = Dish::replace(db, id, &input, &db::now())
        .await
        .map_err(AppError::UpdateFailed)?;
    if changed == 0 {
        return Err(AppError::NotFound("dish"));
    }
    tracing::info!(dish_id = id, "Updated dish");

    Ok(Json(Message {
        message: "dish updated",
    }))
}

async fn delete_dish(
    State(state): State<AppState>,
    segment: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let db = state.db()?;
    let raw_id = id_segment(segment, "dish")?;
    let id = parse_id(&raw_id).ok_or(AppError::InvalidId("dish"))?;

    // cooking_log rows go with it via ON DELETE CASCADE
    let result = sqlx::query("DELETE FROM dishes WHERE id = ?")
        .bind(id)
        .execute(db)
        .await
        .map_err(AppError::DeleteFailed)?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("dish"));
    }
    tracing::info!(dish_id = id, "Deleted dish");

    Ok(Json(Message {
        message: "dish deleted",
    }))
}

async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let db = state.db()?;

    let categories: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT DISTINCT category FROM dishes
        WHERE category IS NOT NULL AND TRIM(category) != ''
        ORDER BY category ASC
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(Json(
        categories
            .into_iter()
            .map(|(category,)| category)
            .collect::<Vec<_>>(),
    ))
}
