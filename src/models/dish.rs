use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteExecutor};

use crate::columns::{decode_list, encode_list};
use crate::validation::DishInput;

/// Category assigned when a payload leaves it blank ("home cooking").
pub const DEFAULT_CATEGORY: &str = "家常菜";

/// A `dishes` row as stored, with list columns still JSON-encoded.
#[derive(Debug, Clone, FromRow)]
pub struct DishRow {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub difficulty: i64,
    pub cooking_time: i64,
    pub servings: i64,
    pub ingredients: Option<String>,
    pub instructions: Option<String>,
    pub image: Option<String>,
    pub tags: Option<String>,
    pub tutorial_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub difficulty: i64,
    pub cooking_time: i64,
    pub servings: i64,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub image: String,
    pub tags: Vec<String>,
    pub tutorial_url: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<DishRow> for Dish {
    fn from(row: DishRow) -> Self {
        Self {
            ingredients: decode_list(row.ingredients.as_deref()),
            instructions: decode_list(row.instructions.as_deref()),
            tags: decode_list(row.tags.as_deref()),
            id: row.id,
            name: row.name,
            category: row
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            difficulty: row.difficulty,
            cooking_time: row.cooking_time,
            servings: row.servings,
            image: row.image.unwrap_or_default(),
            tutorial_url: row.tutorial_url.unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl Dish {
    /// Insert a validated dish and return its new id.
    pub async fn insert<'e, E>(executor: E, input: &DishInput, now: &str) -> Result<i64, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO dishes (name, category, difficulty, cooking_time, servings, ingredients,
                                instructions, image, tags, tutorial_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(&input.category)
        .bind(input.difficulty)
        .bind(input.cooking_time)
        .bind(input.servings)
        .bind(encode_list(&input.ingredients))
        .bind(encode_list(&input.instructions))
        .bind(&input.image)
        .bind(encode_list(&input.tags))
        .bind(&input.tutorial_url)
        .bind(now)
        .bind(now)
        .execute(executor)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Replace every mutable field of dish `id`. Returns the number of rows changed.
    pub async fn replace<'e, E>(
        executor: E,
        id: i64,
        input: &DishInput,
        now: &str,
    ) -> Result<u64, sqlx::Error>
    where
        E: SqliteExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE dishes
            SET name = ?, category = ?, difficulty = ?, cooking_time = ?, servings = ?,
                ingredients = ?, instructions = ?, image = ?, tags = ?, tutorial_url = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.name)
        .bind(&input.category)
        .bind(input.difficulty)
        .bind(input.cooking_time)
        .bind(input.servings)
        .bind(encode_list(&input.ingredients))
        .bind(encode_list(&input.instructions))
        .bind(&input.image)
        .bind(encode_list(&input.tags))
        .bind(&input.tutorial_url)
        .bind(now)
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}
