//! Builders for the filtered list queries.
//!
//! User-supplied values only ever travel as bound parameters; the SQL text is
//! assembled from fixed fragments.

use serde::Deserialize;
use sqlx::query::QueryAs;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{FromRow, Sqlite};

pub const DISH_COLUMNS: &str = "id, name, category, difficulty, cooking_time, servings, \
     ingredients, instructions, image, tags, tutorial_url, created_at, updated_at";

/// Category value meaning "no category filter".
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Text(String),
    Int(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<Param>,
}

impl BuiltQuery {
    /// Prepare the query with every parameter bound in order.
    pub fn fetch_as<'q, O>(&'q self) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>>
    where
        O: for<'r> FromRow<'r, SqliteRow>,
    {
        let mut query = sqlx::query_as::<_, O>(&self.sql);
        for param in &self.params {
            query = match param {
                Param::Text(text) => query.bind(text.as_str()),
                Param::Int(value) => query.bind(*value),
            };
        }
        query
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DishFilter {
    pub category: Option<String>,
    pub search: Option<String>,
    pub tag: Option<String>,
}

impl DishFilter {
    pub fn build(&self) -> BuiltQuery {
        let mut sql = format!("SELECT {DISH_COLUMNS} FROM dishes WHERE 1=1");
        let mut params = Vec::new();

        if let Some(category) = non_blank(&self.category).filter(|c| *c != ALL_CATEGORIES) {
            sql.push_str(" AND category = ?");
            params.push(Param::Text(category.to_string()));
        }

        if let Some(search) = non_blank(&self.search) {
            sql.push_str(&format!(
                " AND (name LIKE ? ESCAPE '\\' OR {} OR {})",
                list_element_like("ingredients"),
                list_element_like("instructions"),
            ));
            let pattern = contains_pattern(search);
            params.extend(std::iter::repeat_n(Param::Text(pattern), 3));
        }

        if let Some(tag) = non_blank(&self.tag) {
            sql.push_str(" AND ");
            sql.push_str(&list_element_like("tags"));
            params.push(Param::Text(contains_pattern(tag)));
        }

        sql.push_str(" ORDER BY updated_at DESC, id DESC");

        BuiltQuery { sql, params }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogFilter {
    pub dish_id: Option<i64>,
}

impl LogFilter {
    pub fn build(&self) -> BuiltQuery {
        let mut sql = String::from(
            "SELECT cl.id, cl.dish_id, cl.image_url, cl.notes, cl.cooked_at, \
             d.name AS dish_name, d.image AS dish_preview \
             FROM cooking_log cl LEFT JOIN dishes d ON d.id = cl.dish_id",
        );
        let mut params = Vec::new();

        if let Some(dish_id) = self.dish_id {
            sql.push_str(" WHERE cl.dish_id = ?");
            params.push(Param::Int(dish_id));
        }

        sql.push_str(" ORDER BY cl.cooked_at DESC, cl.id DESC");

        BuiltQuery { sql, params }
    }
}

/// Match one bound pattern against the elements of a JSON-array column rather
/// than its encoded text, so quotes and commas in the term never hit the
/// delimiters. Cells that are not a valid array match nothing.
fn list_element_like(column: &str) -> String {
    format!(
        "(CASE WHEN NOT json_valid({column}) THEN 0 \
         WHEN json_type({column}) = 'array' THEN EXISTS \
         (SELECT 1 FROM json_each({column}) WHERE json_each.value LIKE ? ESCAPE '\\') \
         ELSE 0 END)"
    )
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `%term%` with LIKE wildcards in the term escaped so they match literally.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
