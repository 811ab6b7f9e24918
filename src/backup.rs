//! Plain SQL dump of the catalog, restorable with the `sqlite3` shell.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::db;
use crate::models::DishRow;
use crate::query::DISH_COLUMNS;

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Text(String),
}

impl From<Option<String>> for SqlValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(SqlValue::Null, SqlValue::Text)
    }
}

impl SqlValue {
    fn render(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Int(v) => v.to_string(),
            SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TableDump {
    pub name: &'static str,
    pub create_sql: String,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<SqlValue>>,
}

type LogTuple = (i64, i64, Option<String>, Option<String>, String);

/// Read both tables. `cooking_log` is skipped when it has not been created.
pub async fn collect(db: &SqlitePool) -> Result<Vec<TableDump>, sqlx::Error> {
    let mut tables = Vec::new();

    let dishes: Vec<DishRow> =
        sqlx::query_as(&format!("SELECT {DISH_COLUMNS} FROM dishes ORDER BY id"))
            .fetch_all(db)
            .await?;
    tables.push(TableDump {
        name: "dishes",
        create_sql: create_statement(db, "dishes").await?,
        columns: DISH_COLUMNS.split(", ").collect(),
        rows: dishes.into_iter().map(dish_values).collect(),
    });

    if db::table_exists(db, "cooking_log").await? {
        let logs: Vec<LogTuple> = sqlx::query_as(
            "SELECT id, dish_id, image_url, notes, cooked_at FROM cooking_log ORDER BY id",
        )
        .fetch_all(db)
        .await?;
        tables.push(TableDump {
            name: "cooking_log",
            create_sql: create_statement(db, "cooking_log").await?,
            columns: vec!["id", "dish_id", "image_url", "notes", "cooked_at"],
            rows: logs
                .into_iter()
                .map(|(id, dish_id, image_url, notes, cooked_at)| {
                    vec![
                        SqlValue::Int(id),
                        SqlValue::Int(dish_id),
                        image_url.into(),
                        notes.into(),
                        SqlValue::Text(cooked_at),
                    ]
                })
                .collect(),
        });
    }

    Ok(tables)
}

async fn create_statement(db: &SqlitePool, table: &str) -> Result<String, sqlx::Error> {
    let (sql,): (String,) =
        sqlx::query_as("SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_one(db)
            .await?;
    Ok(sql)
}

fn dish_values(row: DishRow) -> Vec<SqlValue> {
    vec![
        SqlValue::Int(row.id),
        SqlValue::Text(row.name),
        row.category.into(),
        SqlValue::Int(row.difficulty),
        SqlValue::Int(row.cooking_time),
        SqlValue::Int(row.servings),
        row.ingredients.into(),
        row.instructions.into(),
        row.image.into(),
        row.tags.into(),
        row.tutorial_url.into(),
        SqlValue::Text(row.created_at),
        SqlValue::Text(row.updated_at),
    ]
}

pub fn render(tables: &[TableDump], generated_at: DateTime<Utc>) -> String {
    let mut out = format!("-- dishhub backup\n-- generated at {}\n\n", db::timestamp(generated_at));
    out.push_str("PRAGMA foreign_keys=OFF;\nBEGIN TRANSACTION;\n");

    for table in tables {
        out.push_str(&format!("\n-- table: {} ({} rows)\n", table.name, table.rows.len()));
        out.push_str(&format!("DROP TABLE IF EXISTS {};\n", table.name));
        out.push_str(table.create_sql.trim_end_matches(';'));
        out.push_str(";\n");

        let columns = table.columns.join(", ");
        for row in &table.rows {
            let values: Vec<String> = row.iter().map(SqlValue::render).collect();
            out.push_str(&format!(
                "INSERT INTO {} ({columns}) VALUES ({});\n",
                table.name,
                values.join(", ")
            ));
        }
    }

    out.push_str("\nCOMMIT;\n");
    out
}

pub fn filename(generated_at: DateTime<Utc>) -> String {
    format!("dishhub-backup-{}.sql", generated_at.format("%Y%m%d-%H%M%S"))
}
