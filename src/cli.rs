use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::fs;
use std::path::{Path, PathBuf};

use crate::db;
use crate::models::Dish;
use crate::validation::validate_dish;

#[derive(Parser, Debug)]
#[command(name = "dishhub", version, about = "Household recipe catalog API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Insert the sample dishes into an empty catalog
    Seed,
    /// Import dishes from a JSON array file
    Import { file: PathBuf },
}

fn sample_dishes() -> Vec<Value> {
    vec![
        json!({
            "name": "番茄炒蛋",
            "category": "家常菜",
            "difficulty": 1,
            "cooking_time": 15,
            "servings": 2,
            "ingredients": ["鸡蛋 3个", "番茄 2个", "葱花 适量", "盐 少许", "糖 少许", "食用油 适量"],
            "instructions": [
                "鸡蛋打散，加少许盐调味",
                "番茄切块，去皮备用",
                "热锅下油，倒入蛋液炒熟盛起",
                "锅内放少许油，下番茄块炒出汁水",
                "加入炒蛋，调味炒匀即可",
                "撒上葱花装盘"
            ],
            "tags": ["简单", "下饭", "家常"]
        }),
        json!({
            "name": "宫保鸡丁",
            "category": "川菜",
            "difficulty": 3,
            "cooking_time": 25,
            "servings": 3,
            "ingredients": [
                "鸡胸肉 300g", "花生米 100g", "干辣椒 10个", "花椒 1勺", "葱白 2段", "姜蒜 适量",
                "生抽 2勺", "老抽 1勺", "糖 1勺", "醋 1勺", "料酒 1勺", "淀粉 适量"
            ],
            "instructions": [
                "鸡胸肉切丁，用料酒、生抽、淀粉腌制15分钟",
                "花生米炸至金黄色捞起",
                "调制宫保汁：生抽、老抽、糖、醋、淀粉调成汁",
                "热锅下油，下鸡丁炒至变色盛起",
                "锅内留油，下干辣椒、花椒爆香",
                "下葱白、姜蒜爆香，倒入鸡丁炒匀",
                "倒入宫保汁炒至收汁，最后放入花生米炒匀即可"
            ],
            "tags": ["川菜", "辣", "经典"]
        }),
    ]
}

/// Insert the sample dishes, but only into an empty catalog.
/// Returns how many dishes were inserted.
pub async fn seed_sample_dishes(pool: &SqlitePool) -> Result<usize, Box<dyn std::error::Error>> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM dishes")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        tracing::info!(existing = count, "Catalog already has dishes, skipping sample data");
        return Ok(0);
    }

    import_values(pool, sample_dishes()).await
}

/// Import a JSON array of dish payloads. Entries that fail validation are
/// skipped; the rest are inserted in a single transaction.
pub async fn import_dishes(
    pool: &SqlitePool,
    file_path: impl AsRef<Path>,
) -> Result<usize, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(file_path)?;
    let payloads: Vec<Value> = serde_json::from_str(&content)?;
    import_values(pool, payloads).await
}

async fn import_values(pool: &SqlitePool, payloads: Vec<Value>) -> Result<usize, Box<dyn std::error::Error>> {
    let now = db::now();
    let mut imported = 0;
    let mut tx = pool.begin().await?;

    for (index, payload) in payloads.iter().enumerate() {
        let input = match validate_dish(payload) {
            Ok(input) => input,
            Err(errors) => {
                tracing::warn!(index, ?errors, "Skipping invalid dish");
                continue;
            }
        };

        Dish::insert(&mut *tx, &input, &now).await?;
        imported += 1;
    }

    tx.commit().await?;
    tracing::info!(imported, "Imported dishes");
    Ok(imported)
}
