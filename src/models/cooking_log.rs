use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A `cooking_log` row joined with its dish's current name and image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CookingLog {
    pub id: i64,
    pub dish_id: i64,
    pub image_url: Option<String>,
    pub notes: Option<String>,
    pub cooked_at: String,
    pub dish_name: Option<String>,
    pub dish_preview: Option<String>,
}
