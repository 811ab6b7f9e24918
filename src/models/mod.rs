pub mod cooking_log;
pub mod dish;

pub use cooking_log::CookingLog;
pub use dish::{Dish, DishRow, DEFAULT_CATEGORY};
