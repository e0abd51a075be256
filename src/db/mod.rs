//! Database module: models, schema and the owner-scoped store.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: `HabitStore`, the only code that touches the tables

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{AuthUser, Habit, User};
pub use schema::SQLITE_INIT;
pub use sqlite::{HabitStore, MarkOutcome, SqlitePool};

use crate::error::RitualError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// Open the database (creating the file if missing) and prepare the schema.
pub async fn connect(url: &str) -> Result<HabitStore, RitualError> {
    let connect_opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
    let store = HabitStore::new(pool);
    store.init_schema().await?;
    Ok(store)
}
