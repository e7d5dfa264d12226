mod orders;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{migrate::Migrator, Pool, Sqlite};
use std::path::Path;

pub type DbPool = Pool<Sqlite>;

pub use orders::*;

pub async fn connect(database_url: &str) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

/// In-memory database for tests. Single connection so every query sees the
/// same memory store.
pub async fn connect_memory() -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
}

/// Run migrations from the workspace `migrations/` directory.
/// Call this after connect when the app starts (optional; can also use `sqlx migrate run` CLI).
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    // migrations/ is at workspace root: crates/db -> ../../migrations
    let migrations_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = Migrator::new(migrations_path).await?;
    migrator.run(pool).await?;
    Ok(())
}
