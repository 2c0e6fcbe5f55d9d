mod db;
pub mod orders;
pub mod products;

use std::{env, str::FromStr, time::Duration};

pub use db::SqliteDatabase;
use log::info;
use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

use crate::db::common::MarketDbError;

const SQLITE_DB_URL: &str = "sqlite://data/agrimarket.db";

pub static MIGRATOR: Migrator = sqlx::migrate!("./src/db/sqlite/migrations");

pub fn db_url() -> String {
    let result = env::var("AGM_DATABASE_URL").unwrap_or_else(|_| {
        info!("AGM_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

/// WAL keeps readers off the writer's lock, and the busy timeout queues competing writers rather than failing
/// them. Reservation contention on a product therefore resolves to success or `InsufficientStock`, never a
/// raw busy error.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, MarketDbError> {
    let options = SqliteConnectOptions::from_str(url)?
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(10));
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
