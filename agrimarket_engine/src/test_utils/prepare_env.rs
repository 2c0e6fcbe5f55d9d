use log::*;
use rand::Rng;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::db::sqlite::MIGRATOR;

/// Loads `.env`, initialises logging, and returns the URL of a fresh database file under `data/`. Each call gets
/// its own file so tests can run in parallel without sharing state.
pub fn prepare_env() -> String {
    dotenvy::from_filename(".env").ok();
    let _ = env_logger::try_init();
    random_db_path()
}

pub fn random_db_path() -> String {
    let mut rng = rand::thread_rng();
    let id: u64 = rng.gen();
    format!("sqlite://data/test_{id:016x}.db")
}

/// Creates the database file and brings the schema up to date.
pub async fn create_database(url: &str) {
    std::fs::create_dir_all("data").expect("Error creating data directory");
    if Sqlite::database_exists(url).await.unwrap_or(false) {
        debug!("🌍️ Database already exists at {url}");
    } else {
        Sqlite::create_database(url).await.expect("Error creating database");
        info!("🌍️ Created database at {url}");
    }
    let pool = crate::db::sqlite::new_pool(url, 1).await.expect("Error connecting to database");
    MIGRATOR.run(&pool).await.expect("Error running migrations");
    info!("🌍️ Migrations complete for {url}");
}
