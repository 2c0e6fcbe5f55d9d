//! Shared scaffolding for the storage integration tests. Each test gets its own database file so the suite can run
//! fully in parallel.
use agm_common::Cents;
use agrimarket_engine::{
    db::sqlite::MIGRATOR,
    new_pool,
    NewProduct,
    Principal,
    Product,
    Role,
    SqliteDatabase,
    UnitOfMeasure,
    UserId,
};
use rand::Rng;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub async fn new_db() -> SqliteDatabase {
    let _ = env_logger::try_init();
    let mut rng = rand::thread_rng();
    let id: u64 = rng.gen();
    let url = format!("sqlite://data/test_{id:016x}.db");
    std::fs::create_dir_all("data").expect("Error creating data directory");
    if !Sqlite::database_exists(&url).await.unwrap_or(false) {
        Sqlite::create_database(&url).await.expect("Error creating test database");
    }
    let pool = new_pool(&url, 5).await.expect("Error connecting to test database");
    MIGRATOR.run(&pool).await.expect("Error running migrations");
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error opening test database")
}

pub fn buyer(id: &str) -> Principal {
    Principal { id: UserId::from(id), role: Role::Buyer }
}

pub fn seller(id: &str) -> Principal {
    Principal { id: UserId::from(id), role: Role::Seller }
}

/// Inserts a listing directly through the storage trait and returns the stored row.
pub async fn list_product(db: &SqliteDatabase, seller_id: &str, name: &str, price: Cents, quantity: i64) -> Product {
    use agrimarket_engine::traits::CatalogManagement;
    let product = NewProduct::new(seller_id, name, UnitOfMeasure::Kg, price, quantity);
    db.insert_product(product).await.expect("Error inserting product")
}
