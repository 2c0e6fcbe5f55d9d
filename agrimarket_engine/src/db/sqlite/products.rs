use log::{trace, warn};
use sqlx::SqliteConnection;

use crate::{
    db::common::MarketDbError,
    db_types::{NewProduct, Product, ProductId},
};

const PRODUCT_COLUMNS: &str = "id, product_id, seller_id, name, unit, price, available_quantity, in_stock, \
                               created_at, updated_at";

pub async fn insert_product(
    product: NewProduct,
    conn: &mut SqliteConnection,
) -> Result<Product, MarketDbError> {
    let sql = format!(
        r#"
            INSERT INTO products (product_id, seller_id, name, unit, price, available_quantity, in_stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PRODUCT_COLUMNS};
        "#
    );
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(product.product_id.as_str())
        .bind(product.seller_id.as_str())
        .bind(&product.name)
        .bind(product.unit.to_string())
        .bind(product.price.value())
        .bind(product.available_quantity)
        .bind(product.available_quantity > 0)
        .fetch_one(conn)
        .await;
    match row {
        Ok(p) => Ok(p),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(MarketDbError::ProductAlreadyExists(product.product_id))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_product(
    product_id: &ProductId,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, MarketDbError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE product_id = $1 LIMIT 1;");
    let product = sqlx::query_as::<_, Product>(&sql).bind(product_id.as_str()).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn fetch_available_products(conn: &mut SqliteConnection) -> Result<Vec<Product>, MarketDbError> {
    let sql = format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE in_stock = 1 AND available_quantity > 0 ORDER BY created_at \
         DESC, id DESC;"
    );
    let products = sqlx::query_as::<_, Product>(&sql).fetch_all(conn).await?;
    Ok(products)
}

/// The single atomic check-and-decrement behind every stock reservation.
///
/// The quantity guard lives in the WHERE clause, so the store evaluates "decrement by N only if at least N remain"
/// in one indivisible step. Concurrent reservations on the same product are linearised here; the loser matches zero
/// rows and is told the stock ran out against the post-winner quantity.
pub async fn reserve(
    product_id: &ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), MarketDbError> {
    let result = sqlx::query(
        r#"
            UPDATE products
            SET available_quantity = available_quantity - $1,
                in_stock = CASE WHEN available_quantity - $2 > 0 THEN 1 ELSE 0 END,
                updated_at = CURRENT_TIMESTAMP
            WHERE product_id = $3 AND available_quantity >= $4;
        "#,
    )
    .bind(quantity)
    .bind(quantity)
    .bind(product_id.as_str())
    .bind(quantity)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 1 {
        trace!("🌽️ Reserved {quantity} units of product {product_id}");
        return Ok(());
    }
    // Zero rows: either the product is gone or the guard failed. Disambiguate for the caller.
    match fetch_product(product_id, conn).await? {
        Some(_) => Err(MarketDbError::InsufficientStock),
        None => Err(MarketDbError::ProductNotFound(product_id.clone())),
    }
}

/// Credits reserved stock back after a cancellation. A release always marks the product as in stock again, and it
/// credits the order's original quantity even if the listing was edited in the interim (the buyer's reservation is
/// honoured over the catalog's current state).
///
/// A listing that was deleted from the catalog since the order was placed has nowhere to credit stock back to;
/// that case is logged and ignored, matching the cancellation policy.
pub async fn release(
    product_id: &ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), MarketDbError> {
    let result = sqlx::query(
        r#"
            UPDATE products
            SET available_quantity = available_quantity + $1,
                in_stock = 1,
                updated_at = CURRENT_TIMESTAMP
            WHERE product_id = $2;
        "#,
    )
    .bind(quantity)
    .bind(product_id.as_str())
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        warn!("🌽️ Released {quantity} units for product {product_id}, but the listing no longer exists");
    } else {
        trace!("🌽️ Released {quantity} units of product {product_id}");
    }
    Ok(())
}
