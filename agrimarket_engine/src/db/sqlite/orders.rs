use agm_common::Cents;
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    api::order_objects::OrderQueryFilter,
    db::common::MarketDbError,
    db_types::{NewOrder, Order, OrderId, OrderStatus, UserId},
};

const ORDER_COLUMNS: &str = "id, order_id, buyer_id, seller_id, product_id, quantity, unit_price, total_price, \
                             status, delivery_address, payment_method, notes, cancelled_by, cancel_reason, \
                             delivered_at, created_at, updated_at";

/// Inserts the order row with its price and seller snapshot. Not atomic on its own; the creation flow embeds this
/// in the same transaction as the stock reservation by passing `&mut *tx` as the connection.
pub async fn insert_order(
    order: &NewOrder,
    seller_id: &UserId,
    unit_price: Cents,
    conn: &mut SqliteConnection,
) -> Result<Order, MarketDbError> {
    let total_price = unit_price * order.quantity;
    let sql = format!(
        r#"
            INSERT INTO orders (
                order_id, buyer_id, seller_id, product_id, quantity, unit_price, total_price,
                delivery_address, payment_method, notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ORDER_COLUMNS};
        "#
    );
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(order.order_id.as_str())
        .bind(order.buyer_id.as_str())
        .bind(seller_id.as_str())
        .bind(order.product_id.as_str())
        .bind(order.quantity)
        .bind(unit_price.value())
        .bind(total_price.value())
        .bind(&order.delivery_address)
        .bind(order.payment_method.to_string())
        .bind(order.notes.as_deref())
        .fetch_one(conn)
        .await?;
    trace!("📦️ Order {} saved with internal id {}", row.order_id, row.id);
    Ok(row)
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, MarketDbError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1 LIMIT 1;");
    let order = sqlx::query_as::<_, Order>(&sql).bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`.
///
/// Resulting orders are ordered by `created_at`, newest first.
pub async fn fetch_orders(
    query: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, MarketDbError> {
    let mut builder = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders "));
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(buyer_id) = query.buyer_id {
        where_clause.push("buyer_id = ");
        where_clause.push_bind_unseparated(buyer_id.0);
    }
    if let Some(seller_id) = query.seller_id {
        where_clause.push("seller_id = ");
        where_clause.push_bind_unseparated(seller_id.0);
    }
    if let Some(product_id) = query.product_id {
        where_clause.push("product_id = ");
        where_clause.push_bind_unseparated(product_id.0);
    }
    if !query.statuses.is_empty() {
        let statuses = query.statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<_>>().join(",");
        where_clause.push(format!("status IN ({statuses})"));
    }
    builder.push(" ORDER BY created_at DESC, id DESC");

    trace!("📦️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("📦️ fetch_orders matched {} orders", orders.len());
    Ok(orders)
}

/// Compare-and-swap status advance: the row only changes when the current status still equals `from`. Entering
/// `delivered` stamps `delivered_at` in the same statement.
pub async fn advance_status(
    order_id: &OrderId,
    from: OrderStatus,
    to: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, MarketDbError> {
    let sql = format!(
        r#"
            UPDATE orders
            SET status = $1,
                delivered_at = CASE WHEN $2 = 'delivered' AND delivered_at IS NULL
                                    THEN CURRENT_TIMESTAMP ELSE delivered_at END,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $3 AND status = $4
            RETURNING {ORDER_COLUMNS};
        "#
    );
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(to.to_string())
        .bind(to.to_string())
        .bind(order_id.as_str())
        .bind(from.to_string())
        .fetch_optional(conn)
        .await?;
    Ok(row)
}

/// Conditionally flips the order to `cancelled`. Matches zero rows when the order is missing or already terminal,
/// which is what makes the subsequent stock release unreachable from a cancelled or delivered order.
pub async fn mark_cancelled(
    order_id: &OrderId,
    cancelled_by: &UserId,
    reason: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, MarketDbError> {
    let sql = format!(
        r#"
            UPDATE orders
            SET status = 'cancelled',
                cancelled_by = $1,
                cancel_reason = $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $3 AND status NOT IN ('delivered', 'cancelled')
            RETURNING {ORDER_COLUMNS};
        "#
    );
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(cancelled_by.as_str())
        .bind(reason)
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(row)
}
