use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{new_pool, orders, products};
use crate::{
    api::order_objects::OrderQueryFilter,
    db::common::{CatalogManagement, MarketDbError, MarketplaceDatabase},
    db_types::{NewOrder, NewProduct, Order, OrderId, OrderStatus, Product, ProductId, UserId},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from the environment.
    pub async fn new(max_connections: u32) -> Result<Self, MarketDbError> {
        let url = super::db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, MarketDbError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, MarketDbError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_product(product_id, &mut conn).await
    }

    /// Reserve-then-insert inside one transaction. The product row is read inside the transaction too, so the
    /// price snapshot and the seller reference can never drift from the stock that was actually reserved.
    ///
    /// The reservation UPDATE is the transaction's first statement. That takes the write lock before any read,
    /// so two racing creates queue on the store's busy handler; a deferred read-then-write would deadlock on the
    /// lock upgrade instead and hand one caller an immediate busy error.
    async fn create_order(&self, order: NewOrder) -> Result<Order, MarketDbError> {
        let mut tx = self.pool.begin().await?;
        products::reserve(&order.product_id, order.quantity, &mut tx).await?;
        let product = products::fetch_product(&order.product_id, &mut tx)
            .await?
            .ok_or_else(|| MarketDbError::ProductNotFound(order.product_id.clone()))?;
        let order = orders::insert_order(&order, &product.seller_id, product.price, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Order {} created: {} x {} for buyer {} (total {})",
            order.order_id, order.quantity, order.product_id, order.buyer_id, order.total_price
        );
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, MarketDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_order_id(order_id, &mut conn).await
    }

    async fn fetch_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, MarketDbError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders(query, &mut conn).await
    }

    async fn update_order_status(
        &self,
        order_id: &OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, MarketDbError> {
        let mut conn = self.pool.acquire().await?;
        match orders::advance_status(order_id, from, to, &mut conn).await? {
            Some(order) => {
                debug!("🗃️ Order {} moved from {from} to {to}", order.order_id);
                Ok(order)
            },
            // The CAS missed. Re-read to tell the caller what actually happened.
            None => match orders::fetch_order_by_order_id(order_id, &mut conn).await? {
                Some(current) => Err(MarketDbError::StatusConflict { expected: from, actual: current.status }),
                None => Err(MarketDbError::OrderNotFound(order_id.clone())),
            },
        }
    }

    async fn cancel_order(
        &self,
        order_id: &OrderId,
        cancelled_by: &UserId,
        reason: Option<String>,
    ) -> Result<Order, MarketDbError> {
        let mut tx = self.pool.begin().await?;
        let cancelled = orders::mark_cancelled(order_id, cancelled_by, reason.as_deref(), &mut tx).await?;
        let order = match cancelled {
            Some(order) => order,
            None => {
                // The status flip did not happen; find out why before rolling back.
                let current = orders::fetch_order_by_order_id(order_id, &mut tx).await?;
                tx.rollback().await?;
                return match current {
                    Some(o) => Err(MarketDbError::TerminalOrder(o.status)),
                    None => Err(MarketDbError::OrderNotFound(order_id.clone())),
                };
            },
        };
        // Only reachable when this call won the status flip, so the credit can happen at most once per order.
        products::release(&order.product_id, order.quantity, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} cancelled by {cancelled_by}; {} units returned to stock", order.order_id, order.quantity);
        Ok(order)
    }

    async fn close(&mut self) -> Result<(), MarketDbError> {
        self.pool.close().await;
        Ok(())
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, MarketDbError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::insert_product(product, &mut conn).await?;
        debug!("🗃️ Product {} listed by {} ({} {} available)", product.product_id, product.seller_id,
            product.available_quantity, product.unit);
        Ok(product)
    }

    async fn fetch_available_products(&self) -> Result<Vec<Product>, MarketDbError> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_available_products(&mut conn).await
    }
}
