//! Interface contracts for marketplace storage backends.
//!
//! Two traits split the surface the way the engine consumes it:
//!
//! * [`MarketplaceDatabase`] carries the order flow: the atomic reserve-and-insert that creates an order, the
//!   guarded status updates, and the cancel-and-release. Everything that touches a product's
//!   `available_quantity` goes through here and nowhere else.
//! * [`CatalogManagement`] is the minimal product surface the order flow needs to be exercised: inserting listings
//!   and reading the available ones. Full catalog CRUD belongs to the external catalog service.
use thiserror::Error;

use crate::{
    api::order_objects::OrderQueryFilter,
    db_types::{NewOrder, NewProduct, Order, OrderId, OrderStatus, Product, ProductId, UserId},
};

#[derive(Debug, Clone, Error)]
pub enum MarketDbError {
    #[error("Internal database engine error: {0}")]
    DatabaseError(String),
    #[error("The requested product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Insufficient product quantity available")]
    InsufficientStock,
    #[error("A product with id {0} already exists")]
    ProductAlreadyExists(ProductId),
    #[error("Order status is {actual}, not {expected}")]
    StatusConflict { expected: OrderStatus, actual: OrderStatus },
    #[error("The order has already reached terminal status {0}")]
    TerminalOrder(OrderStatus),
}

impl From<sqlx::Error> for MarketDbError {
    fn from(e: sqlx::Error) -> Self {
        MarketDbError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Fetches a product by its public id, or `None` if it does not exist.
    async fn fetch_product(&self, product_id: &ProductId) -> Result<Option<Product>, MarketDbError>;

    /// Atomically reserves `quantity` units of stock against the product and inserts the order row, as a single
    /// transaction. The order's `unit_price`, `total_price` and `seller_id` are snapshotted from the product row
    /// inside the same transaction.
    ///
    /// Two concurrent calls against the same product are linearised by the store: the loser of a race that would
    /// overdraw stock gets [`MarketDbError::InsufficientStock`] and no order row. If the insert fails after the
    /// reservation, the whole transaction rolls back, so stock is never lost to a phantom order.
    async fn create_order(&self, order: NewOrder) -> Result<Order, MarketDbError>;

    /// Fetches an order by its public id, or `None` if it does not exist.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, MarketDbError>;

    /// Fetches orders matching the filter, newest first.
    async fn fetch_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, MarketDbError>;

    /// Moves an order from `from` to `to` with a compare-and-swap on the current status. A concurrent update that
    /// got in first surfaces as [`MarketDbError::StatusConflict`] carrying the status actually found. Entering
    /// `Delivered` stamps `delivered_at`; since `Delivered` is terminal the stamp can never be overwritten.
    ///
    /// No stock moves here: the reservation was committed at creation time.
    async fn update_order_status(
        &self,
        order_id: &OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, MarketDbError>;

    /// Cancels an order and releases its reserved stock, as a single transaction. The status flip is conditional on
    /// the order not already being terminal, and the release only runs when the flip succeeds, so a double cancel
    /// can never credit stock twice. Releases credit back the order's original quantity regardless of interim
    /// catalog edits.
    async fn cancel_order(
        &self,
        order_id: &OrderId,
        cancelled_by: &UserId,
        reason: Option<String>,
    ) -> Result<Order, MarketDbError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), MarketDbError> {
        Ok(())
    }
}

#[allow(async_fn_in_trait)]
pub trait CatalogManagement: Clone {
    /// Inserts a new product listing. The listing's `in_stock` flag is derived from its quantity.
    async fn insert_product(&self, product: NewProduct) -> Result<Product, MarketDbError>;

    /// All products currently available for purchase, newest first.
    async fn fetch_available_products(&self) -> Result<Vec<Product>, MarketDbError>;
}
