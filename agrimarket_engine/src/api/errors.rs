use thiserror::Error;

use crate::{
    db::common::MarketDbError,
    db_types::{OrderId, OrderStatus, ProductId},
};

/// Every failure mode of the order flow, carrying the stable, client-renderable message for each. Races inside the
/// stock ledger never surface separately; the loser of a reservation race sees `InsufficientStock` like any other
/// caller who asked for more than was available.
#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Insufficient product quantity available")]
    InsufficientStock,
    #[error("Invalid order status: cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Cannot cancel delivered orders")]
    CannotCancelDelivered,
    #[error("Order is already cancelled")]
    AlreadyCancelled,
    #[error("{0}")]
    Forbidden(String),
    #[error("The requested product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Internal storage error: {0}")]
    DatabaseError(String),
}

impl From<MarketDbError> for OrderFlowError {
    fn from(e: MarketDbError) -> Self {
        match e {
            MarketDbError::ProductNotFound(id) => Self::ProductNotFound(id),
            MarketDbError::OrderNotFound(id) => Self::OrderNotFound(id),
            MarketDbError::InsufficientStock => Self::InsufficientStock,
            MarketDbError::TerminalOrder(OrderStatus::Delivered) => Self::CannotCancelDelivered,
            MarketDbError::TerminalOrder(_) => Self::AlreadyCancelled,
            e => Self::DatabaseError(e.to_string()),
        }
    }
}
