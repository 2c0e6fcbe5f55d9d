use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatus, UserId};

/// Raised after a new order has been persisted and its stock reserved. The recipient is always the seller, who
/// did not initiate the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
    pub recipient: UserId,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        let recipient = order.seller_id.clone();
        Self { order, recipient }
    }
}

/// Raised after a seller advances an order. The recipient is always the buyer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub order: Order,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    pub recipient: UserId,
}

impl OrderStatusChangedEvent {
    pub fn new(order: Order, old_status: OrderStatus) -> Self {
        let recipient = order.buyer_id.clone();
        let new_status = order.status;
        Self { order, old_status, new_status, recipient }
    }
}

/// Raised after an order has been cancelled and its stock returned. The recipient is whichever party did *not*
/// request the cancellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    pub order: Order,
    pub cancelled_by: UserId,
    pub recipient: UserId,
}

impl OrderCancelledEvent {
    pub fn new(order: Order, cancelled_by: UserId) -> Self {
        let recipient = order.counterparty_of(&cancelled_by).clone();
        Self { order, cancelled_by, recipient }
    }
}
