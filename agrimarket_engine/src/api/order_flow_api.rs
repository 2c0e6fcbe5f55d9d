//! The primary interface for making changes to orders.
//!
//! Every mutation follows the same shape: check that the caller is allowed to touch the order at all, validate the
//! request against the state machine, hand the storage backend one atomic operation, and only then publish the
//! matching event to the counterparty. Events are advisory; once the storage call has committed, the operation has
//! succeeded no matter what the dispatchers do.
use log::*;

use crate::{
    api::{
        errors::OrderFlowError,
        order_objects::{NewOrderRequest, OrderQueryFilter},
    },
    db::common::{MarketDbError, MarketplaceDatabase},
    db_types::{NewOrder, Order, OrderId, OrderStatus, Principal, Role},
    events::{EventProducers, OrderCancelledEvent, OrderCreatedEvent, OrderStatusChangedEvent},
};

pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: MarketplaceDatabase
{
    /// Places a new order on behalf of `principal`, atomically reserving stock for it.
    ///
    /// Only buyers place orders; the seller and the prices come from the product row, never from the request. On
    /// success the seller is notified of the new order.
    pub async fn create_order(&self, principal: &Principal, req: NewOrderRequest) -> Result<Order, OrderFlowError> {
        if !principal.is_buyer() {
            return Err(OrderFlowError::Forbidden("Only buyers can place orders".to_string()));
        }
        if req.quantity <= 0 {
            return Err(OrderFlowError::InvalidRequest("Order quantity must be a positive number".to_string()));
        }
        if req.delivery_address.trim().is_empty() {
            return Err(OrderFlowError::InvalidRequest("A delivery address is required".to_string()));
        }
        let mut order = NewOrder::new(principal.id.clone(), req.product_id, req.quantity)
            .with_delivery_address(req.delivery_address);
        if let Some(method) = req.payment_method {
            order = order.with_payment_method(method);
        }
        if let Some(notes) = req.notes {
            order = order.with_notes(notes);
        }
        let order = self.db.create_order(order).await?;
        info!(
            "🛒️ Order {} created: {} x{} for buyer {}, total {}",
            order.order_id, order.product_id, order.quantity, order.buyer_id, order.total_price
        );
        self.producers.publish_order_created(OrderCreatedEvent::new(order.clone())).await;
        Ok(order)
    }

    /// Advances an order one step along its lifecycle.
    ///
    /// Only the order's seller may do this, and only to the immediate successor of the order's current status.
    /// The underlying update is a compare-and-swap, so two sellers' sessions racing each other cannot both
    /// succeed; the loser is told which transition would actually be valid. On success the buyer is notified.
    pub async fn update_order_status(
        &self,
        principal: &Principal,
        order_id: &OrderId,
        new_status: OrderStatus,
    ) -> Result<Order, OrderFlowError> {
        let order = self.fetch_order(principal, order_id).await?;
        if principal.id != order.seller_id {
            return Err(OrderFlowError::Forbidden("Only the seller can update the order status".to_string()));
        }
        let old_status = order.status;
        if !old_status.can_advance_to(new_status) {
            return Err(OrderFlowError::InvalidTransition { from: old_status, to: new_status });
        }
        let order = match self.db.update_order_status(order_id, old_status, new_status).await {
            Ok(o) => o,
            // Someone else moved the order between our read and the swap. Report the transition that actually
            // failed, not the stale one.
            Err(MarketDbError::StatusConflict { actual, .. }) => {
                return Err(OrderFlowError::InvalidTransition { from: actual, to: new_status });
            },
            Err(e) => return Err(e.into()),
        };
        info!("🛒️ Order {} moved from {old_status} to {}", order.order_id, order.status);
        self.producers.publish_order_status_changed(OrderStatusChangedEvent::new(order.clone(), old_status)).await;
        Ok(order)
    }

    /// Cancels an order and returns its reserved quantity to the product's stock.
    ///
    /// Either participant may cancel, from any state except `delivered`. Cancelling twice fails the second call
    /// without touching stock again. On success the counterparty of whoever cancelled is notified.
    pub async fn cancel_order(
        &self,
        principal: &Principal,
        order_id: &OrderId,
        reason: Option<String>,
    ) -> Result<Order, OrderFlowError> {
        let order = self.fetch_order(principal, order_id).await?;
        if order.status == OrderStatus::Cancelled {
            return Err(OrderFlowError::AlreadyCancelled);
        }
        if !order.status.can_cancel() {
            return Err(OrderFlowError::CannotCancelDelivered);
        }
        let order = self.db.cancel_order(order_id, &principal.id, reason).await?;
        info!("🛒️ Order {} cancelled by {}. Stock has been returned", order.order_id, principal.id);
        self.producers.publish_order_cancelled(OrderCancelledEvent::new(order.clone(), principal.id.clone())).await;
        Ok(order)
    }

    /// Fetches a single order, visible only to its buyer and its seller. Outsiders get the same error as a
    /// nonexistent order would produce, so order ids leak nothing.
    pub async fn fetch_order(&self, principal: &Principal, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        let order = self
            .db
            .fetch_order(order_id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        if !order.is_participant(&principal.id) {
            debug!("🛒️ User {} probed order {} they are not a party to", principal.id, order_id);
            return Err(OrderFlowError::Forbidden("You are not authorized to view this order".to_string()));
        }
        Ok(order)
    }

    /// All orders the principal is a party to, newest first. Buyers see their purchases, sellers their sales.
    pub async fn orders_for(
        &self,
        principal: &Principal,
        statuses: Vec<OrderStatus>,
    ) -> Result<Vec<Order>, OrderFlowError> {
        let mut query = OrderQueryFilter::default();
        query = match principal.role {
            Role::Buyer => query.with_buyer_id(principal.id.clone()),
            Role::Seller => query.with_seller_id(principal.id.clone()),
        };
        query.statuses = statuses;
        let orders = self.db.fetch_orders(query).await?;
        Ok(orders)
    }
}
