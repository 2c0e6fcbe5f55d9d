//! Turns engine events into user-addressed notifications.
//!
//! Each lifecycle event becomes a [`Notification`] on a broadcast channel, addressed to the counterparty of the
//! user who triggered it. Push transports (websocket sessions, mobile gateways) subscribe to the channel and fan
//! the notifications out; if nobody is listening the notifications are simply dropped. Nothing here can fail a
//! request: a lagging or closed channel is logged and forgotten.
use std::{future::Future, pin::Pin, sync::Arc};

use agrimarket_engine::{
    events::{EventHooks, OrderCancelledEvent, OrderCreatedEvent, OrderStatusChangedEvent},
    Order,
    UserId,
};
use log::*;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::Sender;

/// A notification envelope, ready for whatever push transport delivers it. The `event` discriminants are part of
/// the client protocol and must not change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum Notification {
    NewOrder { recipient: UserId, order: Order },
    OrderStatusUpdated { recipient: UserId, order: Order, previous_status: String },
    OrderCancelled { recipient: UserId, order: Order, cancelled_by: UserId },
}

impl Notification {
    pub fn recipient(&self) -> &UserId {
        match self {
            Notification::NewOrder { recipient, .. } => recipient,
            Notification::OrderStatusUpdated { recipient, .. } => recipient,
            Notification::OrderCancelled { recipient, .. } => recipient,
        }
    }
}

/// Builds the hook set that forwards every lifecycle event onto `tx`.
pub fn forwarding_hooks(tx: Sender<Notification>) -> EventHooks {
    let mut hooks = EventHooks::default();
    let on_created = tx.clone();
    hooks.on_order_created(Arc::new(move |ev: OrderCreatedEvent| {
        let tx = on_created.clone();
        Box::pin(async move {
            info!("📜️ Notifying {} of new order {}", ev.recipient, ev.order.order_id);
            let note = Notification::NewOrder { recipient: ev.recipient, order: ev.order };
            dispatch(&tx, note);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    }));
    let on_status = tx.clone();
    hooks.on_order_status_changed(Arc::new(move |ev: OrderStatusChangedEvent| {
        let tx = on_status.clone();
        Box::pin(async move {
            info!(
                "📜️ Notifying {} that order {} moved from {} to {}",
                ev.recipient, ev.order.order_id, ev.old_status, ev.new_status
            );
            let note = Notification::OrderStatusUpdated {
                recipient: ev.recipient,
                order: ev.order,
                previous_status: ev.old_status.to_string(),
            };
            dispatch(&tx, note);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    }));
    let on_cancelled = tx;
    hooks.on_order_cancelled(Arc::new(move |ev: OrderCancelledEvent| {
        let tx = on_cancelled.clone();
        Box::pin(async move {
            info!("📜️ Notifying {} that order {} was cancelled", ev.recipient, ev.order.order_id);
            let note = Notification::OrderCancelled {
                recipient: ev.recipient,
                order: ev.order,
                cancelled_by: ev.cancelled_by,
            };
            dispatch(&tx, note);
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    }));
    hooks
}

fn dispatch(tx: &Sender<Notification>, note: Notification) {
    match tx.send(note) {
        Ok(n) => trace!("📜️ Notification forwarded to {n} subscribers"),
        Err(_) => debug!("📜️ No subscribers are listening for notifications. Dropping the notification."),
    }
}
