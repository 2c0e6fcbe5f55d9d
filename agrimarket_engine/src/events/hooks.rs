use log::*;

use crate::events::{
    channel::{EventHandler, EventProducer, Handler},
    event_types::{OrderCancelledEvent, OrderCreatedEvent, OrderStatusChangedEvent},
};

/// The set of callbacks a host application may register against the lifecycle events. Every hook is optional; an
/// unset hook means that event class is silently dropped.
#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_created: Option<Handler<OrderCreatedEvent>>,
    pub on_order_status_changed: Option<Handler<OrderStatusChangedEvent>>,
    pub on_order_cancelled: Option<Handler<OrderCancelledEvent>>,
}

impl EventHooks {
    pub fn on_order_created(&mut self, f: Handler<OrderCreatedEvent>) -> &mut Self {
        self.on_order_created = Some(f);
        self
    }

    pub fn on_order_status_changed(&mut self, f: Handler<OrderStatusChangedEvent>) -> &mut Self {
        self.on_order_status_changed = Some(f);
        self
    }

    pub fn on_order_cancelled(&mut self, f: Handler<OrderCancelledEvent>) -> &mut Self {
        self.on_order_cancelled = Some(f);
        self
    }
}

pub struct EventHandlers {
    pub on_order_created: Option<EventHandler<OrderCreatedEvent>>,
    pub on_order_status_changed: Option<EventHandler<OrderStatusChangedEvent>>,
    pub on_order_cancelled: Option<EventHandler<OrderCancelledEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_created = hooks.on_order_created.map(|f| EventHandler::new(buffer_size, f));
        let on_order_status_changed = hooks.on_order_status_changed.map(|f| EventHandler::new(buffer_size, f));
        let on_order_cancelled = hooks.on_order_cancelled.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_created, on_order_status_changed, on_order_cancelled }
    }

    pub fn producers(&self) -> EventProducers {
        EventProducers {
            order_created_producer: self.on_order_created.iter().map(|h| h.subscribe()).collect(),
            order_status_changed_producer: self.on_order_status_changed.iter().map(|h| h.subscribe()).collect(),
            order_cancelled_producer: self.on_order_cancelled.iter().map(|h| h.subscribe()).collect(),
        }
    }

    /// Moves each configured handler onto its own task. Call exactly once, after every producer has been handed
    /// out, since subscribing is impossible afterwards.
    pub fn start(self) {
        if let Some(h) = self.on_order_created {
            tokio::spawn(async move { h.start_handler().await });
            debug!("📬️ Order created event handler started");
        }
        if let Some(h) = self.on_order_status_changed {
            tokio::spawn(async move { h.start_handler().await });
            debug!("📬️ Order status changed event handler started");
        }
        if let Some(h) = self.on_order_cancelled {
            tokio::spawn(async move { h.start_handler().await });
            debug!("📬️ Order cancelled event handler started");
        }
    }
}

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_created_producer: Vec<EventProducer<OrderCreatedEvent>>,
    pub order_status_changed_producer: Vec<EventProducer<OrderStatusChangedEvent>>,
    pub order_cancelled_producer: Vec<EventProducer<OrderCancelledEvent>>,
}

impl EventProducers {
    pub async fn publish_order_created(&self, event: OrderCreatedEvent) {
        for producer in &self.order_created_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_order_status_changed(&self, event: OrderStatusChangedEvent) {
        for producer in &self.order_status_changed_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_order_cancelled(&self, event: OrderCancelledEvent) {
        for producer in &self.order_cancelled_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}
