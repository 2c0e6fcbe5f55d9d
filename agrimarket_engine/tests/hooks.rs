//! Verifies that lifecycle events are delivered to the registered hooks, addressed to the counterparty of
//! whoever triggered them.
mod support;

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
};

use agm_common::Cents;
use agrimarket_engine::{
    events::{EventHandlers, EventHooks, OrderCancelledEvent, OrderCreatedEvent, OrderStatusChangedEvent},
    NewOrderRequest,
    OrderFlowApi,
    OrderStatus,
};
use support::{buyer, list_product, new_db, seller};

type Log = Arc<Mutex<Vec<String>>>;

#[tokio::test]
async fn lifecycle_events_reach_the_counterparty() {
    let db = new_db().await;
    let log: Log = Arc::new(Mutex::new(Vec::new()));

    let mut hooks = EventHooks::default();
    let created_log = Arc::clone(&log);
    hooks.on_order_created(Arc::new(move |ev: OrderCreatedEvent| {
        let log = Arc::clone(&created_log);
        Box::pin(async move {
            log.lock().unwrap().push(format!("created:{}:{}", ev.order.order_id, ev.recipient));
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    }));
    let status_log = Arc::clone(&log);
    hooks.on_order_status_changed(Arc::new(move |ev: OrderStatusChangedEvent| {
        let log = Arc::clone(&status_log);
        Box::pin(async move {
            log.lock().unwrap().push(format!("status:{}->{}:{}", ev.old_status, ev.new_status, ev.recipient));
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    }));
    let cancel_log = Arc::clone(&log);
    hooks.on_order_cancelled(Arc::new(move |ev: OrderCancelledEvent| {
        let log = Arc::clone(&cancel_log);
        Box::pin(async move {
            log.lock().unwrap().push(format!("cancelled:{}:{}", ev.cancelled_by, ev.recipient));
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    }));

    let handlers = EventHandlers::new(10, hooks);
    let api = OrderFlowApi::new(db.clone(), handlers.producers());

    let alice = seller("alice");
    let bob = buyer("bob");
    let product = list_product(&db, "alice", "Strawberries", Cents::from_whole(250), 30).await;
    let req = NewOrderRequest {
        product_id: product.product_id.clone(),
        quantity: 3,
        delivery_address: "7 Moi Avenue, Eldoret".to_string(),
        payment_method: None,
        notes: None,
    };
    let order = api.create_order(&bob, req).await.unwrap();
    api.update_order_status(&alice, &order.order_id, OrderStatus::Confirmed).await.unwrap();
    api.cancel_order(&bob, &order.order_id, None).await.unwrap();

    // Dropping the api drops the producers, which lets the handlers drain and shut down.
    drop(api);
    handlers.on_order_created.unwrap().start_handler().await;
    handlers.on_order_status_changed.unwrap().start_handler().await;
    handlers.on_order_cancelled.unwrap().start_handler().await;

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 3);
    assert!(log.contains(&format!("created:{}:alice", order.order_id)));
    assert!(log.iter().any(|l| l == "status:pending->confirmed:bob"));
    assert!(log.iter().any(|l| l == "cancelled:bob:alice"));
}
