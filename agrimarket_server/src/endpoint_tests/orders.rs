use actix_web::{http::StatusCode, test::TestRequest};
use agrimarket_engine::{Order, OrderResult, OrderStatus, Product, Role, SqliteDatabase};
use serde_json::json;

use super::helpers::{send, test_db, token_for};

async fn seed_product(db: &SqliteDatabase, quantity: i64) -> Product {
    let seller = token_for("wanjiku", Role::Seller);
    let body = json!({ "name": "Tomatoes", "unit": "kg", "price": 12000, "available_quantity": quantity });
    let (status, res) = send(db, &seller, TestRequest::post().uri("/api/products").set_json(&body)).await;
    assert_eq!(status, StatusCode::CREATED);
    serde_json::from_str(&res).unwrap()
}

fn order_body(product: &Product, quantity: i64) -> serde_json::Value {
    json!({
        "product_id": product.product_id,
        "quantity": quantity,
        "delivery_address": "14 Acacia Avenue, Nakuru",
        "payment_method": "mpesa"
    })
}

#[actix_web::test]
async fn placing_an_order_returns_201_with_the_priced_order() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let product = seed_product(&db, 100).await;
    let buyer = token_for("juma", Role::Buyer);

    let req = TestRequest::post().uri("/api/orders").set_json(order_body(&product, 10));
    let (status, res) = send(&db, &buyer, req).await;
    assert_eq!(status, StatusCode::CREATED);
    let order: Order = serde_json::from_str(&res).unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_price.value(), 120_000);
    assert_eq!(order.seller_id.as_str(), "wanjiku");

    // The reservation is visible on the public listing immediately.
    let (_, res) = send(&db, "", TestRequest::get().uri("/api/products")).await;
    let products: Vec<Product> = serde_json::from_str(&res).unwrap();
    assert_eq!(products[0].available_quantity, 90);
}

#[actix_web::test]
async fn overdrawing_stock_is_a_400_with_the_standard_message() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let product = seed_product(&db, 5).await;
    let buyer = token_for("juma", Role::Buyer);

    let req = TestRequest::post().uri("/api/orders").set_json(order_body(&product, 6));
    let (status, res) = send(&db, &buyer, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(res, json!({ "error": "Insufficient product quantity available" }).to_string());
}

#[actix_web::test]
async fn ordering_a_nonexistent_product_is_a_404() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let buyer = token_for("juma", Role::Buyer);
    let body = json!({ "product_id": "prd-missing", "quantity": 1, "delivery_address": "Somewhere" });
    let (status, _) = send(&db, &buyer, TestRequest::post().uri("/api/orders").set_json(&body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn the_seller_walks_the_order_to_delivered() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let product = seed_product(&db, 20).await;
    let buyer = token_for("juma", Role::Buyer);
    let seller = token_for("wanjiku", Role::Seller);

    let (_, res) = send(&db, &buyer, TestRequest::post().uri("/api/orders").set_json(order_body(&product, 2))).await;
    let order: Order = serde_json::from_str(&res).unwrap();
    let status_uri = format!("/api/orders/{}/status", order.order_id);

    // The buyer may not advance their own order.
    let req = TestRequest::put().uri(&status_uri).set_json(json!({ "status": "confirmed" }));
    let (status, _) = send(&db, &buyer, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Jumping a step is rejected with the offending transition spelled out.
    let req = TestRequest::put().uri(&status_uri).set_json(json!({ "status": "shipped" }));
    let (status, res) = send(&db, &seller, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(res.contains("Invalid order status: cannot move from pending to shipped"));

    for next in ["confirmed", "processing", "shipped", "delivered"] {
        let req = TestRequest::put().uri(&status_uri).set_json(json!({ "status": next }));
        let (status, _) = send(&db, &seller, req).await;
        assert_eq!(status, StatusCode::OK, "advancing to {next}");
    }
    let (_, res) = send(&db, &buyer, TestRequest::get().uri(&format!("/api/orders/{}", order.order_id))).await;
    let order: Order = serde_json::from_str(&res).unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert!(order.delivered_at.is_some());
}

#[actix_web::test]
async fn cancelling_an_order_restores_stock_and_records_the_reason() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let product = seed_product(&db, 50).await;
    let buyer = token_for("juma", Role::Buyer);

    let (_, res) = send(&db, &buyer, TestRequest::post().uri("/api/orders").set_json(order_body(&product, 15))).await;
    let order: Order = serde_json::from_str(&res).unwrap();

    let cancel_uri = format!("/api/orders/{}/cancel", order.order_id);
    let req = TestRequest::put().uri(&cancel_uri).set_json(json!({ "reason": "changed my mind" }));
    let (status, res) = send(&db, &buyer, req).await;
    assert_eq!(status, StatusCode::OK);
    let order: Order = serde_json::from_str(&res).unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(order.cancel_reason.as_deref(), Some("changed my mind"));

    let (_, res) = send(&db, "", TestRequest::get().uri("/api/products")).await;
    let products: Vec<Product> = serde_json::from_str(&res).unwrap();
    assert_eq!(products[0].available_quantity, 50);

    // Cancelling again must fail without touching stock.
    let req = TestRequest::put().uri(&cancel_uri).set_json(json!({}));
    let (status, res) = send(&db, &buyer, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(res.contains("already cancelled"));
}

#[actix_web::test]
async fn outsiders_cannot_see_or_touch_an_order() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let product = seed_product(&db, 10).await;
    let buyer = token_for("juma", Role::Buyer);
    let outsider = token_for("eve", Role::Buyer);

    let (_, res) = send(&db, &buyer, TestRequest::post().uri("/api/orders").set_json(order_body(&product, 1))).await;
    let order: Order = serde_json::from_str(&res).unwrap();
    let order_uri = format!("/api/orders/{}", order.order_id);

    let (status, _) = send(&db, &outsider, TestRequest::get().uri(&order_uri)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let req = TestRequest::put().uri(&format!("{order_uri}/cancel")).set_json(json!({}));
    let (status, _) = send(&db, &outsider, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&db, "", TestRequest::get().uri(&order_uri)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn order_listings_are_scoped_to_the_caller() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let product = seed_product(&db, 100).await;
    let juma = token_for("juma", Role::Buyer);
    let eve = token_for("eve", Role::Buyer);
    let seller = token_for("wanjiku", Role::Seller);

    send(&db, &juma, TestRequest::post().uri("/api/orders").set_json(order_body(&product, 1))).await;
    send(&db, &eve, TestRequest::post().uri("/api/orders").set_json(order_body(&product, 2))).await;

    let (status, res) = send(&db, &juma, TestRequest::get().uri("/api/orders")).await;
    assert_eq!(status, StatusCode::OK);
    let result: OrderResult = serde_json::from_str(&res).unwrap();
    assert_eq!(result.total_orders, 1);
    assert_eq!(result.orders[0].buyer_id.as_str(), "juma");

    let (_, res) = send(&db, &seller, TestRequest::get().uri("/api/orders")).await;
    let result: OrderResult = serde_json::from_str(&res).unwrap();
    assert_eq!(result.total_orders, 2);

    // Status filtering narrows a listing to matching orders only.
    let (_, res) = send(&db, &seller, TestRequest::get().uri("/api/orders?status=cancelled")).await;
    let result: OrderResult = serde_json::from_str(&res).unwrap();
    assert_eq!(result.total_orders, 0);
}
