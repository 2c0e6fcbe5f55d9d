use actix_web::{http::StatusCode, test::TestRequest};
use agrimarket_engine::{Product, Role};
use serde_json::json;

use super::helpers::{send, test_db, token_for};

#[actix_web::test]
async fn listing_a_product_requires_a_seller_token() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let body = json!({ "name": "Tomatoes", "unit": "kg", "price": 12000, "available_quantity": 100 });

    let req = TestRequest::post().uri("/api/products").set_json(&body);
    let (status, _) = send(&db, "", req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let buyer = token_for("juma", Role::Buyer);
    let req = TestRequest::post().uri("/api/products").set_json(&body);
    let (status, res) = send(&db, &buyer, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(res.contains("Only sellers can list products"));

    let seller = token_for("wanjiku", Role::Seller);
    let req = TestRequest::post().uri("/api/products").set_json(&body);
    let (status, res) = send(&db, &seller, req).await;
    assert_eq!(status, StatusCode::CREATED);
    let product: Product = serde_json::from_str(&res).unwrap();
    assert_eq!(product.name, "Tomatoes");
    assert_eq!(product.available_quantity, 100);
    assert!(product.in_stock);
}

#[actix_web::test]
async fn browsing_products_is_public_and_skips_sold_out_listings() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let seller = token_for("wanjiku", Role::Seller);
    let in_stock = json!({ "name": "Mangoes", "unit": "piece", "price": 1500, "available_quantity": 40 });
    let sold_out = json!({ "name": "Kale", "unit": "bag", "price": 900, "available_quantity": 0 });
    let (status, _) = send(&db, &seller, TestRequest::post().uri("/api/products").set_json(&in_stock)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&db, &seller, TestRequest::post().uri("/api/products").set_json(&sold_out)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, res) = send(&db, "", TestRequest::get().uri("/api/products")).await;
    assert_eq!(status, StatusCode::OK);
    let products: Vec<Product> = serde_json::from_str(&res).unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Mangoes");
}

#[actix_web::test]
async fn nonsense_listings_are_rejected() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let seller = token_for("wanjiku", Role::Seller);
    let free = json!({ "name": "Charity maize", "unit": "kg", "price": 0, "available_quantity": 10 });
    let (status, res) = send(&db, &seller, TestRequest::post().uri("/api/products").set_json(&free)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(res.contains("Product price must be a positive amount"));

    let negative = json!({ "name": "Maize", "unit": "kg", "price": 4000, "available_quantity": -5 });
    let (status, res) = send(&db, &seller, TestRequest::post().uri("/api/products").set_json(&negative)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(res.contains("Product quantity cannot be negative"));
}
