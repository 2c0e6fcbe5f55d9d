use actix_web::{http::StatusCode, test::TestRequest};
use agrimarket_engine::Role;
use serde_json::json;

use super::helpers::{send, test_db, token_for};
use crate::{auth::TokenIssuer, data_objects::LoginResponse, endpoint_tests::helpers::test_auth_config};

#[actix_web::test]
async fn the_token_endpoint_issues_tokens_the_extractor_accepts() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let body = json!({ "user_id": "wanjiku", "role": "Seller" });
    let (status, res) = send(&db, "", TestRequest::post().uri("/api/token").set_json(&body)).await;
    assert_eq!(status, StatusCode::OK);
    let login: LoginResponse = serde_json::from_str(&res).unwrap();
    let claims = TokenIssuer::new(test_auth_config()).validate(&login.access_token).unwrap();
    assert_eq!(claims.role, Role::Seller);
    assert_eq!(claims.id.as_str(), "wanjiku");
}

#[actix_web::test]
async fn tampered_tokens_are_rejected_with_401() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let mut token = token_for("juma", Role::Buyer);
    let len = token.len();
    token.replace_range(len - 6..len, "AAAAAA");
    let (status, res) = send(&db, &token, TestRequest::get().uri("/api/orders")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(res.contains("Authentication Error"));
}

#[actix_web::test]
async fn health_needs_no_token() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let (status, body) = send(&db, "", TestRequest::get().uri("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}
