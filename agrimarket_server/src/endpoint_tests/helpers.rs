use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    App,
};
use agm_common::Secret;
use agrimarket_engine::{
    events::EventProducers,
    test_utils::prepare_env::{create_database, prepare_env},
    CatalogApi,
    OrderFlowApi,
    Role,
    SqliteDatabase,
    UserId,
};
use chrono::Duration;

use crate::{
    auth::{TokenIssuer, AUTH_HEADER},
    config::AuthConfig,
    routes::{
        add_product,
        available_products,
        cancel_order,
        create_order,
        health,
        issue_token,
        my_orders,
        order_by_id,
        update_order_status,
    },
};

// A fixed test signing secret. DO NOT re-use it anywhere.
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Secret::new("endpoint-test-signing-secret".to_string()),
        token_lifetime: Duration::hours(1),
    }
}

pub fn token_for(id: &str, role: Role) -> String {
    TokenIssuer::new(test_auth_config()).issue(UserId::from(id), role).expect("Failed to issue test token")
}

pub async fn test_db() -> SqliteDatabase {
    let url = prepare_env();
    create_database(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Failed to open test database")
}

/// Runs a single request against a freshly-built app over `db` and returns the status and raw body.
pub async fn send(db: &SqliteDatabase, token: &str, req: TestRequest) -> (StatusCode, String) {
    let order_api = OrderFlowApi::new(db.clone(), EventProducers::default());
    let catalog_api = CatalogApi::new(db.clone());
    let issuer = TokenIssuer::new(test_auth_config());
    let api_scope = web::scope("/api")
        .service(issue_token)
        .service(add_product)
        .service(available_products)
        .service(create_order)
        .service(my_orders)
        .service(order_by_id)
        .service(update_order_status)
        .service(cancel_order);
    let app = App::new()
        .app_data(web::Data::new(order_api))
        .app_data(web::Data::new(catalog_api))
        .app_data(web::Data::new(issuer))
        .service(health)
        .service(api_scope);
    let service = test::init_service(app).await;
    let mut req = req;
    if !token.is_empty() {
        req = req.insert_header((AUTH_HEADER, token));
    }
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}
