//! Request handlers for every route the server exposes.
//!
//! Handlers stay thin: pull the caller out of the access token, hand the request to the engine, and map the
//! result onto a response. All policy (who may do what, and when) lives in the engine APIs, so nothing here
//! second-guesses an error it gets back.
use actix_web::{get, post, put, web, HttpResponse, Responder};
use agrimarket_engine::{
    CatalogApi,
    NewOrderRequest,
    NewProduct,
    OrderFlowApi,
    OrderId,
    OrderResult,
    SqliteDatabase,
};
use log::*;

use crate::{
    auth::{JwtClaims, TokenIssuer},
    data_objects::{AddProductRequest, CancelRequest, LoginRequest, LoginResponse, OrderListParams, UpdateStatusRequest},
    errors::ServerError,
};

type OrderApi = web::Data<OrderFlowApi<SqliteDatabase>>;
type ProductApi = web::Data<CatalogApi<SqliteDatabase>>;

#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

/// Route handler for the token endpoint. Stands in for the marketplace identity service in local deployments;
/// production puts the real identity service in front and this endpoint behind a firewall.
#[post("/token")]
pub async fn issue_token(
    req: web::Json<LoginRequest>,
    issuer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let req = req.into_inner();
    let access_token = issuer.issue(req.user_id.into(), req.role)?;
    Ok(HttpResponse::Ok().json(LoginResponse { access_token }))
}

/// Route handler for listing a new product
#[post("/products")]
pub async fn add_product(
    claims: JwtClaims,
    req: web::Json<AddProductRequest>,
    api: ProductApi,
) -> Result<HttpResponse, ServerError> {
    let principal = claims.principal();
    let req = req.into_inner();
    let product = NewProduct::new(principal.id.clone(), req.name, req.unit, req.price, req.available_quantity);
    let product = api.add_product(&principal, product).await?;
    Ok(HttpResponse::Created().json(product))
}

/// Route handler for browsing products that are in stock. Browsing does not require an account.
#[get("/products")]
pub async fn available_products(api: ProductApi) -> Result<HttpResponse, ServerError> {
    let products = api.available_products().await?;
    Ok(HttpResponse::Ok().json(products))
}

/// Route handler for placing a new order
#[post("/orders")]
pub async fn create_order(
    claims: JwtClaims,
    req: web::Json<NewOrderRequest>,
    api: OrderApi,
) -> Result<HttpResponse, ServerError> {
    let principal = claims.principal();
    debug!("💻️ Order creation request from {}", principal.id);
    let order = api.create_order(&principal, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(order))
}

/// Route handler for listing the caller's orders, newest first. Buyers see their purchases, sellers their sales,
/// optionally narrowed to a single status with `?status=`.
#[get("/orders")]
pub async fn my_orders(
    claims: JwtClaims,
    params: web::Query<OrderListParams>,
    api: OrderApi,
) -> Result<HttpResponse, ServerError> {
    let principal = claims.principal();
    let statuses = params.into_inner().status.into_iter().collect();
    let orders = api.orders_for(&principal, statuses).await?;
    Ok(HttpResponse::Ok().json(OrderResult { total_orders: orders.len(), orders }))
}

/// Route handler for fetching a single order
#[get("/orders/{order_id}")]
pub async fn order_by_id(
    claims: JwtClaims,
    path: web::Path<String>,
    api: OrderApi,
) -> Result<HttpResponse, ServerError> {
    let principal = claims.principal();
    let order_id = OrderId::from(path.into_inner());
    let order = api.fetch_order(&principal, &order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// Route handler for advancing an order's status
#[put("/orders/{order_id}/status")]
pub async fn update_order_status(
    claims: JwtClaims,
    path: web::Path<String>,
    req: web::Json<UpdateStatusRequest>,
    api: OrderApi,
) -> Result<HttpResponse, ServerError> {
    let principal = claims.principal();
    let order_id = OrderId::from(path.into_inner());
    let order = api.update_order_status(&principal, &order_id, req.into_inner().status).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// Route handler for cancelling an order
#[put("/orders/{order_id}/cancel")]
pub async fn cancel_order(
    claims: JwtClaims,
    path: web::Path<String>,
    req: web::Json<CancelRequest>,
    api: OrderApi,
) -> Result<HttpResponse, ServerError> {
    let principal = claims.principal();
    let order_id = OrderId::from(path.into_inner());
    let order = api.cancel_order(&principal, &order_id, req.into_inner().reason).await?;
    Ok(HttpResponse::Ok().json(order))
}
