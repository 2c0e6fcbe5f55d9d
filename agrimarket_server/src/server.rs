use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use agrimarket_engine::{
    events::{EventHandlers, EventProducers},
    CatalogApi,
    OrderFlowApi,
    SqliteDatabase,
    MIGRATOR,
};
use log::*;
use tokio::sync::broadcast;

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    notify::{forwarding_hooks, Notification},
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

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    MIGRATOR.run(db.pool()).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🚀️ Database is ready at {}", config.database_url);
    let (tx, _) = broadcast::channel::<Notification>(config.event_buffer_size);
    let handlers = EventHandlers::new(config.event_buffer_size, forwarding_hooks(tx));
    let producers = handlers.producers();
    handlers.start();
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::BackendError(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    info!("🚀️ Starting server on {}:{}", config.host, config.port);
    let srv = HttpServer::new(move || {
        let order_api = OrderFlowApi::new(db.clone(), producers.clone());
        let catalog_api = CatalogApi::new(db.clone());
        let issuer = TokenIssuer::new(config.auth.clone());
        let api_scope = web::scope("/api")
            .service(issue_token)
            .service(add_product)
            .service(available_products)
            .service(create_order)
            .service(my_orders)
            .service(order_by_id)
            .service(update_order_status)
            .service(cancel_order);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("agm::access_log"))
            .app_data(web::Data::new(order_api))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(issuer))
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
