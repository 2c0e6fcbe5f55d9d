//! # AgriMarket order engine
//!
//! The core order lifecycle and inventory consistency engine for the AgriMarket produce marketplace. It brokers
//! orders of perishable goods between sellers and buyers, and its single overriding job is to keep stock honest:
//! an order only exists if its quantity was atomically carved out of the product's available stock, and stock only
//! comes back when an order is cancelled, exactly once.
//!
//! The major components are
//!
//! * the storage traits ([`MarketplaceDatabase`](crate::traits::MarketplaceDatabase) and
//!   [`CatalogManagement`](crate::traits::CatalogManagement)) and their SQLite implementation,
//!   [`SqliteDatabase`],
//! * the [`OrderFlowApi`], which layers authorization and the order state machine over the storage traits,
//! * the [`CatalogApi`], the minimal product surface sellers and buyers need,
//! * the [`events`] module, a fire-and-forget dispatcher that tells the counterparty of an order what just
//!   happened to it.
//!
//! ## The order state machine
//!
//! Orders move strictly one step at a time along
//! `pending → confirmed → processing → shipped → delivered`, driven by the seller. Either party can cancel from
//! any state except `delivered`. `delivered` and `cancelled` are terminal.

pub mod db;
mod db_types;
pub mod events;

mod api;

#[cfg(feature = "test_utils")]
pub mod test_utils;

pub mod traits {
    pub use crate::db::common::{CatalogManagement, MarketDbError, MarketplaceDatabase};
}

pub use api::{
    catalog_api::CatalogApi,
    errors::OrderFlowError,
    order_flow_api::OrderFlowApi,
    order_objects::{NewOrderRequest, OrderQueryFilter, OrderResult},
};
pub use db_types::{
    NewOrder,
    NewProduct,
    Order,
    OrderId,
    OrderStatus,
    PaymentMethod,
    Principal,
    Product,
    ProductId,
    Role,
    UnitOfMeasure,
    UserId,
};

#[cfg(feature = "sqlite")]
pub use db::sqlite::{db_url, new_pool, SqliteDatabase, MIGRATOR};
