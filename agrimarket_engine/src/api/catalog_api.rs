use log::*;

use crate::{
    api::errors::OrderFlowError,
    db::common::CatalogManagement,
    db_types::{NewProduct, Principal, Product},
};

/// The slice of catalog management the order flow depends on: sellers listing produce, and buyers browsing what is
/// available. Richer catalog features (search, images, reviews) live in the catalog service, not here.
pub struct CatalogApi<B> {
    db: B,
}

impl<B> CatalogApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    /// Lists a new product for sale. Only sellers may list, prices must be positive, and quantities non-negative.
    pub async fn add_product(&self, principal: &Principal, product: NewProduct) -> Result<Product, OrderFlowError> {
        if !principal.is_seller() {
            return Err(OrderFlowError::Forbidden("Only sellers can list products".to_string()));
        }
        if principal.id != product.seller_id {
            return Err(OrderFlowError::Forbidden("You cannot list products on behalf of another seller".to_string()));
        }
        if product.name.trim().is_empty() {
            return Err(OrderFlowError::InvalidRequest("A product name is required".to_string()));
        }
        if !product.price.is_positive() {
            return Err(OrderFlowError::InvalidRequest("Product price must be a positive amount".to_string()));
        }
        if product.available_quantity < 0 {
            return Err(OrderFlowError::InvalidRequest("Product quantity cannot be negative".to_string()));
        }
        let product = self.db.insert_product(product).await?;
        info!("🌽️ Product {} ({}) listed by {}", product.product_id, product.name, product.seller_id);
        Ok(product)
    }

    /// All products currently in stock, newest first.
    pub async fn available_products(&self) -> Result<Vec<Product>, OrderFlowError> {
        let products = self.db.fetch_available_products().await?;
        Ok(products)
    }
}
