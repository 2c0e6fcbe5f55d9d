use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatus, PaymentMethod, ProductId, UserId};

/// The wire-facing order creation request. Validation happens in
/// [`crate::api::order_flow_api::OrderFlowApi::create_order`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub product_id: ProductId,
    pub quantity: i64,
    pub delivery_address: String,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    pub total_orders: usize,
    pub orders: Vec<Order>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub buyer_id: Option<UserId>,
    pub seller_id: Option<UserId>,
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub statuses: Vec<OrderStatus>,
}

impl OrderQueryFilter {
    pub fn with_buyer_id(mut self, buyer_id: UserId) -> Self {
        self.buyer_id = Some(buyer_id);
        self
    }

    pub fn with_seller_id(mut self, seller_id: UserId) -> Self {
        self.seller_id = Some(seller_id);
        self
    }

    pub fn with_product_id(mut self, product_id: ProductId) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buyer_id.is_none() && self.seller_id.is_none() && self.product_id.is_none() && self.statuses.is_empty()
    }
}
