use agm_common::Cents;
use agrimarket_engine::{OrderStatus, UnitOfMeasure};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddProductRequest {
    pub name: String,
    #[serde(default)]
    pub unit: UnitOfMeasure,
    pub price: Cents,
    pub available_quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderListParams {
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

/// Kept around for parity with the identity service's token endpoint during local development.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub user_id: String,
    pub role: agrimarket_engine::Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}
