use std::{fmt::Display, str::FromStr};

use agm_common::Cents;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------        UserId        --------------------------------------------------------
/// An opaque identifier for a marketplace user. Identity is owned by the external identity provider; the engine only
/// ever compares these for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct UserId(pub String);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------         Role         --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Buyer,
    Seller,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Buyer => write!(f, "Buyer"),
            Role::Seller => write!(f, "Seller"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Buyer" => Ok(Self::Buyer),
            "Seller" => Ok(Self::Seller),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------      Principal       --------------------------------------------------------
/// The authenticated caller, as vouched for by the identity provider. The engine trusts the id and role without
/// re-validating credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new<I: Into<UserId>>(id: I, role: Role) -> Self {
        Self { id: id.into(), role }
    }

    pub fn is_buyer(&self) -> bool {
        self.role == Role::Buyer
    }

    pub fn is_seller(&self) -> bool {
        self.role == Role::Seller
    }
}

//--------------------------------------      ProductId       --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn random() -> Self {
        Self(format!("prd-{:016x}", rand::random::<u64>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------        OrderId        -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    /// Order ids are assigned by the engine at creation time.
    pub fn random() -> Self {
        Self(format!("ord-{:016x}", rand::random::<u64>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------    UnitOfMeasure      -------------------------------------------------------
/// The unit a product is sold in. Quantities are whole multiples of the unit; produce sold in fractional amounts is
/// listed against a finer unit (grams rather than kilograms, say).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UnitOfMeasure {
    #[default]
    Kg,
    G,
    Lb,
    Piece,
    Dozen,
    Liter,
    Bag,
    Crate,
}

impl Display for UnitOfMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UnitOfMeasure::Kg => "kg",
            UnitOfMeasure::G => "g",
            UnitOfMeasure::Lb => "lb",
            UnitOfMeasure::Piece => "piece",
            UnitOfMeasure::Dozen => "dozen",
            UnitOfMeasure::Liter => "liter",
            UnitOfMeasure::Bag => "bag",
            UnitOfMeasure::Crate => "crate",
        };
        write!(f, "{s}")
    }
}

impl FromStr for UnitOfMeasure {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kg" => Ok(Self::Kg),
            "g" => Ok(Self::G),
            "lb" => Ok(Self::Lb),
            "piece" => Ok(Self::Piece),
            "dozen" => Ok(Self::Dozen),
            "liter" => Ok(Self::Liter),
            "bag" => Ok(Self::Bag),
            "crate" => Ok(Self::Crate),
            s => Err(ConversionError(format!("Invalid unit of measure: {s}"))),
        }
    }
}

//--------------------------------------    PaymentMethod      -------------------------------------------------------
/// How the buyer intends to pay. Recorded on the order only; payment capture happens outside this system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Mpesa,
    BankTransfer,
    Card,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Mpesa => "mpesa",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Card => "card",
        };
        write!(f, "{s}")
    }
}

//--------------------------------------     OrderStatus       -------------------------------------------------------
/// The order lifecycle.
///
/// Orders advance strictly one step at a time along
/// `pending → confirmed → processing → shipped → delivered`. `cancelled` is reachable from every state except
/// `delivered`. `delivered` and `cancelled` are terminal; nothing leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// The single legal successor in the fulfilment sequence, if any.
    pub fn successor(self) -> Option<OrderStatus> {
        use OrderStatus::*;
        match self {
            Pending => Some(Confirmed),
            Confirmed => Some(Processing),
            Processing => Some(Shipped),
            Shipped => Some(Delivered),
            Delivered | Cancelled => None,
        }
    }

    /// True only when `next` is the immediate successor of `self`. Skipping steps is never legal.
    pub fn can_advance_to(self, next: OrderStatus) -> bool {
        self.successor() == Some(next)
    }

    /// Every state except `delivered` may be cancelled. Cancelling a cancelled order is rejected separately so the
    /// stock release can never run twice.
    pub fn can_cancel(self) -> bool {
        self != OrderStatus::Delivered
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------       Product         -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub product_id: ProductId,
    pub seller_id: UserId,
    pub name: String,
    pub unit: UnitOfMeasure,
    pub price: Cents,
    pub available_quantity: i64,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_available(&self) -> bool {
        self.in_stock && self.available_quantity > 0
    }
}

//--------------------------------------      NewProduct       -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub product_id: ProductId,
    pub seller_id: UserId,
    pub name: String,
    pub unit: UnitOfMeasure,
    pub price: Cents,
    pub available_quantity: i64,
}

impl NewProduct {
    pub fn new<I: Into<UserId>, S: Into<String>>(
        seller_id: I,
        name: S,
        unit: UnitOfMeasure,
        price: Cents,
        available_quantity: i64,
    ) -> Self {
        Self {
            product_id: ProductId::random(),
            seller_id: seller_id.into(),
            name: name.into(),
            unit,
            price,
            available_quantity,
        }
    }
}

//--------------------------------------        Order          -------------------------------------------------------
/// A buyer's purchase of a single product line. `quantity`, `unit_price`, `total_price`, and the party references
/// are snapshots taken at creation and never change; only status and the cancellation/delivery bookkeeping fields
/// mutate afterwards.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Cents,
    pub total_price: Cents,
    pub status: OrderStatus,
    pub delivery_address: String,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub cancelled_by: Option<UserId>,
    pub cancel_reason: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_participant(&self, user: &UserId) -> bool {
        &self.buyer_id == user || &self.seller_id == user
    }

    /// The party on the other side of the order from `user`. Callers must have established that `user` is a
    /// participant first.
    pub fn counterparty_of(&self, user: &UserId) -> &UserId {
        if &self.buyer_id == user {
            &self.seller_id
        } else {
            &self.buyer_id
        }
    }
}

//--------------------------------------       NewOrder        -------------------------------------------------------
/// A validated order request, ready for the atomic reserve-and-insert. The price snapshot is taken inside the same
/// transaction as the reservation, so it is not part of this struct.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub buyer_id: UserId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub delivery_address: String,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

impl NewOrder {
    pub fn new<B: Into<UserId>, P: Into<ProductId>>(buyer_id: B, product_id: P, quantity: i64) -> Self {
        Self {
            order_id: OrderId::random(),
            buyer_id: buyer_id.into(),
            product_id: product_id.into(),
            quantity,
            delivery_address: String::new(),
            payment_method: PaymentMethod::default(),
            notes: None,
        }
    }

    pub fn with_delivery_address<S: Into<String>>(mut self, address: S) -> Self {
        self.delivery_address = address.into();
        self
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[cfg(test)]
mod test {
    use super::OrderStatus::*;
    use super::*;

    const ALL: [OrderStatus; 6] = [Pending, Confirmed, Processing, Shipped, Delivered, Cancelled];

    #[test]
    fn advancement_is_single_step() {
        for from in ALL {
            for to in ALL {
                let legal = matches!(
                    (from, to),
                    (Pending, Confirmed) | (Confirmed, Processing) | (Processing, Shipped) | (Shipped, Delivered)
                );
                assert_eq!(from.can_advance_to(to), legal, "advance {from} -> {to}");
            }
        }
    }

    #[test]
    fn only_delivered_is_uncancellable() {
        for status in ALL {
            assert_eq!(status.can_cancel(), status != Delivered, "cancel from {status}");
        }
    }

    #[test]
    fn terminal_states_have_no_successor() {
        assert!(Delivered.is_terminal());
        assert!(Cancelled.is_terminal());
        assert_eq!(Delivered.successor(), None);
        assert_eq!(Cancelled.successor(), None);
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in ALL {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("refunded".parse::<OrderStatus>().is_err());
    }
}
