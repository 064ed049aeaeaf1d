//! # Domain Types
//!
//! Core domain types used throughout Tindera POS.
//!
//! ## Record Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Fulfillment Lifecycle                              │
//! │                                                                         │
//! │   cart ──► Order (stock reserved)                                      │
//! │              │                                                          │
//! │              ├── settle ──────────────► Sale (terminal)                │
//! │              │                                                          │
//! │              └── dispatch ──► Delivery ──┬── delivered ──► Sale        │
//! │                                          │                              │
//! │                                          └── not_delivered ──► Return  │
//! │                                                                         │
//! │   A given order identity exists in at most ONE of                      │
//! │   {Order, Sale, Delivery} at any time. Orders are deleted on           │
//! │   transition; deliveries are retained as history after resolution.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity id is a UUID v4 string - immutable, used for relations.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Fulfillment Type
// =============================================================================

/// How a completed order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum FulfillmentType {
    /// Customer collects in store.
    Pickup,
    /// Order is routed to the delivery flow.
    Delivery,
}

// =============================================================================
// Delivery Status
// =============================================================================

/// State of a delivery record.
///
/// `Delivered` and `NotDelivered` are terminal for the delivery row itself.
/// `NotDelivered` is NOT terminal for the order identity - a re-attempt may
/// still resolve it to `Delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Created by dispatch, not yet out.
    Pending,
    /// Rider is en route.
    OnTheWay,
    /// Resolved successfully; a Sale exists for this delivery.
    Delivered,
    /// Resolution failed; an open ReturnRecord exists for this delivery.
    NotDelivered,
}

impl DeliveryStatus {
    /// Whether the status is a resolved outcome.
    pub const fn is_resolved(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::NotDelivered)
    }
}

impl Default for DeliveryStatus {
    fn default() -> Self {
        DeliveryStatus::Pending
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::OnTheWay => "on_the_way",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::NotDelivered => "not_delivered",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Payment State
// =============================================================================

/// Payment state of a sale or delivery.
///
/// Independent lifecycle from fulfillment: a delivery can be `delivered`
/// and `unpaid` simultaneously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Unpaid,
    Paid,
    Pending,
    Failed,
}

/// Which record a payment status row is keyed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentOwner {
    Sale,
    Delivery,
}

// =============================================================================
// Line Item Owner
// =============================================================================

/// Which record a line item currently belongs to.
///
/// Ownership moves with the fulfillment transition: an order's items become
/// the sale's (or delivery's) items when the order is converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum LineOwner {
    Order,
    Sale,
    Delivery,
}

// =============================================================================
// Stock Item
// =============================================================================

/// An item available for sale.
///
/// `quantity` is the authoritative available count. It is mutated ONLY
/// through the inventory ledger's conditional updates and never goes
/// below zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to cashier and on records.
    pub name: String,

    /// Category label for back-office grouping.
    pub category: String,

    /// Unit price in cents (smallest currency unit).
    pub unit_price_cents: i64,

    /// Current available quantity (>= 0 invariant).
    pub quantity: i64,

    /// Condition metadata ("new", "repacked", ...).
    pub condition: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// A line item belonging to exactly one order, sale, or delivery.
/// Uses snapshot pattern to freeze product data at reservation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    pub owner_kind: LineOwner,
    pub owner_id: String,
    pub product_id: String,
    /// Product name at time of reservation (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of reservation (frozen).
    pub unit_price_cents: i64,
    /// Quantity reserved. Single canonical field - never `qty`.
    pub quantity: i64,
    /// Line total (unit_price × quantity).
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl LineItem {
    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A pending customer order. Stock is already reserved while this exists.
///
/// An Order never exists simultaneously with its successor record; the row
/// is deleted in the same transaction that creates the Sale or Delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub contact: String,
    pub address: String,
    /// Delivery place, used for the shipping fee lookup.
    pub place: String,
    pub fulfillment: FulfillmentType,
    pub shipping_fee_cents: i64,
    pub subtotal_cents: i64,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// A completed sale. Terminal - never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    /// The pending order this sale settled, if any.
    pub source_order_id: Option<String>,
    /// The delivery this sale resolved, if any.
    pub source_delivery_id: Option<String>,
    pub customer_name: String,
    pub contact: String,
    pub fulfillment: FulfillmentType,
    pub shipping_fee_cents: i64,
    pub subtotal_cents: i64,
    pub total_cents: i64,
    /// Cashier or staff member who completed the sale.
    pub cashier_id: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Delivery
// =============================================================================

/// An order routed for off-site fulfillment.
///
/// Created only by the dispatcher; resolved exactly once by the outcome
/// handler. Retained as history after resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub id: String,
    pub source_order_id: String,
    pub customer_name: String,
    pub contact: String,
    pub address: String,
    pub place: String,
    pub status: DeliveryStatus,
    /// Assigned rider, if any.
    pub rider: Option<String>,
    /// Payment method label (collect-on-delivery by default).
    pub payment_label: String,
    pub shipping_fee_cents: i64,
    pub subtotal_cents: i64,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Payment Status
// =============================================================================

/// Payment state keyed to a sale or delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatus {
    pub id: String,
    pub owner_kind: PaymentOwner,
    pub owner_id: String,
    pub status: PaymentState,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Return Record
// =============================================================================

/// Record of a failed delivery attempt.
///
/// Carries a snapshot of the delivery's data plus the failure reason and
/// handling staff. A later successful re-delivery deletes this record
/// (supersession, not append).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ReturnRecord {
    pub id: String,
    pub delivery_id: String,
    pub customer_name: String,
    pub address: String,
    pub total_cents: i64,
    /// Payment state of the delivery at the time of failure.
    pub payment_status: PaymentState,
    pub reason: String,
    pub staff_id: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cashier Log
// =============================================================================

/// What a cashier log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum CashierAction {
    /// A sale was completed.
    Sale,
    /// A pending order was dispatched to delivery.
    Dispatch,
}

/// Append-only audit record: who handled which transaction and for how much.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CashierLogEntry {
    pub id: String,
    pub cashier_id: String,
    pub action: CashierAction,
    /// The sale or delivery this entry describes.
    pub reference_id: String,
    pub amount_cents: i64,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Input Types
// =============================================================================

/// A cart line as submitted by a caller. Quantities and product references
/// are validated before any reservation happens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
}

/// Input for creating a pending order.
///
/// The shipping fee is computed externally (see [`crate::shipping`]) and
/// passed in; the intake step treats it as data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub customer_name: String,
    pub contact: String,
    pub address: String,
    pub place: String,
    pub fulfillment: FulfillmentType,
    pub shipping_fee_cents: i64,
    pub lines: Vec<CartLine>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_status_default() {
        assert_eq!(DeliveryStatus::default(), DeliveryStatus::Pending);
    }

    #[test]
    fn test_delivery_status_resolved() {
        assert!(!DeliveryStatus::Pending.is_resolved());
        assert!(!DeliveryStatus::OnTheWay.is_resolved());
        assert!(DeliveryStatus::Delivered.is_resolved());
        assert!(DeliveryStatus::NotDelivered.is_resolved());
    }

    #[test]
    fn test_status_serde_names() {
        let s = serde_json::to_string(&DeliveryStatus::OnTheWay).unwrap();
        assert_eq!(s, "\"on_the_way\"");
        let s = serde_json::to_string(&PaymentState::Unpaid).unwrap();
        assert_eq!(s, "\"unpaid\"");
    }
}
