//! # tindera-core: Pure Business Logic for Tindera POS
//!
//! This crate is the **heart** of Tindera POS. It contains all business
//! rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Tindera POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     HTTP API (apps/server)                      │   │
//! │  │    create_order, settle_order, dispatch, mark_delivered, ...    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tindera-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ shipping  │  │ validation│  │   │
//! │  │   │ StockItem │  │   Money   │  │ FeeTable  │  │   rules   │  │   │
//! │  │   │ Order/... │  │  (cents)  │  │           │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  tindera-db (Database Layer)                    │   │
//! │  │        inventory ledger, fulfillment engine, repositories       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (StockItem, Order, Sale, Delivery, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`shipping`] - Delivery-place to fee lookup (pure collaborator)

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod shipping;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tindera_core::Money` instead of
// `use tindera_core::money::Money`

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use shipping::ShippingFeeTable;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Payment label recorded on a delivery created by dispatch.
///
/// The label is exactly that: a label. The actual money changes hands when
/// the rider collects, tracked separately in `payment_status`.
pub const COD_PAYMENT_LABEL: &str = "cash_on_delivery";

/// Maximum distinct line items allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable transaction sizes.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single item in a cart.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
