//! # Tindera DB
//!
//! SQLite persistence and fulfillment engine for Tindera POS.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           tindera-db                                    │
//! │                                                                         │
//! │  ┌───────────────┐   ┌──────────────────────────────────────────┐      │
//! │  │   Database    │──►│ repositories (read side, one per table)  │      │
//! │  │  (SqlitePool) │   └──────────────────────────────────────────┘      │
//! │  │               │   ┌──────────────────────────────────────────┐      │
//! │  │               │──►│ engine (write side, one tx per           │      │
//! │  └───────────────┘   │ fulfillment transition)                  │      │
//! │                      └──────────────────────────────────────────┘      │
//! │                                                                         │
//! │  ledger ── atomic stock deduction shared by intake and walk-up sales   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Migrations are embedded at compile time and run automatically when the
//! pool opens, unless disabled via [`DbConfig`].

pub mod engine;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use engine::{Engine, EngineError, EngineResult, WalkUpSale};
pub use error::{DbError, DbResult};
pub use ledger::StockRepository;
pub use pool::{Database, DbConfig};
pub use repository::cashier::CashierLogRepository;
pub use repository::delivery::DeliveryRepository;
pub use repository::item::LineItemRepository;
pub use repository::order::OrderRepository;
pub use repository::payment::PaymentRepository;
pub use repository::returns::ReturnRepository;
pub use repository::sale::SaleRepository;

#[cfg(test)]
pub(crate) mod testutil {
    //! Shared helpers for in-memory database tests.

    use chrono::Utc;
    use uuid::Uuid;

    use crate::pool::{Database, DbConfig};
    use tindera_core::StockItem;

    /// Opens a fresh in-memory database with migrations applied.
    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .unwrap_or_else(|e| panic!("in-memory database should open: {e}"))
    }

    /// Inserts a stock item and returns its id.
    pub async fn seed_item(db: &Database, name: &str, price_cents: i64, quantity: i64) -> String {
        let now = Utc::now();
        let item = StockItem {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            category: "grocery".to_string(),
            unit_price_cents: price_cents,
            quantity,
            condition: "good".to_string(),
            created_at: now,
            updated_at: now,
        };

        db.stock()
            .insert(&item)
            .await
            .unwrap_or_else(|e| panic!("seed item should insert: {e}"));

        item.id
    }
}
