//! # Fulfillment Engine
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Fulfillment Engine                      │
//! │                                                             │
//! │   intake ──► settlement ──► sale                            │
//! │     │                        ▲                              │
//! │     └──────► dispatch ──► outcome                           │
//! │                                                             │
//! │   Every transition that touches more than one record runs   │
//! │   inside a single database transaction. A cart, an order,   │
//! │   or a delivery is therefore visible in exactly one place   │
//! │   at any moment.                                            │
//! └─────────────────────────────────────────────────────────────┘
//!
//! The engine owns the connection pool and composes the repository write
//! functions on one transaction per transition. Read paths go through the
//! repository structs on [`crate::pool::Database`] instead.

use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::error::DbError;
use tindera_core::CoreError;

pub mod dispatch;
pub mod intake;
pub mod outcome;
pub mod settlement;

pub use settlement::WalkUpSale;

// =============================================================================
// Errors
// =============================================================================

/// Errors produced by fulfillment transitions.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input failed domain validation before touching the database.
    #[error(transparent)]
    Validation(#[from] CoreError),

    /// A cart line referenced a product that does not exist.
    #[error("Unknown product: {product_id}")]
    UnknownProduct { product_id: String },

    /// A cart line asked for more units than the ledger holds.
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// The referenced record does not exist anywhere in the system.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The record exists but is not in a state that permits the transition.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage failure underneath the transition.
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<tindera_core::ValidationError> for EngineError {
    fn from(err: tindera_core::ValidationError) -> Self {
        EngineError::Validation(CoreError::from(err))
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Db(DbError::from(err))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Engine
// =============================================================================

/// Executes fulfillment transitions against the connection pool.
#[derive(Debug, Clone)]
pub struct Engine {
    pool: SqlitePool,
}

impl Engine {
    /// Creates a new Engine over an open pool.
    pub fn new(pool: SqlitePool) -> Self {
        Engine { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Generates a fresh record identifier.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Case-insensitive, whitespace-tolerant name comparison for customer
/// identity checks at the counter.
pub(crate) fn names_match(stored: &str, presented: &str) -> bool {
    stored.trim().eq_ignore_ascii_case(presented.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_match_ignores_case_and_whitespace() {
        assert!(names_match("Maria Santos", "  maria santos "));
        assert!(names_match("MARIA", "maria"));
        assert!(!names_match("Maria Santos", "Maria Cruz"));
    }
}
