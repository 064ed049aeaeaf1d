//! # Cashier Log Repository
//!
//! Append-only record of which staff member performed each settlement or
//! dispatch. Entries are never updated or deleted.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tindera_core::CashierLogEntry;

const LOG_COLUMNS: &str = "id, cashier_id, action, reference_id, amount_cents, created_at";

/// Repository for cashier log reads.
#[derive(Debug, Clone)]
pub struct CashierLogRepository {
    pool: SqlitePool,
}

impl CashierLogRepository {
    /// Creates a new CashierLogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CashierLogRepository { pool }
    }

    /// Lists log entries, newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<CashierLogEntry>> {
        let entries = sqlx::query_as::<_, CashierLogEntry>(&format!(
            "SELECT {LOG_COLUMNS} FROM cashier_log ORDER BY created_at DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Lists the entries that reference a given sale or delivery.
    pub async fn for_reference(&self, reference_id: &str) -> DbResult<Vec<CashierLogEntry>> {
        let entries = sqlx::query_as::<_, CashierLogEntry>(&format!(
            "SELECT {LOG_COLUMNS} FROM cashier_log WHERE reference_id = ?1 \
             ORDER BY created_at DESC"
        ))
        .bind(reference_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}

// =============================================================================
// Transaction-scoped operations (engine use)
// =============================================================================

/// Appends a log entry.
pub(crate) async fn append(conn: &mut SqliteConnection, entry: &CashierLogEntry) -> DbResult<()> {
    debug!(cashier = %entry.cashier_id, ?entry.action, reference = %entry.reference_id, "Appending cashier log entry");

    sqlx::query(
        r#"
        INSERT INTO cashier_log (id, cashier_id, action, reference_id, amount_cents, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.cashier_id)
    .bind(entry.action)
    .bind(&entry.reference_id)
    .bind(entry.amount_cents)
    .bind(entry.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
