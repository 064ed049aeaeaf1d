//! # Return Record Repository
//!
//! Snapshots of failed deliveries. A return record exists while its delivery
//! sits in not_delivered; a later successful re-delivery removes it.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tindera_core::ReturnRecord;

const RETURN_COLUMNS: &str = "id, delivery_id, customer_name, address, total_cents, \
     payment_status, reason, staff_id, created_at";

/// Repository for return record reads.
#[derive(Debug, Clone)]
pub struct ReturnRepository {
    pool: SqlitePool,
}

impl ReturnRepository {
    /// Creates a new ReturnRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReturnRepository { pool }
    }

    /// Lists all outstanding return records, newest first.
    pub async fn list(&self) -> DbResult<Vec<ReturnRecord>> {
        let records = sqlx::query_as::<_, ReturnRecord>(&format!(
            "SELECT {RETURN_COLUMNS} FROM return_records ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Gets the return record for a delivery, if one exists.
    pub async fn get_for_delivery(&self, delivery_id: &str) -> DbResult<Option<ReturnRecord>> {
        let record = sqlx::query_as::<_, ReturnRecord>(&format!(
            "SELECT {RETURN_COLUMNS} FROM return_records WHERE delivery_id = ?1"
        ))
        .bind(delivery_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}

// =============================================================================
// Transaction-scoped operations (engine use)
// =============================================================================

/// Inserts a return record for a failed delivery.
pub(crate) async fn insert(conn: &mut SqliteConnection, record: &ReturnRecord) -> DbResult<()> {
    debug!(id = %record.id, delivery = %record.delivery_id, "Inserting return record");

    sqlx::query(
        r#"
        INSERT INTO return_records (
            id, delivery_id, customer_name, address, total_cents,
            payment_status, reason, staff_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&record.id)
    .bind(&record.delivery_id)
    .bind(&record.customer_name)
    .bind(&record.address)
    .bind(record.total_cents)
    .bind(record.payment_status)
    .bind(&record.reason)
    .bind(&record.staff_id)
    .bind(record.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Removes the return record for a delivery. Returns the affected row count;
/// zero is fine when the delivery never failed.
pub(crate) async fn delete_for_delivery(
    conn: &mut SqliteConnection,
    delivery_id: &str,
) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM return_records WHERE delivery_id = ?1")
        .bind(delivery_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
