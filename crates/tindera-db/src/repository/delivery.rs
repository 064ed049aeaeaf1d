//! # Delivery Repository
//!
//! Database operations for delivery consignments. A delivery row lives from
//! dispatch until an outcome resolves it, and is retained afterwards as the
//! dispatch history record.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tindera_core::{Delivery, DeliveryStatus};

const DELIVERY_COLUMNS: &str = "id, source_order_id, customer_name, contact, address, place, \
     status, rider, payment_label, shipping_fee_cents, subtotal_cents, total_cents, \
     created_at, updated_at";

/// Repository for delivery reads.
#[derive(Debug, Clone)]
pub struct DeliveryRepository {
    pool: SqlitePool,
}

impl DeliveryRepository {
    /// Creates a new DeliveryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DeliveryRepository { pool }
    }

    /// Gets a delivery by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Delivery>> {
        let delivery = sqlx::query_as::<_, Delivery>(&format!(
            "SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(delivery)
    }

    /// Lists deliveries, newest first, optionally filtered by status.
    pub async fn list(&self, status: Option<DeliveryStatus>) -> DbResult<Vec<Delivery>> {
        let deliveries = match status {
            Some(status) => {
                sqlx::query_as::<_, Delivery>(&format!(
                    "SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE status = ?1 \
                     ORDER BY created_at DESC"
                ))
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Delivery>(&format!(
                    "SELECT {DELIVERY_COLUMNS} FROM deliveries ORDER BY created_at DESC"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(deliveries)
    }
}

// =============================================================================
// Transaction-scoped operations (engine use)
// =============================================================================

/// Fetches a delivery on the transition's own connection.
pub(crate) async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Delivery>> {
    let delivery = sqlx::query_as::<_, Delivery>(&format!(
        "SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(delivery)
}

/// Inserts a newly dispatched delivery.
pub(crate) async fn insert(conn: &mut SqliteConnection, delivery: &Delivery) -> DbResult<()> {
    debug!(id = %delivery.id, order = %delivery.source_order_id, "Inserting delivery");

    sqlx::query(
        r#"
        INSERT INTO deliveries (
            id, source_order_id, customer_name, contact, address, place,
            status, rider, payment_label, shipping_fee_cents, subtotal_cents,
            total_cents, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
    )
    .bind(&delivery.id)
    .bind(&delivery.source_order_id)
    .bind(&delivery.customer_name)
    .bind(&delivery.contact)
    .bind(&delivery.address)
    .bind(&delivery.place)
    .bind(delivery.status)
    .bind(&delivery.rider)
    .bind(&delivery.payment_label)
    .bind(delivery.shipping_fee_cents)
    .bind(delivery.subtotal_cents)
    .bind(delivery.total_cents)
    .bind(delivery.created_at)
    .bind(delivery.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Checks whether an order has already been handed to a rider (conflict
/// detection when the order row is already gone).
pub(crate) async fn exists_for_source_order(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM deliveries WHERE source_order_id = ?1")
            .bind(order_id)
            .fetch_one(&mut *conn)
            .await?;

    Ok(count > 0)
}

/// Updates the status of a delivery. Returns the affected row count so the
/// caller can detect a missing row.
pub(crate) async fn set_status(
    conn: &mut SqliteConnection,
    id: &str,
    status: DeliveryStatus,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let result = sqlx::query("UPDATE deliveries SET status = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(status)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// Assigns or replaces the rider on a delivery.
pub(crate) async fn set_rider(
    conn: &mut SqliteConnection,
    id: &str,
    rider: &str,
    now: DateTime<Utc>,
) -> DbResult<u64> {
    let result = sqlx::query("UPDATE deliveries SET rider = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(rider)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
