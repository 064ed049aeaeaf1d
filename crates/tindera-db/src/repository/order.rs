//! # Order Repository
//!
//! Database operations for pending orders. An order row existing means its
//! stock is already reserved; the row is deleted in the same transaction
//! that creates the successor sale or delivery.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tindera_core::Order;

const ORDER_COLUMNS: &str = "id, customer_name, contact, address, place, fulfillment, \
     shipping_fee_cents, subtotal_cents, total_cents, created_at";

/// Repository for pending order reads.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets a pending order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Lists pending orders, newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }
}

// =============================================================================
// Transaction-scoped writes (engine use)
// =============================================================================

/// Fetches an order on the transition's own connection so the decision to
/// convert it and the conversion commit atomically.
pub(crate) async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(order)
}

/// Inserts a pending order.
pub(crate) async fn insert(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    debug!(id = %order.id, customer = %order.customer_name, "Inserting order");

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, customer_name, contact, address, place, fulfillment,
            shipping_fee_cents, subtotal_cents, total_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&order.id)
    .bind(&order.customer_name)
    .bind(&order.contact)
    .bind(&order.address)
    .bind(&order.place)
    .bind(order.fulfillment)
    .bind(order.shipping_fee_cents)
    .bind(order.subtotal_cents)
    .bind(order.total_cents)
    .bind(order.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Deletes a pending order, returning how many rows went away.
///
/// Zero rows means another request converted the order first; callers
/// treat that as a conflict, not a success.
pub(crate) async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
