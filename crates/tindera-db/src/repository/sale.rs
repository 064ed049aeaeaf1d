//! # Sale Repository
//!
//! Database operations for completed sales. A sale row is terminal: it is
//! inserted once by a settlement or delivery-outcome transition and never
//! updated or deleted.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tindera_core::Sale;

const SALE_COLUMNS: &str = "id, source_order_id, source_delivery_id, customer_name, contact, \
     fulfillment, shipping_fee_cents, subtotal_cents, total_cents, cashier_id, created_at";

/// Repository for sale reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets the sale that settled a given order, if any.
    pub async fn get_by_source_order(&self, order_id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE source_order_id = ?1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Lists sales, newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }
}

// =============================================================================
// Transaction-scoped operations (engine use)
// =============================================================================

/// Inserts a completed sale.
pub(crate) async fn insert(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, total = sale.total_cents, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, source_order_id, source_delivery_id, customer_name, contact,
            fulfillment, shipping_fee_cents, subtotal_cents, total_cents,
            cashier_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.source_order_id)
    .bind(&sale.source_delivery_id)
    .bind(&sale.customer_name)
    .bind(&sale.contact)
    .bind(sale.fulfillment)
    .bind(sale.shipping_fee_cents)
    .bind(sale.subtotal_cents)
    .bind(sale.total_cents)
    .bind(&sale.cashier_id)
    .bind(sale.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Looks up the sale created when a delivery resolved, on the transition's
/// own connection. Backs the idempotent re-delivery path.
pub(crate) async fn get_by_source_delivery(
    conn: &mut SqliteConnection,
    delivery_id: &str,
) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {SALE_COLUMNS} FROM sales WHERE source_delivery_id = ?1"
    ))
    .bind(delivery_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(sale)
}

/// Checks whether a sale settled the given order (conflict detection when
/// the order row is already gone).
pub(crate) async fn exists_for_source_order(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE source_order_id = ?1")
        .bind(order_id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(count > 0)
}
