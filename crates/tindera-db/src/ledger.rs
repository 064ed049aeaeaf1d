//! # Inventory Ledger
//!
//! The authoritative stock-quantity store and its atomic mutations.
//!
//! ## The Race This Module Eliminates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │         CHECK-THEN-WRITE (wrong)          CONDITIONAL UPDATE (here)     │
//! │                                                                         │
//! │  A: SELECT quantity  → 5                                               │
//! │  B: SELECT quantity  → 5                UPDATE stock_items             │
//! │  A: 5 >= 3, ok                          SET quantity = quantity - ?2   │
//! │  B: 5 >= 3, ok                          WHERE id = ?1                  │
//! │  A: UPDATE ... SET quantity = 2         AND quantity >= ?2             │
//! │  B: UPDATE ... SET quantity = 2  ❌                                    │
//! │                                         rows_affected == 0             │
//! │  Both sold 3 of 5. Stock lies.          → the losing checkout FAILS    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every deduction runs inside the caller's transaction, so a failure on
//! any line of a batch rolls back the lines already deducted. The ledger
//! is never left partially applied.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::engine::EngineError;
use crate::error::{DbError, DbResult};
use tindera_core::{CartLine, StockItem};

// =============================================================================
// Reservation
// =============================================================================

/// A cart line after successful reservation: product data frozen at the
/// moment stock was deducted.
#[derive(Debug, Clone)]
pub struct ReservedLine {
    pub product_id: String,
    pub name_snapshot: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub line_total_cents: i64,
}

/// Atomically checks and deducts stock for a whole cart.
///
/// For each line the quantity check and the decrement are ONE conditional
/// update - never a separate read-then-write pair. `rows_affected == 0`
/// signals the check failed.
///
/// Runs on the caller's transaction connection: if any line fails, the
/// caller drops the transaction and every prior deduction rolls back.
/// [`EngineError::InsufficientStock`] carries the offending product id,
/// the requested quantity, and what was actually available.
pub async fn reserve_and_deduct(
    conn: &mut SqliteConnection,
    lines: &[CartLine],
) -> Result<Vec<ReservedLine>, EngineError> {
    let now = Utc::now();
    let mut reserved = Vec::with_capacity(lines.len());

    for line in lines {
        // Snapshot name/price first; a missing row is a validation problem,
        // not a stock problem.
        let row: Option<(String, i64)> =
            sqlx::query_as("SELECT name, unit_price_cents FROM stock_items WHERE id = ?1")
                .bind(&line.product_id)
                .fetch_optional(&mut *conn)
                .await
                .map_err(DbError::from)?;

        let Some((name, unit_price_cents)) = row else {
            return Err(EngineError::UnknownProduct {
                product_id: line.product_id.clone(),
            });
        };

        let result = sqlx::query(
            r#"
            UPDATE stock_items
            SET quantity = quantity - ?2, updated_at = ?3
            WHERE id = ?1 AND quantity >= ?2
            "#,
        )
        .bind(&line.product_id)
        .bind(line.quantity)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            // The product exists (we just read it), so the check lost.
            let available: i64 =
                sqlx::query_scalar("SELECT quantity FROM stock_items WHERE id = ?1")
                    .bind(&line.product_id)
                    .fetch_one(&mut *conn)
                    .await
                    .map_err(DbError::from)?;

            debug!(
                product_id = %line.product_id,
                requested = line.quantity,
                available,
                "Reservation failed, rolling back batch"
            );

            return Err(EngineError::InsufficientStock {
                product_id: line.product_id.clone(),
                requested: line.quantity,
                available,
            });
        }

        reserved.push(ReservedLine {
            product_id: line.product_id.clone(),
            name_snapshot: name,
            unit_price_cents,
            quantity: line.quantity,
            line_total_cents: unit_price_cents * line.quantity,
        });
    }

    Ok(reserved)
}

/// Reverses a prior deduction.
///
/// Used when a cancelled order releases its reservation, or when a return
/// puts goods back on the shelf. Restoring is never implied by a delivery
/// failure - that is an explicit, separate call.
pub async fn restore(
    conn: &mut SqliteConnection,
    items: &[(String, i64)],
) -> DbResult<()> {
    let now = Utc::now();

    for (product_id, quantity) in items {
        let result = sqlx::query(
            r#"
            UPDATE stock_items
            SET quantity = quantity + ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockItem", product_id));
        }
    }

    Ok(())
}

// =============================================================================
// Stock Repository (read side + back-office CRUD)
// =============================================================================

/// Repository for stock item reads and back-office maintenance.
///
/// Quantity changes for fulfillment go through [`reserve_and_deduct`] and
/// [`restore`], never through this repository.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Gets a stock item by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockItem>> {
        let item = sqlx::query_as::<_, StockItem>(
            r#"
            SELECT id, name, category, unit_price_cents, quantity, condition,
                   created_at, updated_at
            FROM stock_items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Lists stock items sorted by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<StockItem>> {
        let items = sqlx::query_as::<_, StockItem>(
            r#"
            SELECT id, name, category, unit_price_cents, quantity, condition,
                   created_at, updated_at
            FROM stock_items
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Returns just the current quantity of an item.
    pub async fn quantity_of(&self, id: &str) -> DbResult<Option<i64>> {
        let quantity: Option<i64> =
            sqlx::query_scalar("SELECT quantity FROM stock_items WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(quantity)
    }

    /// Inserts a new stock item.
    pub async fn insert(&self, item: &StockItem) -> DbResult<()> {
        debug!(id = %item.id, name = %item.name, "Inserting stock item");

        sqlx::query(
            r#"
            INSERT INTO stock_items (
                id, name, category, unit_price_cents, quantity, condition,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.category)
        .bind(item.unit_price_cents)
        .bind(item.quantity)
        .bind(&item.condition)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Applies a manual quantity adjustment, e.g. restocking goods that came
    /// back from a failed delivery or writing off damage.
    ///
    /// Fails if the adjustment would take the quantity below zero. Returns
    /// the quantity after the change.
    pub async fn adjust_quantity(&self, id: &str, delta: i64) -> DbResult<Option<i64>> {
        debug!(id, delta, "Adjusting stock quantity");

        let result = sqlx::query(
            r#"
            UPDATE stock_items
            SET quantity = quantity + ?2, updated_at = ?3
            WHERE id = ?1 AND quantity + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let quantity: i64 = sqlx::query_scalar("SELECT quantity FROM stock_items WHERE id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(Some(quantity))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{seed_item, test_db};
    use tindera_core::CartLine;

    fn cart(product_id: &str, quantity: i64) -> Vec<CartLine> {
        vec![CartLine {
            product_id: product_id.to_string(),
            quantity,
        }]
    }

    #[tokio::test]
    async fn test_deduct_within_stock() {
        let db = test_db().await;
        let id = seed_item(&db, "Canned Tuna", 3500, 10).await;

        let mut tx = db.pool().begin().await.unwrap();
        let reserved = reserve_and_deduct(&mut tx, &cart(&id, 4)).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(reserved.len(), 1);
        assert_eq!(reserved[0].line_total_cents, 14000);
        assert_eq!(db.stock().quantity_of(&id).await.unwrap(), Some(6));
    }

    #[tokio::test]
    async fn test_deduct_rejects_shortfall_with_details() {
        let db = test_db().await;
        let id = seed_item(&db, "Canned Tuna", 3500, 2).await;

        let mut tx = db.pool().begin().await.unwrap();
        let err = reserve_and_deduct(&mut tx, &cart(&id, 3)).await.unwrap_err();
        drop(tx); // rollback

        match err {
            EngineError::InsufficientStock {
                product_id,
                requested,
                available,
            } => {
                assert_eq!(product_id, id);
                assert_eq!(requested, 3);
                assert_eq!(available, 2);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        assert_eq!(db.stock().quantity_of(&id).await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_failed_batch_rolls_back_earlier_lines() {
        let db = test_db().await;
        let plenty = seed_item(&db, "Rice 1kg", 6000, 50).await;
        let scarce = seed_item(&db, "Cooking Oil", 9000, 1).await;

        let lines = vec![
            CartLine {
                product_id: plenty.clone(),
                quantity: 5,
            },
            CartLine {
                product_id: scarce.clone(),
                quantity: 2,
            },
        ];

        let mut tx = db.pool().begin().await.unwrap();
        let err = reserve_and_deduct(&mut tx, &lines).await.unwrap_err();
        drop(tx); // rollback the whole batch

        assert!(matches!(err, EngineError::InsufficientStock { .. }));
        // First line was deducted inside the transaction, then rolled back.
        assert_eq!(db.stock().quantity_of(&plenty).await.unwrap(), Some(50));
        assert_eq!(db.stock().quantity_of(&scarce).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_a_stock_error() {
        let db = test_db().await;

        let mut tx = db.pool().begin().await.unwrap();
        let err = reserve_and_deduct(
            &mut tx,
            &cart("00000000-0000-0000-0000-00000000dead", 1),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, EngineError::UnknownProduct { .. }));
    }

    #[tokio::test]
    async fn test_restore_reverses_deduction() {
        let db = test_db().await;
        let id = seed_item(&db, "Sardines", 2500, 8).await;

        let mut tx = db.pool().begin().await.unwrap();
        reserve_and_deduct(&mut tx, &cart(&id, 5)).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        restore(&mut tx, &[(id.clone(), 5)]).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(db.stock().quantity_of(&id).await.unwrap(), Some(8));
    }
}
