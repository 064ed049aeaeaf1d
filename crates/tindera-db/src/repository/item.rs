//! # Line Item Repository
//!
//! Line items live in one canonical table with one canonical `quantity`
//! column. Ownership (`order` / `sale` / `delivery`) moves with the record
//! transition: settling an order re-parents its items to the sale instead
//! of copying them, so a line item belongs to exactly one record at any
//! observation point.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use tindera_core::{LineItem, LineOwner};

const ITEM_COLUMNS: &str = "id, owner_kind, owner_id, product_id, name_snapshot, \
     unit_price_cents, quantity, line_total_cents, created_at";

/// Repository for line item reads.
#[derive(Debug, Clone)]
pub struct LineItemRepository {
    pool: SqlitePool,
}

impl LineItemRepository {
    /// Creates a new LineItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LineItemRepository { pool }
    }

    /// Gets all line items belonging to one order, sale, or delivery.
    pub async fn for_owner(&self, kind: LineOwner, owner_id: &str) -> DbResult<Vec<LineItem>> {
        let items = sqlx::query_as::<_, LineItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM line_items \
             WHERE owner_kind = ?1 AND owner_id = ?2 ORDER BY created_at"
        ))
        .bind(kind)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}

// =============================================================================
// Transaction-scoped writes (engine use)
// =============================================================================

/// Fetches an owner's items on the transition's connection.
pub(crate) async fn fetch_for_owner(
    conn: &mut SqliteConnection,
    kind: LineOwner,
    owner_id: &str,
) -> DbResult<Vec<LineItem>> {
    let items = sqlx::query_as::<_, LineItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM line_items \
         WHERE owner_kind = ?1 AND owner_id = ?2 ORDER BY created_at"
    ))
    .bind(kind)
    .bind(owner_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// Inserts a batch of line items.
pub(crate) async fn insert_many(
    conn: &mut SqliteConnection,
    items: &[LineItem],
) -> DbResult<()> {
    for item in items {
        sqlx::query(
            r#"
            INSERT INTO line_items (
                id, owner_kind, owner_id, product_id, name_snapshot,
                unit_price_cents, quantity, line_total_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&item.id)
        .bind(item.owner_kind)
        .bind(&item.owner_id)
        .bind(&item.product_id)
        .bind(&item.name_snapshot)
        .bind(item.unit_price_cents)
        .bind(item.quantity)
        .bind(item.line_total_cents)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Re-parents all items from one record to its successor.
///
/// Used for Order → Sale and Order → Delivery, where the source record is
/// deleted in the same transaction. Delivery → Sale copies instead (the
/// delivery row is retained as history and keeps its items).
pub(crate) async fn transfer(
    conn: &mut SqliteConnection,
    from_kind: LineOwner,
    from_id: &str,
    to_kind: LineOwner,
    to_id: &str,
) -> DbResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE line_items
        SET owner_kind = ?3, owner_id = ?4
        WHERE owner_kind = ?1 AND owner_id = ?2
        "#,
    )
    .bind(from_kind)
    .bind(from_id)
    .bind(to_kind)
    .bind(to_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Deletes an owner's items (cancelled orders only; sales and deliveries
/// never lose their items).
pub(crate) async fn delete_for_owner(
    conn: &mut SqliteConnection,
    kind: LineOwner,
    owner_id: &str,
) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM line_items WHERE owner_kind = ?1 AND owner_id = ?2")
        .bind(kind)
        .bind(owner_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}
