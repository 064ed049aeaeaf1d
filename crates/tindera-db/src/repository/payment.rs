//! # Payment Status Repository
//!
//! Keyed payment state per settled sale or outstanding delivery. Each
//! (owner_kind, owner_id) pair holds at most one row; writes go through a
//! single upsert so the last write wins and no duplicate rows accumulate.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tindera_core::{PaymentOwner, PaymentState, PaymentStatus};

const PAYMENT_COLUMNS: &str = "id, owner_kind, owner_id, status, updated_at";

/// Repository for payment status reads and standalone updates.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Gets the payment status for an owner, if one has been recorded.
    pub async fn get(&self, owner: PaymentOwner, owner_id: &str) -> DbResult<Option<PaymentStatus>> {
        let status = sqlx::query_as::<_, PaymentStatus>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payment_status \
             WHERE owner_kind = ?1 AND owner_id = ?2"
        ))
        .bind(owner)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(status)
    }

    /// Sets the payment state for an owner outside any transition, e.g. a
    /// cashier correcting a record after the fact.
    pub async fn upsert(
        &self,
        owner: PaymentOwner,
        owner_id: &str,
        state: PaymentState,
    ) -> DbResult<PaymentStatus> {
        let mut conn = self.pool.acquire().await?;
        upsert_with(&mut conn, owner, owner_id, state).await?;

        let status = sqlx::query_as::<_, PaymentStatus>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payment_status \
             WHERE owner_kind = ?1 AND owner_id = ?2"
        ))
        .bind(owner)
        .bind(owner_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(status)
    }
}

// =============================================================================
// Transaction-scoped operations (engine use)
// =============================================================================

/// Writes the payment state for an owner, inserting or replacing in place.
pub(crate) async fn upsert_with(
    conn: &mut SqliteConnection,
    owner: PaymentOwner,
    owner_id: &str,
    state: PaymentState,
) -> DbResult<()> {
    debug!(?owner, owner_id, ?state, "Upserting payment status");

    sqlx::query(
        r#"
        INSERT INTO payment_status (id, owner_kind, owner_id, status, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT (owner_kind, owner_id)
        DO UPDATE SET status = excluded.status, updated_at = excluded.updated_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(owner)
    .bind(owner_id)
    .bind(state)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Reads the payment state for an owner on the transition's own connection.
pub(crate) async fn get_with(
    conn: &mut SqliteConnection,
    owner: PaymentOwner,
    owner_id: &str,
) -> DbResult<Option<PaymentStatus>> {
    let status = sqlx::query_as::<_, PaymentStatus>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payment_status \
         WHERE owner_kind = ?1 AND owner_id = ?2"
    ))
    .bind(owner)
    .bind(owner_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(status)
}
