//! Balance history repository.

use chrono::{DateTime, Utc};
use dlmm_lp_domain::value_objects::BalanceSnapshot;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use uuid::Uuid;

fn snapshot_from_row(row: &PgRow) -> Result<BalanceSnapshot, sqlx::Error> {
    Ok(BalanceSnapshot {
        recorded_at: row.try_get("recorded_at")?,
        symbol_a: row.try_get("symbol_a")?,
        symbol_b: row.try_get("symbol_b")?,
        amount_a: row.try_get("amount_a")?,
        amount_b: row.try_get("amount_b")?,
        price: row.try_get("price")?,
        total_value: row.try_get("total_value")?,
    })
}

/// Repository for total-usable-balance snapshots.
#[derive(Clone)]
pub struct BalanceRepository {
    pool: Arc<PgPool>,
}

impl BalanceRepository {
    /// Creates a new BalanceRepository.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Saves a snapshot.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn save(&self, snapshot: &BalanceSnapshot) -> Result<Uuid, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO balance_snapshots (id, recorded_at, symbol_a, symbol_b,
                                           amount_a, amount_b, price, total_value)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(snapshot.recorded_at)
        .bind(&snapshot.symbol_a)
        .bind(&snapshot.symbol_b)
        .bind(snapshot.amount_a)
        .bind(snapshot.amount_b)
        .bind(snapshot.price)
        .bind(snapshot.total_value)
        .execute(self.pool.as_ref())
        .await?;
        Ok(id)
    }

    /// Finds the latest snapshot recorded at or before `before`.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn find_latest_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Option<BalanceSnapshot>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT * FROM balance_snapshots
            WHERE recorded_at <= $1
            ORDER BY recorded_at DESC
            LIMIT 1
            "#,
        )
        .bind(before)
        .fetch_optional(self.pool.as_ref())
        .await?;
        row.as_ref().map(snapshot_from_row).transpose()
    }
}
