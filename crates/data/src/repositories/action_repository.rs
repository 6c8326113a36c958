//! Action line repository.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use uuid::Uuid;

/// Database record for an agent action.
#[derive(Debug, Clone)]
pub struct ActionRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Human-readable action line.
    pub message: String,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ActionRecord {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            message: row.try_get("message")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Repository for agent action lines.
#[derive(Clone)]
pub struct ActionRepository {
    pool: Arc<PgPool>,
}

impl ActionRepository {
    /// Creates a new ActionRepository.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Appends an action line.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn save(&self, message: &str) -> Result<ActionRecord, sqlx::Error> {
        let row = sqlx::query(
            r#"
            INSERT INTO agent_actions (id, message)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(message)
        .fetch_one(self.pool.as_ref())
        .await?;
        ActionRecord::from_row(&row)
    }

    /// Returns the most recent actions, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn find_recent(&self, limit: i64) -> Result<Vec<ActionRecord>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM agent_actions
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;
        rows.iter().map(ActionRecord::from_row).collect()
    }
}
