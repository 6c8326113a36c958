//! Repository implementations for database persistence.
//!
//! This module provides repository patterns for storing and retrieving
//! agent actions and balance history, plus a PostgreSQL-backed
//! [`ActionLog`](crate::ActionLog).

mod action_repository;
mod balance_repository;

pub use action_repository::{ActionRecord, ActionRepository};
pub use balance_repository::BalanceRepository;

use crate::action_log::ActionLog;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dlmm_lp_domain::value_objects::BalanceSnapshot;
use sqlx::PgPool;
use std::sync::Arc;

/// Database connection wrapper for repositories.
#[derive(Clone)]
pub struct Database {
    pool: Arc<PgPool>,
}

impl Database {
    /// Creates a new Database wrapper from a connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Creates a new database connection from a connection string.
    ///
    /// # Arguments
    /// * `database_url` - PostgreSQL connection string
    ///
    /// # Errors
    /// Returns an error if the connection fails.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates an ActionRepository instance.
    #[must_use]
    pub fn actions(&self) -> ActionRepository {
        ActionRepository::new(self.pool.clone())
    }

    /// Creates a BalanceRepository instance.
    #[must_use]
    pub fn balances(&self) -> BalanceRepository {
        BalanceRepository::new(self.pool.clone())
    }

    /// Runs database migrations.
    ///
    /// # Errors
    /// Returns an error if migrations fail.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(include_str!("../../migrations/001_initial_schema.sql"))
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }
}

/// [`ActionLog`] stored in PostgreSQL.
#[derive(Clone)]
pub struct PgActionLog {
    actions: ActionRepository,
    balances: BalanceRepository,
}

impl PgActionLog {
    /// Builds the log on an existing connection.
    #[must_use]
    pub fn from_database(db: &Database) -> Self {
        Self {
            actions: db.actions(),
            balances: db.balances(),
        }
    }
}

#[async_trait]
impl ActionLog for PgActionLog {
    async fn append(&self, message: &str) -> Result<()> {
        self.actions.save(message).await?;
        Ok(())
    }

    async fn record_balance(&self, snapshot: &BalanceSnapshot) -> Result<()> {
        self.balances.save(snapshot).await?;
        Ok(())
    }

    async fn latest_balance_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<Option<BalanceSnapshot>> {
        Ok(self.balances.find_latest_before(before).await?)
    }
}
