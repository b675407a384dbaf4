//! `PostgreSQL`-backed ledger store.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::RepositoryError;
use crate::ledger::{LedgerError, LedgerStore};

/// [`LedgerStore`] over the `ledger_entries` table.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<RepositoryError> for LedgerError {
    fn from(err: RepositoryError) -> Self {
        Self::Storage(err.to_string())
    }
}

fn storage(err: sqlx::Error) -> LedgerError {
    RepositoryError::from(err).into()
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        let row = sqlx::query("SELECT value FROM ledger_entries WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        row.map(|r| r.try_get::<String, _>("value"))
            .transpose()
            .map_err(storage)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), LedgerError> {
        sqlx::query(
            r"
            INSERT INTO ledger_entries (key, value, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, updated_at = now()
            ",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), LedgerError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(())
    }
}
