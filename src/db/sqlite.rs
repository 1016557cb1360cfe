//! The embedded SQLite backend.

use super::{ExpenseRow, Storage};
use crate::error::Res;
use crate::model::Amount;
use crate::utils;
use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Executor;
use std::path::{Path, PathBuf};
use tracing::debug;

const SCHEMA_SQL: &str = include_str!("sqlite_schema.sql");
const INSERT_SQL: &str = "INSERT INTO expenses (amount, description) VALUES (?, ?)";

/// Stores expenses in a local SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    path: PathBuf,
    pool: SqlitePool,
}

impl SqliteStorage {
    /// - Creates the parent directory of `path` if needed
    /// - Creates the SQLite file if it does not exist
    /// - Creates the `expenses` table if it does not exist
    pub async fn open(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            utils::make_dir(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        // A single connection: one command runs one statement at a time.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| format!("Unable to open SQLite database at {}", path.display()))?;

        let storage = Self {
            path: path.to_path_buf(),
            pool,
        };
        storage.ensure_initialized().await?;
        Ok(storage)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl Storage for SqliteStorage {
    async fn ensure_initialized(&self) -> Res<()> {
        debug!("Ensuring the expenses table exists in {}", self.path.display());
        self.pool
            .execute(SCHEMA_SQL)
            .await
            .context("Failed to create the expenses table")?;
        Ok(())
    }

    async fn add(&self, amount: Amount, description: &str) -> Res<i64> {
        let result = sqlx::query(INSERT_SQL)
            .bind(amount.to_f64())
            .bind(description)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to insert expense ({amount}, '{description}')"))?;
        let id = result.last_insert_rowid();
        debug!("Inserted expense {id}");
        Ok(id)
    }

    async fn add_many(&self, items: &[(Amount, String)]) -> Res<u64> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        let mut count = 0;
        for (amount, description) in items {
            count += sqlx::query(INSERT_SQL)
                .bind(amount.to_f64())
                .bind(description.as_str())
                .execute(&mut *tx)
                .await
                .with_context(|| {
                    format!("Failed to insert expense ({amount}, '{description}')")
                })?
                .rows_affected();
        }

        tx.commit().await.context("Failed to commit transaction")?;
        debug!("Inserted {count} expenses");
        Ok(count)
    }

    async fn list_all(&self) -> Res<Vec<ExpenseRow>> {
        let rows: Vec<(i64, f64, String)> =
            sqlx::query_as("SELECT id, amount, description FROM expenses ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .context("Failed to read expenses")?;

        Ok(rows
            .into_iter()
            .map(|(id, amount, description)| ExpenseRow {
                id,
                amount,
                description,
            })
            .collect())
    }

    async fn total(&self) -> Res<f64> {
        // TOTAL() is 0.0 on an empty table where SUM() would be NULL.
        let total: f64 = sqlx::query_scalar("SELECT TOTAL(amount) FROM expenses")
            .fetch_one(&self.pool)
            .await
            .context("Failed to sum expenses")?;
        Ok(total)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
