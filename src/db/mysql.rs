//! The MySQL client/server backend.

use super::{ExpenseRow, Storage};
use crate::config::MySqlConfig;
use crate::error::Res;
use crate::model::Amount;
use anyhow::{ensure, Context};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions};
use sqlx::{Connection, Executor};
use tracing::debug;

const SCHEMA_SQL: &str = include_str!("mysql_schema.sql");
const INSERT_SQL: &str = "INSERT INTO expenses (amount, description) VALUES (?, ?)";

/// Stores expenses in a table on a MySQL server. The database is created if it is missing.
#[derive(Debug, Clone)]
pub struct MySqlStorage {
    config: MySqlConfig,
    pool: MySqlPool,
}

impl MySqlStorage {
    /// - Validates the database name
    /// - Creates the database and the `expenses` table if they do not exist
    ///
    /// The pool connects lazily because the database it points at may not exist until
    /// `ensure_initialized` has run.
    pub async fn open(config: MySqlConfig) -> Res<Self> {
        validate_database_name(config.database())?;
        let options = server_options(&config).database(config.database());
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_lazy_with(options);
        let storage = Self { config, pool };
        storage.ensure_initialized().await?;
        Ok(storage)
    }

    pub fn config(&self) -> &MySqlConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl Storage for MySqlStorage {
    async fn ensure_initialized(&self) -> Res<()> {
        let database = self.config.database();
        debug!(
            "Ensuring database `{database}` exists on {}:{}",
            self.config.host(),
            self.config.port()
        );

        let mut conn = MySqlConnection::connect_with(&server_options(&self.config))
            .await
            .with_context(|| {
                format!(
                    "Unable to connect to MySQL at {}:{} as {}",
                    self.config.host(),
                    self.config.port(),
                    self.config.user()
                )
            })?;
        let create = format!(
            "CREATE DATABASE IF NOT EXISTS `{database}` DEFAULT CHARACTER SET utf8mb4"
        );
        let created = conn
            .execute(create.as_str())
            .await
            .with_context(|| format!("Failed to create database `{database}`"));
        conn.close()
            .await
            .context("Failed to close the MySQL connection")?;
        created?;

        self.pool
            .execute(SCHEMA_SQL)
            .await
            .context("Failed to create the expenses table")?;
        Ok(())
    }

    async fn add(&self, amount: Amount, description: &str) -> Res<i64> {
        let result = sqlx::query(INSERT_SQL)
            .bind(amount.value())
            .bind(description)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to insert expense ({amount}, '{description}')"))?;
        let id = i64::try_from(result.last_insert_id())
            .context("The inserted id does not fit in an i64")?;
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
                .bind(amount.value())
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
        let rows: Vec<(i64, Decimal, String)> =
            sqlx::query_as("SELECT id, amount, description FROM expenses ORDER BY id")
                .fetch_all(&self.pool)
                .await
                .context("Failed to read expenses")?;

        rows.into_iter()
            .map(|(id, amount, description)| {
                Ok(ExpenseRow {
                    id,
                    amount: decimal_to_f64(amount)
                        .with_context(|| format!("Row {id} has a malformed amount"))?,
                    description,
                })
            })
            .collect()
    }

    async fn total(&self) -> Res<f64> {
        let total: Decimal = sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0) FROM expenses")
            .fetch_one(&self.pool)
            .await
            .context("Failed to sum expenses")?;
        decimal_to_f64(total)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Connection options for the server itself, without selecting a database.
fn server_options(config: &MySqlConfig) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(config.host())
        .port(config.port())
        .username(config.user())
        .password(config.password())
}

/// The database name is interpolated into `CREATE DATABASE`, so only plain identifiers are
/// accepted.
fn validate_database_name(name: &str) -> Res<()> {
    ensure!(
        !name.is_empty()
            && name.len() <= 64
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'),
        "Invalid MySQL database name '{name}': use 1 to 64 letters, digits or underscores"
    );
    Ok(())
}

fn decimal_to_f64(value: Decimal) -> Res<f64> {
    value
        .to_f64()
        .with_context(|| format!("{value} cannot be represented as a float"))
}
