//! This module is responsible for reading and writing the relational `expenses` table.
//!
//! Two backends implement the [`Storage`] trait: [`SqliteStorage`] keeps the table in a local
//! SQLite file and [`MySqlStorage`] talks to a MySQL server. Callers pick one with [`open`] and
//! only ever see `Box<dyn Storage>`.

mod mysql;
mod sqlite;

use crate::config::{Backend, StorageConfig};
use crate::error::Res;
use crate::model::{Amount, Expense};
use anyhow::Context;
use serde::Serialize;

pub use mysql::MySqlStorage;
pub use sqlite::SqliteStorage;

/// A row of the `expenses` table with the amount normalized to `f64`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseRow {
    pub id: i64,
    pub amount: f64,
    pub description: String,
}

impl TryFrom<ExpenseRow> for Expense {
    type Error = anyhow::Error;

    fn try_from(row: ExpenseRow) -> Res<Self> {
        let id = u64::try_from(row.id)
            .ok()
            .filter(|id| *id > 0)
            .with_context(|| format!("Row has an invalid id {}", row.id))?;
        let amount = Amount::try_from(row.amount)
            .with_context(|| format!("Row {id} has a malformed amount {}", row.amount))?;
        Expense::new(id, amount, row.description)
            .with_context(|| format!("Row {id} does not hold a valid expense"))
    }
}

/// The operations every relational backend supports.
///
/// Each call acquires a connection for its own duration and gives it back before returning,
/// whether it succeeds or fails.
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Creates the database and the `expenses` table if they do not exist. Safe to call repeatedly.
    async fn ensure_initialized(&self) -> Res<()>;

    /// Inserts one expense and returns its newly assigned id.
    async fn add(&self, amount: Amount, description: &str) -> Res<i64>;

    /// Inserts all `items` in a single transaction and returns the number of rows inserted.
    /// An empty slice returns `0` without touching the database.
    async fn add_many(&self, items: &[(Amount, String)]) -> Res<u64>;

    /// Returns every row, ordered by ascending id.
    async fn list_all(&self) -> Res<Vec<ExpenseRow>>;

    /// Returns the sum of all amounts, `0.0` for an empty table.
    async fn total(&self) -> Res<f64>;

    /// Closes the underlying connection pool.
    async fn close(&self);
}

/// Connects to the backend selected by `config` and makes sure the table exists.
pub async fn open(config: &StorageConfig) -> Res<Box<dyn Storage>> {
    let storage: Box<dyn Storage> = match config.backend() {
        Backend::Sqlite => Box::new(SqliteStorage::open(config.sqlite_path()).await?),
        Backend::Mysql => Box::new(MySqlStorage::open(config.mysql().clone()).await?),
    };
    Ok(storage)
}

/// Reads all rows and converts them into validated expenses.
pub(crate) async fn list_expenses(storage: &dyn Storage) -> Res<Vec<Expense>> {
    storage
        .list_all()
        .await?
        .into_iter()
        .map(Expense::try_from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_into_expense() {
        let row = ExpenseRow {
            id: 7,
            amount: 1200.5,
            description: "rent".to_string(),
        };
        let expense = Expense::try_from(row).unwrap();
        assert_eq!(expense.id(), 7);
        assert_eq!(expense.amount().to_string(), "1200.50");
        assert!(expense.is_big());
    }

    #[test]
    fn test_malformed_rows_are_rejected() {
        let zero_id = ExpenseRow {
            id: 0,
            amount: 5.0,
            description: "a".to_string(),
        };
        assert!(Expense::try_from(zero_id).is_err());

        let nan = ExpenseRow {
            id: 1,
            amount: f64::NAN,
            description: "a".to_string(),
        };
        assert!(Expense::try_from(nan).is_err());

        let negative = ExpenseRow {
            id: 1,
            amount: -5.0,
            description: "a".to_string(),
        };
        assert!(Expense::try_from(negative).is_err());
    }
}
