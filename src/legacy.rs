//! The legacy snapshot store.
//!
//! Before relational storage existed, the whole expense list was written to a single file on
//! every change. Nothing writes this format during normal operation anymore; the store is kept so
//! that `migrate-to-sqlite` has something to read from.

use crate::error::Res;
use crate::model::Expense;
use crate::utils;
use anyhow::Context;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads and writes the legacy snapshot file: a JSON array of expenses.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LegacyStore {
    path: PathBuf,
}

impl LegacyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads every expense from the snapshot file. A missing file is an empty snapshot; any other
    /// read or parse failure is an error.
    pub async fn load(&self) -> Res<Vec<Expense>> {
        let Some(content) = utils::read_bytes_if_exists(&self.path).await? else {
            debug!("No legacy snapshot at {}", self.path.display());
            return Ok(Vec::new());
        };
        let expenses: Vec<Expense> = serde_json::from_slice(&content).with_context(|| {
            format!("Failed to parse legacy snapshot at {}", self.path.display())
        })?;
        debug!(
            "Loaded {} expenses from legacy snapshot {}",
            expenses.len(),
            self.path.display()
        );
        Ok(expenses)
    }

    /// Writes the full list of expenses to the snapshot file.
    ///
    /// When `overwrite` is false the file is created exclusively and the call fails if it already
    /// exists.
    pub async fn save(&self, expenses: &[Expense], overwrite: bool) -> Res<()> {
        let json =
            serde_json::to_string_pretty(expenses).context("Failed to serialize expenses")?;
        if overwrite {
            utils::write(&self.path, json).await
        } else {
            utils::write_new(&self.path, json).await
        }
    }
}

/// Returns the smallest positive id not used by any of `expenses`.
pub fn next_id(expenses: &[Expense]) -> u64 {
    let used: BTreeSet<u64> = expenses.iter().map(Expense::id).collect();
    (1..).find(|id| !used.contains(id)).unwrap_or(1)
}
