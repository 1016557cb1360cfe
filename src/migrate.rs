//! The one-shot migration from the legacy snapshot into relational storage.
//!
//! The procedure runs three steps in order:
//!
//! 1. Read the legacy snapshot. An empty or missing snapshot ends the migration successfully
//!    without touching either store.
//! 2. Insert every record into the destination with `Storage::add`. Legacy ids are dropped and
//!    the destination assigns fresh ones. The first failure aborts the migration; rows inserted
//!    before it stay committed.
//! 3. Rename the snapshot to its backup filename.
//!
//! Nothing spans both stores transactionally. If the process dies between steps 2 and 3 the
//! snapshot is still in place and a rerun inserts its records a second time.

use crate::backup::{Archived, Backup, BackupExists};
use crate::config::StorageConfig;
use crate::db::{self, Storage};
use crate::error::{Error, ErrorType, IntoResult};
use crate::legacy::LegacyStore;
use crate::model::Expense;
use crate::Result;
use anyhow::Context;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// What a migration run did.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Migration {
    /// The legacy snapshot was empty or absent.
    NothingToMigrate,
    /// `count` records were inserted. `backup` is where the snapshot went, `None` if it had
    /// already disappeared by the time it was to be archived.
    Migrated {
        count: usize,
        backup: Option<PathBuf>,
    },
}

/// Runs the migration from `legacy` into the backend described by `destination`, archiving the
/// snapshot with `backup`. The destination is only opened once there is something to migrate.
///
/// # Errors
/// - `ErrorType::Snapshot` if the snapshot exists but cannot be read.
/// - `ErrorType::MigrationConflict` if the backup file already exists. This is checked before
///   any record is transferred and again right before the rename.
/// - `ErrorType::Storage` if the destination cannot be opened or an insert fails.
pub async fn run(
    legacy: &LegacyStore,
    backup: &Backup,
    destination: &StorageConfig,
) -> Result<Migration> {
    // Step 1: read
    let expenses = legacy.load().await.pub_result(ErrorType::Snapshot)?;
    if expenses.is_empty() {
        debug!("Legacy snapshot {} is empty", legacy.path().display());
        return Ok(Migration::NothingToMigrate);
    }

    // Refuse early so that a conflict cannot be discovered after the rows are already in.
    backup.check_destination().await.map_err(classify)?;

    let storage = db::open(destination)
        .await
        .pub_result(ErrorType::Storage)?;
    let migrated = migrate_into(legacy, &expenses, storage.as_ref(), backup).await;
    storage.close().await;
    migrated
}

/// Steps 2 and 3 against an already opened `storage`.
pub(crate) async fn migrate_into(
    legacy: &LegacyStore,
    expenses: &[Expense],
    storage: &dyn Storage,
    backup: &Backup,
) -> Result<Migration> {
    // Step 2: transfer
    let total = expenses.len();
    for (ix, expense) in expenses.iter().enumerate() {
        storage
            .add(expense.amount(), expense.description())
            .await
            .with_context(|| {
                format!(
                    "Migration aborted at legacy record {} ({} of {total}); {ix} records were \
                    already migrated",
                    expense.id(),
                    ix + 1
                )
            })
            .pub_result(ErrorType::Storage)?;
    }
    debug!("Transferred {total} legacy records");

    // Step 3: archive
    let archived = backup.archive().await.map_err(classify)?;
    let backup_path = match archived {
        Archived::Moved(path) => Some(path),
        Archived::Missing => {
            warn!(
                "The legacy snapshot {} disappeared before it could be archived",
                legacy.path().display()
            );
            None
        }
    };

    info!(
        "Migrated {total} legacy records from {}",
        legacy.path().display()
    );
    Ok(Migration::Migrated {
        count: total,
        backup: backup_path,
    })
}

/// Archival failures are conflicts when the backup exists, plain snapshot errors otherwise.
fn classify(e: anyhow::Error) -> Error {
    if e.downcast_ref::<BackupExists>().is_some() {
        Error::new(ErrorType::MigrationConflict, e)
    } else {
        Error::new(ErrorType::Snapshot, e)
    }
}
