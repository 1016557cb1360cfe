use crate::commands::Out;
use crate::migrate::{self, Migration};
use crate::{Config, Result};

/// Moves the legacy snapshot into the configured relational backend and archives it.
///
/// # Errors
///
/// See `migrate::run`.
pub async fn migrate_to_sqlite(config: Config) -> Result<Out<Migration>> {
    let outcome = migrate::run(&config.legacy(), &config.backup(), config.storage()).await?;

    let message = match &outcome {
        Migration::NothingToMigrate => format!(
            "Nothing to migrate, {} is empty or missing",
            config.legacy_path().display()
        ),
        Migration::Migrated {
            count,
            backup: Some(path),
        } => format!(
            "Migrated {count} records to {}, the snapshot was moved to {}",
            config.storage().backend(),
            path.display()
        ),
        Migration::Migrated { count, backup: None } => format!(
            "Migrated {count} records to {}",
            config.storage().backend()
        ),
    };
    Ok(Out::new(message, outcome))
}
