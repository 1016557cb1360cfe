//! Archival of the legacy snapshot after a successful migration.
//!
//! The snapshot is never deleted. It is renamed to a fixed backup filename, and an existing
//! backup is never replaced.

use crate::error::Res;
use crate::utils;
use anyhow::bail;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The filename the legacy snapshot is renamed to once it has been migrated.
pub const LEGACY_BACKUP: &str = "budget.pkl.bak";

/// The outcome of [`Backup::archive`].
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Archived {
    /// The source was renamed to the contained path.
    Moved(PathBuf),
    /// There was no source file, nothing was done.
    Missing,
}

/// Raised when the backup destination already exists.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BackupExists(pub PathBuf);

impl std::fmt::Display for BackupExists {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "The backup file '{}' already exists. Move or remove it and run the migration again",
            self.0.display()
        )
    }
}

impl std::error::Error for BackupExists {}

/// Moves a source file to its backup location.
///
/// The `Backup` struct is immutable and owns copies of the paths it needs. Create one via
/// `Config::backup()` or `Backup::new()`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Backup {
    source: PathBuf,
    destination: PathBuf,
}

impl Backup {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Fails with [`BackupExists`] if the destination is already taken.
    pub async fn check_destination(&self) -> Res<()> {
        if utils::exists(&self.destination).await? {
            bail!(BackupExists(self.destination.clone()));
        }
        Ok(())
    }

    /// Renames the source to the destination.
    ///
    /// - Returns `Archived::Missing` if the source does not exist.
    /// - Fails with [`BackupExists`] if the destination exists.
    pub async fn archive(&self) -> Res<Archived> {
        if !utils::exists(&self.source).await? {
            debug!(
                "Nothing to archive, {} does not exist",
                self.source.display()
            );
            return Ok(Archived::Missing);
        }
        self.check_destination().await?;
        utils::rename(&self.source, &self.destination).await?;
        debug!(
            "Archived {} to {}",
            self.source.display(),
            self.destination.display()
        );
        Ok(Archived::Moved(self.destination.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_archive_moves_the_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("budget.db");
        let destination = dir.path().join(LEGACY_BACKUP);
        std::fs::write(&source, "[]").unwrap();

        let archived = Backup::new(&source, &destination).archive().await.unwrap();

        assert_eq!(archived, Archived::Moved(destination.clone()));
        assert!(!source.exists());
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_archive_missing_source_is_skipped() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join(LEGACY_BACKUP);
        let backup = Backup::new(dir.path().join("budget.db"), &destination);

        assert_eq!(backup.archive().await.unwrap(), Archived::Missing);
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_archive_refuses_to_overwrite_backup() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("budget.db");
        let destination = dir.path().join(LEGACY_BACKUP);
        std::fs::write(&source, "new").unwrap();
        std::fs::write(&destination, "old").unwrap();

        let err = Backup::new(&source, &destination)
            .archive()
            .await
            .unwrap_err();

        assert!(err.downcast_ref::<BackupExists>().is_some());
        assert_eq!(std::fs::read_to_string(&source).unwrap(), "new");
        assert_eq!(std::fs::read_to_string(&destination).unwrap(), "old");
    }
}
