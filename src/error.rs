//! Error types for the public boundary of the crate.
//!
//! Internal code works with `anyhow` (`Res<T>`) and attaches context as it goes. Anything leaving
//! the crate through `commands` or `Config` is converted into an [`Error`] that carries an
//! [`ErrorType`] so callers (and tests) can tell a validation problem from a storage failure.

use std::fmt::{Debug, Display, Formatter};

/// Result type used internally.
pub(crate) type Res<T> = anyhow::Result<T>;

/// Result type returned by the public API.
pub type Result<T> = std::result::Result<T, Error>;

/// The classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// An expense was rejected before anything was written, e.g. `amount <= 0`.
    Validation,
    /// The relational backend failed: connection, constraint violation or malformed row.
    Storage,
    /// A CSV file could not be read or one of its rows is malformed.
    Import,
    /// Archiving the legacy snapshot would overwrite an existing backup.
    MigrationConflict,
    /// The legacy snapshot exists but cannot be read or parsed.
    Snapshot,
    /// The budget home or its configuration file is unusable.
    Config,
}

impl Display for ErrorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorType::Validation => "validation error",
            ErrorType::Storage => "storage error",
            ErrorType::Import => "import error",
            ErrorType::MigrationConflict => "migration conflict",
            ErrorType::Snapshot => "legacy snapshot error",
            ErrorType::Config => "configuration error",
        };
        f.write_str(s)
    }
}

/// The public error type. It wraps the `anyhow` chain that produced it.
pub struct Error {
    kind: ErrorType,
    source: anyhow::Error,
}

impl Error {
    pub fn new(kind: ErrorType, source: impl Into<anyhow::Error>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorType {
        self.kind
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:?}", self.kind, self.source)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:#}", self.kind, self.source)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

/// Converts an internal result into a public [`Result`] with the given classification.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, kind: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, kind: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(kind, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    #[test]
    fn test_display_includes_kind_and_chain() {
        let res: Res<()> = Err(anyhow!("disk on fire")).context("Unable to open database");
        let err = res.pub_result(ErrorType::Storage).unwrap_err();
        assert_eq!(err.kind(), ErrorType::Storage);
        assert_eq!(
            err.to_string(),
            "storage error: Unable to open database: disk on fire"
        );
    }

    #[test]
    fn test_ok_passes_through() {
        let res: std::result::Result<u8, std::io::Error> = Ok(7);
        assert_eq!(res.pub_result(ErrorType::Import).unwrap(), 7);
    }
}
