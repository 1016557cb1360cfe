//! Command handlers for the budget CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod add;
mod export;
mod import_csv;
mod migrate;
mod report;

use crate::db::{self, Storage};
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Debug;
use tracing::debug;

pub use add::add;
pub use export::export_python;
pub use import_csv::import_csv;
pub use migrate::migrate_to_sqlite;
pub use report::{report, Report};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to stdout and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        if !self.message.is_empty() {
            println!("{}", self.message);
        }
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Opens the configured backend, classifying failures as storage errors.
async fn open_storage(config: &Config) -> Result<Box<dyn Storage>> {
    db::open(config.storage())
        .await
        .pub_result(ErrorType::Storage)
}
