pub mod args;
pub mod backup;
pub mod commands;
mod config;
pub mod db;
mod error;
pub mod legacy;
pub mod migrate;
pub mod model;
mod utils;

#[cfg(test)]
mod test;

pub use config::{Backend, Config, MySqlConfig, Overrides, StorageConfig};
pub use error::{Error, ErrorType, Result};
