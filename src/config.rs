//! Configuration handling for the budget tracker.
//!
//! Everything lives in the budget home directory (`$BUDGET_HOME`, the current directory by
//! default):
//!
//! - `budget.db` is the legacy snapshot
//! - `budget.pkl.bak` is where the legacy snapshot goes after migration
//! - `data/budget.sqlite3` is the SQLite database
//! - `config.json` is optional and supplies defaults for the storage backend
//!
//! Values given on the command line or through the environment win over `config.json`, which
//! wins over the built-in defaults.

use crate::backup::{Backup, LEGACY_BACKUP};
use crate::error::{ErrorType, IntoResult, Res};
use crate::legacy::LegacyStore;
use crate::{utils, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "budget";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const LEGACY_SNAPSHOT: &str = "budget.db";
const SQLITE_DIR: &str = "data";
const SQLITE_FILE: &str = "budget.sqlite3";

const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 3306;
const DEFAULT_DB_USER: &str = "root";
const DEFAULT_DB_NAME: &str = "budget";

/// The relational backend that holds the `expenses` table.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// A local SQLite file in the budget home.
    #[default]
    Sqlite,
    /// A MySQL server.
    Mysql,
}

serde_plain::derive_display_from_serialize!(Backend);
serde_plain::derive_fromstr_from_deserialize!(Backend);

/// Connection parameters for the MySQL backend.
#[derive(Clone, Eq, PartialEq)]
pub struct MySqlConfig {
    host: String,
    port: u16,
    user: String,
    password: String,
    database: String,
}

impl MySqlConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            database: database.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

impl Default for MySqlConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_DB_HOST,
            DEFAULT_DB_PORT,
            DEFAULT_DB_USER,
            "",
            DEFAULT_DB_NAME,
        )
    }
}

impl Debug for MySqlConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Everything a storage backend needs to connect. This is handed to `db::open`; the storage layer
/// never reads the environment itself.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StorageConfig {
    backend: Backend,
    sqlite_path: PathBuf,
    mysql: MySqlConfig,
}

impl StorageConfig {
    pub fn new(backend: Backend, sqlite_path: impl Into<PathBuf>, mysql: MySqlConfig) -> Self {
        Self {
            backend,
            sqlite_path: sqlite_path.into(),
            mysql,
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn mysql(&self) -> &MySqlConfig {
        &self.mysql
    }
}

/// Values that take precedence over `config.json`. `None` means "not given".
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Overrides {
    pub backend: Option<Backend>,
    pub db_host: Option<String>,
    pub db_port: Option<u16>,
    pub db_user: Option<String>,
    pub db_pass: Option<String>,
    pub db_name: Option<String>,
}

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to the budget home and from there it loads the optional `config.json`. It provides
/// the paths of the files that are expected in a certain location within the budget home.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    legacy_path: PathBuf,
    legacy_backup_path: PathBuf,
    storage: StorageConfig,
}

impl Config {
    /// This will
    /// - create the budget home if it does not exist and canonicalize it
    /// - load `config.json` if there is one
    /// - merge `overrides`, the file and the defaults into a `StorageConfig`
    pub async fn load(budget_home: impl Into<PathBuf>, overrides: Overrides) -> Result<Self> {
        Self::load_inner(budget_home.into(), overrides)
            .await
            .pub_result(ErrorType::Config)
    }

    async fn load_inner(maybe_relative: PathBuf, overrides: Overrides) -> Res<Self> {
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the budget home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let file = ConfigFile::load(root.join(CONFIG_JSON))
            .await?
            .unwrap_or_default();

        let sqlite_path = match &file.sqlite_path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => root.join(p),
            None => root.join(SQLITE_DIR).join(SQLITE_FILE),
        };

        let section = file.mysql.unwrap_or_default();
        let mysql = MySqlConfig {
            host: overrides
                .db_host
                .or(section.host)
                .unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
            port: overrides.db_port.or(section.port).unwrap_or(DEFAULT_DB_PORT),
            user: overrides
                .db_user
                .or(section.user)
                .unwrap_or_else(|| DEFAULT_DB_USER.to_string()),
            password: overrides.db_pass.or(section.password).unwrap_or_default(),
            database: overrides
                .db_name
                .or(section.database)
                .unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
        };

        let backend = overrides.backend.or(file.backend).unwrap_or_default();

        Ok(Self {
            legacy_path: root.join(LEGACY_SNAPSHOT),
            legacy_backup_path: root.join(LEGACY_BACKUP),
            storage: StorageConfig::new(backend, sqlite_path, mysql),
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn legacy_path(&self) -> &Path {
        &self.legacy_path
    }

    pub fn legacy_backup_path(&self) -> &Path {
        &self.legacy_backup_path
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    /// The legacy snapshot store in this budget home.
    pub fn legacy(&self) -> LegacyStore {
        LegacyStore::new(&self.legacy_path)
    }

    /// Moves the legacy snapshot to its backup filename.
    pub fn backup(&self) -> Backup {
        Backup::new(&self.legacy_path, &self.legacy_backup_path)
    }
}

/// Represents the serialization format of the optional configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "budget",
///   "config_version": 1,
///   "backend": "mysql",
///   "mysql": {
///     "host": "db.example.com",
///     "port": 3306,
///     "user": "budget",
///     "database": "budget"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "budget"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// The backend used when neither `--backend` nor `BUDGET_BACKEND` is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    backend: Option<Backend>,

    /// Path to the SQLite file, relative to the budget home or absolute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sqlite_path: Option<PathBuf>,

    /// MySQL connection defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mysql: Option<MySqlSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
struct MySqlSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    database: Option<String>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            backend: None,
            sqlite_path: None,
            mysql: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from `path`. Returns `None` if there is no file.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed, or if its `app_name` or
    /// `config_version` is wrong.
    async fn load(path: impl AsRef<Path>) -> Res<Option<Self>> {
        let path = path.as_ref();
        let Some(content) = utils::read_if_exists(path).await? else {
            return Ok(None);
        };

        let config: ConfigFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version == CONFIG_VERSION,
            "Unsupported config_version in config file: expected {}, got {}",
            CONFIG_VERSION,
            config.config_version
        );

        Ok(Some(config))
    }
}
