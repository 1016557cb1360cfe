//! These structs provide the CLI interface for the budget CLI.

use crate::config::{Backend, Overrides};
use crate::model::Amount;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;

/// budget: A command-line tool for tracking personal expenses.
///
/// Expenses are kept in a SQLite database under the budget home, or in a MySQL database when
/// `--backend mysql` is selected. Data from the old single-file format can be moved over once
/// with `migrate-to-sqlite`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Record an expense.
    Add(AddArgs),
    /// Print every expense in a table, followed by the total.
    Report,
    /// Import expenses from a CSV file with the header `amount,description`.
    ///
    /// Rows are inserted in order. The first bad row stops the import, rows before it are kept.
    ImportCsv(ImportCsvArgs),
    /// Print every expense in its literal form, one per line.
    ExportPython,
    /// Move the expenses from the legacy `budget.db` snapshot into the relational backend.
    ///
    /// On success the snapshot is renamed to `budget.pkl.bak`. The command refuses to run if that
    /// backup already exists.
    MigrateToSqlite,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory holding `budget.db`, `config.json` and the `data/` directory.
    #[arg(long, env = "BUDGET_HOME", default_value = ".")]
    budget_home: PathBuf,

    /// The storage backend. Defaults to the one in `config.json`, or sqlite.
    #[arg(long, env = "BUDGET_BACKEND", value_enum)]
    backend: Option<Backend>,

    /// MySQL host. [default: localhost]
    #[arg(long, env = "DB_HOST")]
    db_host: Option<String>,

    /// MySQL port. [default: 3306]
    #[arg(long, env = "DB_PORT")]
    db_port: Option<u16>,

    /// MySQL user. [default: root]
    #[arg(long, env = "DB_USER")]
    db_user: Option<String>,

    /// MySQL password. [default: empty]
    #[arg(long, env = "DB_PASS", hide_env_values = true)]
    db_pass: Option<String>,

    /// MySQL database name, created if it does not exist. [default: budget]
    #[arg(long, env = "DB_NAME")]
    db_name: Option<String>,
}

impl Common {
    pub fn new(log_level: LevelFilter, budget_home: impl Into<PathBuf>) -> Self {
        Self {
            log_level,
            budget_home: budget_home.into(),
            backend: None,
            db_host: None,
            db_port: None,
            db_user: None,
            db_pass: None,
            db_name: None,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn budget_home(&self) -> &Path {
        &self.budget_home
    }

    /// The storage settings given on the command line or in the environment.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            backend: self.backend,
            db_host: self.db_host.clone(),
            db_port: self.db_port,
            db_user: self.db_user.clone(),
            db_pass: self.db_pass.clone(),
            db_name: self.db_name.clone(),
        }
    }
}

/// Args for the `budget add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// The amount spent, e.g. 12.50. Must be greater than zero.
    #[arg(allow_negative_numbers = true)]
    amount: Amount,

    /// What the money was spent on.
    description: String,
}

impl AddArgs {
    pub fn new(amount: Amount, description: impl Into<String>) -> Self {
        Self {
            amount,
            description: description.into(),
        }
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Args for the `budget import-csv` command.
#[derive(Debug, Parser, Clone)]
pub struct ImportCsvArgs {
    /// The CSV file to read.
    file: PathBuf,
}

impl ImportCsvArgs {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_add() {
        let args = Args::try_parse_from(["budget", "add", "12.50", "lunch"]).unwrap();
        match args.command() {
            Command::Add(add) => {
                assert_eq!(add.amount(), Amount::from_str("12.5").unwrap());
                assert_eq!(add.description(), "lunch");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_negative_amount_reaches_validation() {
        let args = Args::try_parse_from(["budget", "add", "-5", "refund"]).unwrap();
        let Command::Add(add) = args.command() else {
            panic!("expected add");
        };
        assert!(!add.amount().is_positive());
    }

    #[test]
    fn test_parse_bad_amount() {
        assert!(Args::try_parse_from(["budget", "add", "abc", "lunch"]).is_err());
    }

    #[test]
    fn test_parse_common() {
        let args = Args::try_parse_from([
            "budget",
            "--budget-home",
            "/tmp/budget",
            "--backend",
            "mysql",
            "--db-port",
            "3307",
            "--log-level",
            "debug",
            "import-csv",
            "in.csv",
        ])
        .unwrap();

        let common = args.common();
        assert_eq!(common.budget_home(), Path::new("/tmp/budget"));
        assert_eq!(common.log_level(), LevelFilter::DEBUG);
        let overrides = common.overrides();
        assert_eq!(overrides.backend, Some(Backend::Mysql));
        assert_eq!(overrides.db_port, Some(3307));
        assert!(matches!(
            args.command(),
            Command::ImportCsv(a) if a.file() == Path::new("in.csv")
        ));
    }

    #[test]
    fn test_parse_unit_commands() {
        for (name, expected) in [
            ("report", "Report"),
            ("export-python", "ExportPython"),
            ("migrate-to-sqlite", "MigrateToSqlite"),
        ] {
            let args = Args::try_parse_from(["budget", name]).unwrap();
            assert_eq!(format!("{:?}", args.command()), expected);
        }
    }
}
