use budget_tracker::args::{Args, Command};
use budget_tracker::{commands, Config, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

// Commands run one after another against a single connection, so one thread is enough.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let config = Config::load(args.common().budget_home(), args.common().overrides()).await?;
    debug!("Using {:?}", config.storage());

    let _: () = match args.command() {
        Command::Add(add_args) => commands::add(
            config,
            add_args.amount(),
            add_args.description().to_string(),
        )
        .await?
        .print(),

        Command::Report => commands::report(config).await?.print(),

        Command::ImportCsv(import_args) => commands::import_csv(config, import_args.file())
            .await?
            .print(),

        Command::ExportPython => commands::export_python(config).await?.print(),

        Command::MigrateToSqlite => commands::migrate_to_sqlite(config).await?.print(),
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use the given level for this package only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level,
                env!("CARGO_CRATE_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
