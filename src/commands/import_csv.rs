use crate::commands::{open_storage, Out};
use crate::db::Storage;
use crate::error::{Error, ErrorType, IntoResult};
use crate::model::{Amount, Expense};
use crate::{utils, Config, Result};
use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// One line of the input file. Fields stay textual so that a bad amount can be reported with
/// its row number instead of as a generic deserialization failure.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    amount: String,
    description: String,
}

/// Imports expenses from a CSV file with the header `amount,description`.
///
/// Rows are validated and inserted one at a time, in file order. The first bad row stops the
/// import; rows before it remain committed.
///
/// # Returns
///
/// On success, returns an `Out` containing the number of imported rows.
///
/// # Errors
///
/// - `ErrorType::Import` if the file cannot be read, or a row is malformed or has a missing or
///   non-numeric amount.
/// - `ErrorType::Validation` if a row's amount is not strictly positive.
/// - `ErrorType::Storage` if the backend cannot be reached or rejects a row.
pub async fn import_csv(config: Config, path: &Path) -> Result<Out<usize>> {
    let content = utils::read_if_exists(path)
        .await
        .pub_result(ErrorType::Import)?
        .ok_or_else(|| anyhow!("CSV file {} does not exist", path.display()))
        .pub_result(ErrorType::Import)?;

    let storage = open_storage(&config).await?;
    let imported = import_rows(&content, storage.as_ref()).await;
    storage.close().await;
    let count = imported?;
    info!("Imported {count} expenses from {}", path.display());

    Ok(Out::new(
        format!("Imported {count} expenses from {}", path.display()),
        count,
    ))
}

async fn import_rows(content: &str, storage: &dyn Storage) -> Result<usize> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let mut count = 0;
    for (ix, result) in reader.deserialize::<CsvRecord>().enumerate() {
        let row = ix + 1;
        let record = result
            .with_context(|| format!("Unable to read CSV row {row}"))
            .pub_result(ErrorType::Import)?;
        let expense = parse_record(row, record)?;
        storage
            .add(expense.amount(), expense.description())
            .await
            .with_context(|| format!("Unable to store CSV row {row}"))
            .pub_result(ErrorType::Storage)?;
        debug!("Imported CSV row {row}: {expense}");
        count += 1;
    }
    Ok(count)
}

fn parse_record(row: usize, record: CsvRecord) -> Result<Expense> {
    let text = record.amount.trim();
    if text.is_empty() {
        return Err(Error::new(
            ErrorType::Import,
            anyhow!("CSV row {row} has no amount"),
        ));
    }
    let amount = Amount::from_str(text)
        .with_context(|| format!("CSV row {row} has a non-numeric amount '{text}'"))
        .pub_result(ErrorType::Import)?;
    Expense::new(0, amount, record.description)
        .with_context(|| format!("CSV row {row} is invalid"))
        .pub_result(ErrorType::Validation)
}
