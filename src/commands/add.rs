use crate::commands::{open_storage, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{Amount, Expense};
use crate::{Config, Result};
use tracing::info;

/// Records one expense.
///
/// The expense is validated before any connection is made, so an invalid amount never reaches
/// the database.
///
/// # Returns
///
/// On success, returns an `Out` containing the id assigned by the backend.
///
/// # Errors
///
/// - `ErrorType::Validation` if `amount` is not strictly positive.
/// - `ErrorType::Storage` if the backend cannot be reached or rejects the row.
pub async fn add(config: Config, amount: Amount, description: String) -> Result<Out<i64>> {
    // Id 0 is a placeholder, the backend assigns the real one.
    let expense = Expense::new(0, amount, description).pub_result(ErrorType::Validation)?;

    let storage = open_storage(&config).await?;
    let added = storage
        .add(expense.amount(), expense.description())
        .await;
    storage.close().await;
    let id = added.pub_result(ErrorType::Storage)?;

    info!("Added expense {id}");
    let message = format!(
        "Added expense {} '{}' (id={id})",
        expense.amount(),
        expense.description()
    );
    Ok(Out::new(message, id))
}
