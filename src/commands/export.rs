use crate::commands::{open_storage, Out};
use crate::db;
use crate::error::{ErrorType, IntoResult};
use crate::model::Expense;
use crate::{Config, Result};

/// Prints every expense in its literal form, one per line, e.g.
/// `Expense(id=1, amount=50.00, description='coffee')`.
///
/// # Errors
///
/// - `ErrorType::Storage` if the backend cannot be read or holds a malformed row.
pub async fn export_python(config: Config) -> Result<Out<Vec<Expense>>> {
    let storage = open_storage(&config).await?;
    let listed = db::list_expenses(storage.as_ref()).await;
    storage.close().await;
    let expenses = listed.pub_result(ErrorType::Storage)?;

    let message = expenses
        .iter()
        .map(Expense::literal)
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Out::new(message, expenses))
}
