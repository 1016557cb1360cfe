use crate::commands::{open_storage, Out};
use crate::db;
use crate::error::{ErrorType, IntoResult};
use crate::model::Expense;
use crate::{Config, Result};
use serde::Serialize;

const HEADER: &str = "--ID-- --AMOUNT-- -BIG?- --DESCRIPTION--";
const BIG_MARKER: &str = "(!)";

/// The data behind the `report` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub expenses: Vec<Expense>,
    pub total: f64,
}

/// Lists every expense in a table followed by the total.
///
/// # Errors
///
/// - `ErrorType::Storage` if the backend cannot be read or holds a malformed row.
pub async fn report(config: Config) -> Result<Out<Report>> {
    let storage = open_storage(&config).await?;
    let expenses = db::list_expenses(storage.as_ref()).await;
    let total = storage.total().await;
    storage.close().await;

    let report = Report {
        expenses: expenses.pub_result(ErrorType::Storage)?,
        total: total.pub_result(ErrorType::Storage)?,
    };
    Ok(Out::new(render(&report), report))
}

fn render(report: &Report) -> String {
    if report.expenses.is_empty() {
        return "No expenses recorded yet".to_string();
    }

    let mut lines = Vec::with_capacity(report.expenses.len() + 2);
    lines.push(HEADER.to_string());
    for expense in &report.expenses {
        let big = if expense.is_big() { BIG_MARKER } else { "" };
        lines.push(format!(
            "{:>6} {:>10} {:^6} {}",
            expense.id(),
            expense.amount().to_string(),
            big,
            expense.description()
        ));
    }
    lines.push(format!("Total: {:.2}", report.total));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Storage;
    use crate::model::Amount;
    use crate::test::TestEnv;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_report_empty() {
        let env = TestEnv::new().await;
        let out = report(env.config()).await.unwrap();
        assert_eq!(out.message(), "No expenses recorded yet");
        assert_eq!(out.structure().unwrap().total, 0.0);
    }

    #[tokio::test]
    async fn test_report_table() {
        let env = TestEnv::new().await;
        let storage = env.storage().await;
        storage
            .add(Amount::from_str("50").unwrap(), "coffee")
            .await
            .unwrap();
        storage
            .add(Amount::from_str("1200").unwrap(), "laptop")
            .await
            .unwrap();
        storage.close().await;

        let out = report(env.config()).await.unwrap();

        let expected = [
            HEADER,
            "     1      50.00        coffee",
            "     2    1200.00  (!)   laptop",
            "Total: 1250.00",
        ]
        .join("\n");
        assert_eq!(out.message(), expected);

        let data = out.structure().unwrap();
        assert_eq!(data.expenses.len(), 2);
        assert!(data.expenses[1].is_big());
        assert_eq!(data.total, 1250.0);
    }
}
