use crate::error::Res;
use crate::model::Amount;
use anyhow::{ensure, Context};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Expenses at or above this amount are considered big.
pub const BIG_EXPENSE: Decimal = Decimal::ONE_THOUSAND;

/// A single recorded expense.
///
/// Construction validates that the amount is strictly positive; an `Expense` is never mutated
/// afterwards. The description is accepted as given, emptiness is rejected by the relational
/// schema rather than here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ExpenseRecord")]
pub struct Expense {
    id: u64,
    amount: Amount,
    description: String,
}

impl Expense {
    /// Creates a validated expense.
    ///
    /// # Errors
    /// - Returns an error if `amount` is zero or negative.
    pub fn new(id: u64, amount: Amount, description: impl Into<String>) -> Res<Self> {
        ensure!(
            amount.is_positive(),
            "amount must be strictly positive, got {amount}"
        );
        Ok(Self {
            id,
            amount,
            description: description.into(),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// True when the amount is at or above [`BIG_EXPENSE`].
    pub fn is_big(&self) -> bool {
        self.amount.value() >= BIG_EXPENSE
    }

    /// The literal form printed by `export-python`, e.g.
    /// `Expense(id=1, amount=50.00, description='coffee')`. The description is quoted the way
    /// Python's `repr` quotes a string.
    pub fn literal(&self) -> String {
        format!(
            "Expense(id={}, amount={}, description={})",
            self.id,
            self.amount,
            quote(&self.description)
        )
    }
}

/// Single quotes unless the text holds a `'` and no `"`. Control characters become `\xNN`.
fn quote(text: &str) -> String {
    let delimiter = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push(delimiter);
    for c in text.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c == delimiter => {
                quoted.push('\\');
                quoted.push(c);
            }
            c if c.is_control() => quoted.push_str(&format!("\\x{:02x}", u32::from(c))),
            c => quoted.push(c),
        }
    }
    quoted.push(delimiter);
    quoted
}

impl Display for Expense {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let big = if self.is_big() { " (!)" } else { "" };
        write!(f, "#{} {}{} {}", self.id, self.amount, big, self.description)
    }
}

/// The unvalidated shape of an expense as it appears in a serialized legacy snapshot.
#[derive(Deserialize)]
struct ExpenseRecord {
    id: u64,
    amount: Amount,
    description: String,
}

impl TryFrom<ExpenseRecord> for Expense {
    type Error = anyhow::Error;

    fn try_from(record: ExpenseRecord) -> Res<Self> {
        Expense::new(record.id, record.amount, record.description)
            .with_context(|| format!("Invalid expense with id {}", record.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn amount(s: &str) -> Amount {
        Amount::from_str(s).unwrap()
    }

    #[test]
    fn test_rejects_non_positive_amounts() {
        for s in ["0", "0.00", "-0.01", "-50", "-1000"] {
            let err = Expense::new(1, amount(s), "x").unwrap_err();
            assert!(
                err.to_string().contains("amount must be strictly positive"),
                "{s}: {err}"
            );
        }
    }

    #[test]
    fn test_accepts_positive_amounts() {
        for s in ["0.01", "1", "50", "999.99", "1000", "123456.78"] {
            let expense = Expense::new(1, amount(s), "x").unwrap();
            assert_eq!(expense.amount(), amount(s));
        }
    }

    #[test]
    fn test_empty_description_is_accepted() {
        let expense = Expense::new(3, amount("5"), "").unwrap();
        assert_eq!(expense.description(), "");
    }

    #[test]
    fn test_is_big() {
        assert!(!Expense::new(1, amount("999.99"), "tv").unwrap().is_big());
        assert!(Expense::new(1, amount("1000"), "tv").unwrap().is_big());
        assert!(Expense::new(1, amount("1000.01"), "tv").unwrap().is_big());
    }

    #[test]
    fn test_equality_by_value() {
        let a = Expense::new(1, amount("5"), "a").unwrap();
        let b = Expense::new(1, amount("5.00"), "a").unwrap();
        let c = Expense::new(2, amount("5"), "a").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_display() {
        let small = Expense::new(4, amount("50"), "coffee").unwrap();
        assert_eq!(small.to_string(), "#4 50.00 coffee");
        let big = Expense::new(5, amount("1500"), "laptop").unwrap();
        assert_eq!(big.to_string(), "#5 1500.00 (!) laptop");
    }

    #[test]
    fn test_literal() {
        let expense = Expense::new(1, amount("50"), "coffee").unwrap();
        assert_eq!(
            expense.literal(),
            "Expense(id=1, amount=50.00, description='coffee')"
        );
    }

    #[test]
    fn test_literal_quoting() {
        let literal = |d: &str| Expense::new(2, amount("3.5"), d).unwrap().literal();
        assert_eq!(
            literal(r#"coffee "to go""#),
            r#"Expense(id=2, amount=3.50, description='coffee "to go"')"#
        );
        assert_eq!(
            literal("Joe's"),
            r#"Expense(id=2, amount=3.50, description="Joe's")"#
        );
        assert_eq!(
            literal(r#"it's "hot""#),
            r#"Expense(id=2, amount=3.50, description='it\'s "hot"')"#
        );
        assert_eq!(
            literal("bell\u{7}\ttab\\"),
            r#"Expense(id=2, amount=3.50, description='bell\x07\ttab\\')"#
        );
        assert_eq!(
            literal("caf\u{e9} \u{85}"),
            "Expense(id=2, amount=3.50, description='caf\u{e9} \\x85')"
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Expense =
            serde_json::from_str(r#"{"id": 1, "amount": "5", "description": "a"}"#).unwrap();
        assert_eq!(ok, Expense::new(1, amount("5"), "a").unwrap());

        let json = r#"{"id": 2, "amount": "0", "description": "b"}"#;
        let bad = serde_json::from_str::<Expense>(json);
        assert!(bad.is_err());
    }
}
