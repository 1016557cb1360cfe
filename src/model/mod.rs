//! Types that represent the core data model: `Expense` and its `Amount`.
mod amount;
mod expense;

pub use amount::{Amount, AmountError};
pub use expense::{Expense, BIG_EXPENSE};
