mod money;

pub mod helpers;

pub use money::{Currency, CurrencyError, Money, MoneyError};
