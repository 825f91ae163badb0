use std::{
    fmt::Display,
    ops::Mul,
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

//--------------------------------------     Currency       ----------------------------------------------------------
/// A 3-letter ISO-4217 style currency code. Stored inline so that [`Money`] stays `Copy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Currency([u8; 3]);

#[derive(Debug, Clone, Error)]
#[error("Invalid currency code: {0}")]
pub struct CurrencyError(String);

impl Currency {
    pub const USD: Currency = Currency(*b"USD");

    pub fn as_str(&self) -> &str {
        // Constructed from validated ASCII uppercase only.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl FromStr for Currency {
    type Err = CurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(|b| b.is_ascii_uppercase()) {
            return Err(CurrencyError(s.to_string()));
        }
        Ok(Currency([bytes[0], bytes[1], bytes[2]]))
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Currency {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

//--------------------------------------       Money        ----------------------------------------------------------
/// A monetary amount in integer minor units (e.g. cents), tagged with its currency.
///
/// Arithmetic between two `Money` values requires matching currencies; a mismatch is an error,
/// never a silent coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: i64,
    currency: Currency,
}

#[derive(Debug, Clone, Error)]
pub enum MoneyError {
    #[error("Currency mismatch: {0} vs {1}")]
    CurrencyMismatch(Currency, Currency),
    #[error("Amount overflow on {0} operation")]
    Overflow(&'static str),
}

impl Money {
    pub fn new(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self { amount: 0, currency }
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_negative(&self) -> bool {
        self.amount < 0
    }

    pub fn checked_add(self, rhs: Money) -> Result<Money, MoneyError> {
        if self.currency != rhs.currency {
            return Err(MoneyError::CurrencyMismatch(self.currency, rhs.currency));
        }
        let amount = self.amount.checked_add(rhs.amount).ok_or(MoneyError::Overflow("add"))?;
        Ok(Money { amount, currency: self.currency })
    }

    pub fn checked_sub(self, rhs: Money) -> Result<Money, MoneyError> {
        if self.currency != rhs.currency {
            return Err(MoneyError::CurrencyMismatch(self.currency, rhs.currency));
        }
        let amount = self.amount.checked_sub(rhs.amount).ok_or(MoneyError::Overflow("sub"))?;
        Ok(Money { amount, currency: self.currency })
    }
}

impl Mul<i64> for Money {
    type Output = Money;

    fn mul(self, rhs: i64) -> Self::Output {
        Money { amount: self.amount.saturating_mul(rhs), currency: self.currency }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let major = self.amount / 100;
        let minor = (self.amount % 100).abs();
        write!(f, "{major}.{minor:02} {}", self.currency)
    }
}
