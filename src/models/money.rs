//! Amount type for representing monetary quantities
//!
//! Internally stores amounts as whole smallest units (i64): won for fiat
//! entries and satoshis for bitcoin entries. Neither unit subdivides, so no
//! fractional representation is needed and floating-point drift stays out of
//! stored balances.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Satoshis per bitcoin, the fixed-point scale for wallet balances
pub const SATS_PER_BTC: i64 = 100_000_000;

/// A monetary quantity in whole smallest units (won or satoshis)
///
/// The unit is contextual: fiat assets and KRW records count won, bitcoin
/// assets and SATS records count satoshis. i64 covers both ranges with room
/// to spare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Create an amount from a raw unit count
    pub const fn new(units: i64) -> Self {
        Self(units)
    }

    /// Create a zero amount
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Get the raw unit count
    pub const fn units(&self) -> i64 {
        self.0
    }

    /// Check if the amount is zero
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Check if the amount is positive
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Check if the amount is negative
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Get the absolute value
    pub const fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Clamp the amount so it does not fall below `floor`
    pub const fn max(self, floor: Amount) -> Self {
        if self.0 < floor.0 {
            floor
        } else {
            self
        }
    }

    /// Parse an amount from a string
    ///
    /// Accepts digit strings with optional grouping commas or underscores and
    /// an optional leading sign: "30000", "1,000,000", "-450_000".
    pub fn parse(s: &str) -> Result<Self, AmountParseError> {
        let s = s.trim();

        let (negative, s) = if let Some(stripped) = s.strip_prefix('-') {
            (true, stripped)
        } else {
            (false, s.strip_prefix('+').unwrap_or(s))
        };

        let digits: String = s.chars().filter(|c| *c != ',' && *c != '_').collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(AmountParseError::InvalidFormat(s.to_string()));
        }

        let units: i64 = digits
            .parse()
            .map_err(|_| AmountParseError::InvalidFormat(s.to_string()))?;

        Ok(Self(if negative { -units } else { units }))
    }

    /// Format with thousands separators: 1234567 -> "1,234,567"
    pub fn grouped(&self) -> String {
        let raw = self.0.abs().to_string();
        let mut out = String::with_capacity(raw.len() + raw.len() / 3 + 1);
        if self.0 < 0 {
            out.push('-');
        }
        for (i, c) in raw.chars().enumerate() {
            out.push(c);
            let remaining = raw.len() - i - 1;
            if remaining > 0 && remaining % 3 == 0 {
                out.push(',');
            }
        }
        out
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.grouped())
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |acc, m| acc + m)
    }
}

/// Currency of a ledger record's face amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// South Korean won
    Krw,
    /// Satoshis (1e-8 BTC)
    Sats,
}

impl Currency {
    /// True for fiat currencies
    pub const fn is_fiat(&self) -> bool {
        matches!(self, Currency::Krw)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Krw => write!(f, "KRW"),
            Currency::Sats => write!(f, "SATS"),
        }
    }
}

/// Convert a won amount to satoshis at `rate` (KRW per BTC), flooring
///
/// Flooring keeps derived sats conservative: the engine never credits more
/// satoshis than the won amount actually bought. Returns `None` for rates
/// that cannot price anything (zero, negative, NaN, infinite).
pub fn sats_from_krw(krw: Amount, rate: f64) -> Option<Amount> {
    if !rate.is_finite() || rate <= 0.0 {
        return None;
    }
    let sats = (krw.units() as f64 / rate * SATS_PER_BTC as f64).floor();
    Some(Amount::new(sats as i64))
}

/// Value of a satoshi amount in won at `rate` (KRW per BTC), rounded
///
/// Display-side conversion; rounding (not flooring) because nothing is
/// credited from this figure.
pub fn krw_value_of_sats(sats: Amount, rate: f64) -> Option<Amount> {
    if !rate.is_finite() || rate < 0.0 {
        return None;
    }
    let krw = (sats.units() as f64 / SATS_PER_BTC as f64 * rate).round();
    Some(Amount::new(krw as i64))
}

/// Error type for amount parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmountParseError {
    InvalidFormat(String),
}

impl fmt::Display for AmountParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountParseError::InvalidFormat(s) => write!(f, "Invalid amount format: {}", s),
        }
    }
}

impl std::error::Error for AmountParseError {}
