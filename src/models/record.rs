//! Ledger record model
//!
//! Expense, income, and transfer records with a currency-conversion snapshot
//! captured at creation time. A record's face amount is in the unit of its
//! `currency`; `sats_equivalent` and `snapshot_rate` pin the conversion to
//! the rate observed at the record's date, never the live rate.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AssetId, CardId, RecordId};
use super::money::{Amount, Currency};

/// How an expense was paid or an income received
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Bank transfer
    Bank,
    /// Credit/debit card (settles against the card, not an asset)
    Card,
    /// Physical cash
    Cash,
    /// Lightning payment
    Lightning,
    /// On-chain payment
    Onchain,
}

impl PaymentMethod {
    /// Whether this method moves money out of (or into) a tracked asset
    ///
    /// Card and cash records are informational only; they never drive a
    /// balance adjustment.
    pub const fn settles_against_asset(&self) -> bool {
        matches!(self, Self::Bank | Self::Lightning | Self::Onchain)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bank => write!(f, "bank"),
            Self::Card => write!(f, "card"),
            Self::Cash => write!(f, "cash"),
            Self::Lightning => write!(f, "lightning"),
            Self::Onchain => write!(f, "onchain"),
        }
    }
}

/// Kind-specific fields of a ledger record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecordKind {
    Expense {
        /// Spending category (e.g., "groceries")
        category: String,
        payment_method: PaymentMethod,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        linked_asset_id: Option<AssetId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        card_id: Option<CardId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        installment_months: Option<u32>,
    },
    Income {
        /// Income source (e.g., "salary")
        source: String,
        deposit_method: PaymentMethod,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        linked_asset_id: Option<AssetId>,
    },
    Transfer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from_asset_id: Option<AssetId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to_asset_id: Option<AssetId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to_card_id: Option<CardId>,
    },
}

impl RecordKind {
    /// Kind name for display and audit summaries
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Expense { .. } => "expense",
            Self::Income { .. } => "income",
            Self::Transfer { .. } => "transfer",
        }
    }
}

/// A single ledger record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Unique identifier
    pub id: RecordId,

    /// Calendar day the record is dated to
    pub date: NaiveDate,

    /// Face amount in the unit of `currency`
    pub amount: Amount,

    /// Unit of the face amount
    pub currency: Currency,

    /// Free-form note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,

    /// KRW-per-BTC rate captured at creation (historical, not live)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_rate: Option<f64>,

    /// Value of this record in satoshis at the snapshot rate
    ///
    /// Equals `amount` for SATS records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sats_equivalent: Option<Amount>,

    /// True exactly when the snapshot lookup failed at creation and has not
    /// yet been repaired by a price-sync pass
    #[serde(default)]
    pub needs_price_sync: bool,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last modified
    pub updated_at: DateTime<Utc>,

    /// Expense/income/transfer specifics
    #[serde(flatten)]
    pub kind: RecordKind,
}

impl LedgerRecord {
    /// Create a record with an unresolved snapshot
    ///
    /// The snapshot fields start empty; the recorder fills them in during
    /// snapshot resolution.
    pub fn new(date: NaiveDate, amount: Amount, currency: Currency, kind: RecordKind) -> Self {
        let now = Utc::now();
        Self {
            id: RecordId::new(),
            date,
            amount,
            currency,
            memo: None,
            snapshot_rate: None,
            sats_equivalent: None,
            needs_price_sync: false,
            created_at: now,
            updated_at: now,
            kind,
        }
    }

    /// Asset this record settles against, if any
    ///
    /// Some only for expense/income records that carry a linked asset and a
    /// method that settles against one. Transfers never settle.
    pub fn settles_against(&self) -> Option<AssetId> {
        match &self.kind {
            RecordKind::Expense {
                payment_method,
                linked_asset_id: Some(id),
                ..
            } if payment_method.settles_against_asset() => Some(*id),
            RecordKind::Income {
                deposit_method,
                linked_asset_id: Some(id),
                ..
            } if deposit_method.settles_against_asset() => Some(*id),
            _ => None,
        }
    }

    /// True for income records (balance delta is positive)
    pub fn is_inflow(&self) -> bool {
        matches!(self.kind, RecordKind::Income { .. })
    }

    /// Validate the record
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if !self.amount.is_positive() {
            return Err(RecordValidationError::NonPositiveAmount);
        }
        match &self.kind {
            RecordKind::Expense { category, .. } => {
                if category.trim().is_empty() {
                    return Err(RecordValidationError::EmptyCategory);
                }
            }
            RecordKind::Income { source, .. } => {
                if source.trim().is_empty() {
                    return Err(RecordValidationError::EmptySource);
                }
            }
            RecordKind::Transfer {
                from_asset_id,
                to_asset_id,
                to_card_id,
            } => {
                if from_asset_id.is_none() && to_asset_id.is_none() && to_card_id.is_none() {
                    return Err(RecordValidationError::TransferWithoutEndpoint);
                }
                if to_asset_id.is_some() && to_card_id.is_some() {
                    return Err(RecordValidationError::TransferDoubleDestination);
                }
                if from_asset_id.is_some() && *from_asset_id == *to_asset_id {
                    return Err(RecordValidationError::TransferSameEndpoints);
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for LedgerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.date,
            self.kind.name(),
            self.amount,
            self.currency
        )
    }
}

/// Validation errors for ledger records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    NonPositiveAmount,
    EmptyCategory,
    EmptySource,
    TransferWithoutEndpoint,
    TransferDoubleDestination,
    TransferSameEndpoints,
}

impl fmt::Display for RecordValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount => write!(f, "Amount must be positive"),
            Self::EmptyCategory => write!(f, "Expense category cannot be empty"),
            Self::EmptySource => write!(f, "Income source cannot be empty"),
            Self::TransferWithoutEndpoint => {
                write!(f, "Transfer needs at least one endpoint")
            }
            Self::TransferDoubleDestination => {
                write!(f, "Transfer cannot target both an asset and a card")
            }
            Self::TransferSameEndpoints => {
                write!(f, "Transfer endpoints must be distinct")
            }
        }
    }
}

impl std::error::Error for RecordValidationError {}
