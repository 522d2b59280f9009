//! Core data models for satbook
//!
//! This module contains the data structures that represent the ledger
//! domain: assets, ledger records, loans, and the shared money and ID
//! primitives.

pub mod asset;
pub mod ids;
pub mod loan;
pub mod money;
pub mod record;

pub use asset::{
    Asset, AssetValidationError, BalanceAdjustment, BitcoinAsset, BitcoinBalancePolicy, FiatAsset,
    Overdraft, WalletKind,
};
pub use ids::{AssetId, CardId, LoanId, RecordId};
pub use loan::{Loan, LoanValidationError, RepaymentType};
pub use money::{krw_value_of_sats, sats_from_krw, Amount, Currency, SATS_PER_BTC};
pub use record::{LedgerRecord, PaymentMethod, RecordKind, RecordValidationError};
