//! satbook - Personal financial consistency engine
//!
//! This library keeps a small household's finances consistent across three
//! collections: assets (fiat accounts and bitcoin wallets), a ledger of
//! expense/income/transfer records, and loans. Everything at rest is
//! encrypted with a key derived from a passphrase; every write is audited.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path and settings management
//! - `error`: Custom error types
//! - `models`: Core data models (assets, records, loans, money)
//! - `crypto`: Key derivation, AES-256-GCM envelopes, session keys
//! - `storage`: Encrypted JSON document storage and repositories
//! - `audit`: Encrypted append-only audit log
//! - `services`: Business logic (assets, records, price sync, loans)
//! - `amortization`: Loan repayment schedules
//! - `rates`: Exchange-rate source trait
//! - `backup`: Rolling encrypted backups and restore
//!
//! # Example
//!
//! ```rust,ignore
//! use satbook::config::{paths::LedgerPaths, settings::Settings};
//! use satbook::crypto::session::SessionKeys;
//! use satbook::storage::Store;
//!
//! let paths = LedgerPaths::new()?;
//! let mut settings = Settings::load_or_create(&paths)?;
//!
//! let mut keys = SessionKeys::locked();
//! keys.unlock("passphrase", &mut settings)?;
//!
//! let mut store = Store::new(paths)?;
//! store.load_all(keys.require_key()?, settings.bitcoin_balance_policy)?;
//! ```

pub mod amortization;
pub mod audit;
pub mod backup;
pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod rates;
pub mod services;
pub mod storage;

pub use error::{LedgerError, LedgerResult};
pub use rates::RateSource;
pub use storage::Store;
