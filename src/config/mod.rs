//! Configuration module for satbook
//!
//! Path resolution for the data directory and plaintext user settings
//! (encryption parameters, backup retention, bitcoin balance policy).

pub mod paths;
pub mod settings;

pub use paths::LedgerPaths;
pub use settings::{BackupRetention, EncryptionSettings, Settings};
