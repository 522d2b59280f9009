//! User settings for satbook
//!
//! Holds encryption parameters, backup retention, and the bitcoin
//! balance policy. The settings file is the only plaintext file satbook
//! writes and it never contains financial data.

use serde::{Deserialize, Serialize};

use super::paths::LedgerPaths;
use crate::crypto::encryption::EncryptedData;
use crate::crypto::key_derivation::KeyDerivationParams;
use crate::error::LedgerError;
use crate::models::asset::BitcoinBalancePolicy;

/// Backup retention settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRetention {
    /// Number of daily backups to keep
    pub daily_count: u32,
    /// Number of monthly backups to keep
    pub monthly_count: u32,
}

impl Default for BackupRetention {
    fn default() -> Self {
        Self {
            daily_count: 30,
            monthly_count: 12,
        }
    }
}

/// Encryption settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EncryptionSettings {
    /// Key derivation parameters (salt, memory cost, etc.)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_params: Option<KeyDerivationParams>,

    /// Known marker sealed under the key; decrypting it back proves a
    /// passphrase without storing any derivative of the passphrase
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<EncryptedData>,
}

impl EncryptionSettings {
    /// Whether a passphrase has been set up
    pub fn is_initialized(&self) -> bool {
        self.key_params.is_some() && self.verification.is_some()
    }
}

/// User settings for satbook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Encryption parameters and passphrase verification
    #[serde(default)]
    pub encryption: EncryptionSettings,

    /// Backup retention policy
    #[serde(default)]
    pub backup_retention: BackupRetention,

    /// How bitcoin balances respond to over-large withdrawals
    #[serde(default)]
    pub bitcoin_balance_policy: BitcoinBalancePolicy,
}

fn default_schema_version() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            encryption: EncryptionSettings::default(),
            backup_retention: BackupRetention::default(),
            bitcoin_balance_policy: BitcoinBalancePolicy::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &LedgerPaths) -> Result<Self, LedgerError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| LedgerError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents)
                .map_err(|e| LedgerError::Config(format!("Failed to parse settings file: {}", e)))?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &LedgerPaths) -> Result<(), LedgerError> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| LedgerError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(&settings_path, contents)
            .map_err(|e| LedgerError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
