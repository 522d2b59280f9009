//! Path management for satbook
//!
//! Resolves where the encrypted documents, backups, and audit log live.
//!
//! ## Path Resolution Order
//!
//! 1. `SATBOOK_DATA_DIR` environment variable (if set)
//! 2. Platform app-data directory via `directories::ProjectDirs`
//!    (e.g., `~/.local/share/satbook` on Linux)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::LedgerError;

/// Manages all paths used by satbook
#[derive(Debug, Clone)]
pub struct LedgerPaths {
    /// Base directory for all satbook data
    base_dir: PathBuf,
}

impl LedgerPaths {
    /// Create a new LedgerPaths instance
    ///
    /// Path resolution:
    /// 1. `SATBOOK_DATA_DIR` env var (explicit override)
    /// 2. Platform data directory via `ProjectDirs`
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, LedgerError> {
        let base_dir = if let Ok(custom) = std::env::var("SATBOOK_DATA_DIR") {
            PathBuf::from(custom)
        } else {
            let dirs = ProjectDirs::from("", "", "satbook").ok_or_else(|| {
                LedgerError::Config("Could not determine a data directory".into())
            })?;
            dirs.data_dir().to_path_buf()
        };

        Ok(Self { base_dir })
    }

    /// Create LedgerPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory holding the encrypted documents
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the backup directory
    pub fn backup_dir(&self) -> PathBuf {
        self.base_dir.join("backups")
    }

    /// Get the path to the settings file (plaintext, no financial data)
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("settings.json")
    }

    /// Get the path to the encrypted audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Get the path to the assets document
    pub fn assets_file(&self) -> PathBuf {
        self.data_dir().join("assets.json")
    }

    /// Get the path to the ledger records document
    pub fn records_file(&self) -> PathBuf {
        self.data_dir().join("records.json")
    }

    /// Get the path to the loans document
    pub fn loans_file(&self) -> PathBuf {
        self.data_dir().join("loans.json")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), LedgerError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| LedgerError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| LedgerError::Io(format!("Failed to create data directory: {}", e)))?;

        std::fs::create_dir_all(self.backup_dir())
            .map_err(|e| LedgerError::Io(format!("Failed to create backup directory: {}", e)))?;

        Ok(())
    }

    /// Check if satbook has been initialized (settings file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}
