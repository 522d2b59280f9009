//! Backup manager for satbook
//!
//! Handles rolling encrypted backups with configurable retention. A backup
//! is a single `.sbk` file: a plaintext outer JSON container carrying a
//! marker, a format version, and one encrypted payload that seals the full
//! data set. Nothing about the ledger contents is readable without the key.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::settings::BackupRetention;
use crate::crypto::encryption::{encrypt_string, EncryptedData};
use crate::crypto::key_derivation::DerivedKey;
use crate::error::{LedgerError, LedgerResult};
use crate::models::asset::Asset;
use crate::models::loan::Loan;
use crate::models::record::LedgerRecord;
use crate::storage::Store;

/// Marker string identifying a satbook backup container
pub const BACKUP_MARKER: &str = "satbook-backup";

/// Container format version this build reads and writes
pub const BACKUP_FILE_VERSION: u8 = 1;

/// File extension for backup files
pub const BACKUP_EXTENSION: &str = "sbk";

/// Plaintext outer container of a backup file
#[derive(Debug, Serialize, Deserialize)]
pub struct BackupFile {
    /// Identifies the file as a satbook backup
    pub marker: String,
    /// Container format version
    pub version: u8,
    /// The encrypted archive
    pub payload: EncryptedData,
}

/// Decrypted backup payload: a full copy of the data set
#[derive(Debug, Serialize, Deserialize)]
pub struct BackupArchive {
    /// Schema version for migration support
    pub schema_version: u32,
    /// When the backup was created
    pub created_at: DateTime<Utc>,
    /// All assets
    pub assets: Vec<Asset>,
    /// All ledger records
    pub records: Vec<LedgerRecord>,
    /// All loans
    pub loans: Vec<Loan>,
}

/// Where a created backup landed
#[derive(Debug, Clone)]
pub struct BackupLocation {
    /// Full path to the backup file
    pub path: PathBuf,
    /// Backup filename
    pub filename: String,
}

/// Metadata about an existing backup
#[derive(Debug, Clone)]
pub struct BackupInfo {
    /// Backup filename
    pub filename: String,
    /// Full path to the backup file
    pub path: PathBuf,
    /// Creation time parsed from the filename
    pub created_at: DateTime<Utc>,
    /// Size in bytes
    pub size_bytes: u64,
}

/// Manages backup creation and retention
pub struct BackupManager {
    backup_dir: PathBuf,
    retention: BackupRetention,
}

impl BackupManager {
    /// Create a new BackupManager
    pub fn new(backup_dir: PathBuf, retention: BackupRetention) -> Self {
        Self {
            backup_dir,
            retention,
        }
    }

    /// Snapshot the store into a new backup file
    pub fn create_backup(&self, store: &Store, key: &DerivedKey) -> LedgerResult<BackupLocation> {
        fs::create_dir_all(&self.backup_dir)
            .map_err(|e| LedgerError::Io(format!("Failed to create backup directory: {}", e)))?;

        let now = Utc::now();
        let archive = BackupArchive {
            schema_version: 1,
            created_at: now,
            assets: store.assets.get_all(),
            records: store.records.get_all(),
            loans: store.loans.get_all(),
        };

        let plaintext = serde_json::to_string(&archive)
            .map_err(|e| LedgerError::Json(format!("Failed to serialize backup: {}", e)))?;
        let payload = encrypt_string(&plaintext, key)?;

        let container = BackupFile {
            marker: BACKUP_MARKER.to_string(),
            version: BACKUP_FILE_VERSION,
            payload,
        };

        let filename = format!(
            "{}-{}.{}",
            BACKUP_MARKER,
            now.format("%Y%m%d-%H%M%S"),
            BACKUP_EXTENSION
        );
        let path = self.backup_dir.join(&filename);

        let json = serde_json::to_string_pretty(&container)
            .map_err(|e| LedgerError::Json(format!("Failed to serialize backup: {}", e)))?;
        fs::write(&path, json)
            .map_err(|e| LedgerError::Io(format!("Failed to write backup file: {}", e)))?;

        Ok(BackupLocation { path, filename })
    }

    /// List all available backups, newest first
    pub fn list_backups(&self) -> LedgerResult<Vec<BackupInfo>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();

        for entry in fs::read_dir(&self.backup_dir)
            .map_err(|e| LedgerError::Io(format!("Failed to read backup directory: {}", e)))?
        {
            let entry = entry
                .map_err(|e| LedgerError::Io(format!("Failed to read directory entry: {}", e)))?;

            let path = entry.path();
            if path
                .extension()
                .map_or(false, |ext| ext == BACKUP_EXTENSION)
            {
                if let Some(info) = parse_backup_info(&path) {
                    backups.push(info);
                }
            }
        }

        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(backups)
    }

    /// Enforce the retention policy by deleting old backups
    ///
    /// Keeps the newest `daily_count` backups, plus the newest backup in
    /// each of the most recent `monthly_count` calendar months that have
    /// any backup at all. Everything else is deleted.
    pub fn apply_retention(&self) -> LedgerResult<Vec<PathBuf>> {
        let backups = self.list_backups()?;

        let mut keep: HashSet<PathBuf> = backups
            .iter()
            .take(self.retention.daily_count as usize)
            .map(|b| b.path.clone())
            .collect();

        // Newest-first order means the first backup seen in a month is the
        // one to keep for that month.
        let mut months_seen: Vec<(i32, u32)> = Vec::new();
        for backup in &backups {
            let month = (backup.created_at.year(), backup.created_at.month());
            if months_seen.contains(&month) {
                continue;
            }
            if months_seen.len() >= self.retention.monthly_count as usize {
                break;
            }
            months_seen.push(month);
            keep.insert(backup.path.clone());
        }

        let mut deleted = Vec::new();
        for backup in backups {
            if keep.contains(&backup.path) {
                continue;
            }
            fs::remove_file(&backup.path)
                .map_err(|e| LedgerError::Io(format!("Failed to delete old backup: {}", e)))?;
            deleted.push(backup.path);
        }

        Ok(deleted)
    }

    /// Create a backup and then enforce the retention policy
    pub fn create_backup_with_retention(
        &self,
        store: &Store,
        key: &DerivedKey,
    ) -> LedgerResult<(BackupLocation, Vec<PathBuf>)> {
        let location = self.create_backup(store, key)?;
        let deleted = self.apply_retention()?;
        Ok((location, deleted))
    }

    /// Get the most recent backup
    pub fn latest_backup(&self) -> LedgerResult<Option<BackupInfo>> {
        let backups = self.list_backups()?;
        Ok(backups.into_iter().next())
    }

    /// Get the backup directory path
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }
}

/// Parse backup metadata from a backup file path
fn parse_backup_info(path: &Path) -> Option<BackupInfo> {
    let filename = path.file_name()?.to_string_lossy().to_string();

    let prefix = format!("{}-", BACKUP_MARKER);
    let suffix = format!(".{}", BACKUP_EXTENSION);
    let date_part = filename.strip_prefix(&prefix)?.strip_suffix(&suffix)?;
    let created_at = parse_backup_timestamp(date_part)?;

    let metadata = fs::metadata(path).ok()?;

    Some(BackupInfo {
        filename,
        path: path.to_path_buf(),
        created_at,
        size_bytes: metadata.len(),
    })
}

/// Parse a backup timestamp from the filename date part (YYYYMMDD-HHMMSS)
fn parse_backup_timestamp(date_str: &str) -> Option<DateTime<Utc>> {
    let (date_part, time_part) = date_str.split_once('-')?;
    if date_part.len() != 8 || time_part.len() != 6 {
        return None;
    }

    let year: i32 = date_part[0..4].parse().ok()?;
    let month: u32 = date_part[4..6].parse().ok()?;
    let day: u32 = date_part[6..8].parse().ok()?;
    let hour: u32 = time_part[0..2].parse().ok()?;
    let minute: u32 = time_part[2..4].parse().ok()?;
    let second: u32 = time_part[4..6].parse().ok()?;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = chrono::NaiveTime::from_hms_opt(hour, minute, second)?;
    let datetime = chrono::NaiveDateTime::new(date, time);

    Some(DateTime::from_naive_utc_and_offset(datetime, Utc))
}
