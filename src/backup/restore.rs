//! Backup restoration for satbook
//!
//! Validation is strict and happens before any state is touched: the
//! extension, marker, container version, decryption, and the full typed
//! parse of the payload must all succeed, or the restore is rejected with
//! `RestoreInvalid` and the store is left exactly as it was.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::crypto::encryption::decrypt_string;
use crate::crypto::key_derivation::DerivedKey;
use crate::error::{LedgerError, LedgerResult};
use crate::storage::Store;

use super::manager::{
    BackupArchive, BackupFile, BACKUP_EXTENSION, BACKUP_FILE_VERSION, BACKUP_MARKER,
};

/// What a validated backup contains
#[derive(Debug, Clone)]
pub struct RestoreReport {
    /// Schema version of the archived data
    pub schema_version: u32,
    /// When the backup was created
    pub created_at: DateTime<Utc>,
    /// Number of assets in the archive
    pub assets: usize,
    /// Number of ledger records in the archive
    pub records: usize,
    /// Number of loans in the archive
    pub loans: usize,
}

impl RestoreReport {
    /// One-line description of the archive contents
    pub fn summary(&self) -> String {
        format!(
            "{} assets, {} records, {} loans from backup taken {}",
            self.assets,
            self.records,
            self.loans,
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

/// Validate a backup file without restoring it
///
/// Any failure along the way maps to `RestoreInvalid`, including a wrong
/// key: an undecryptable backup is indistinguishable from a corrupt one.
pub fn validate_backup(path: &Path, key: &DerivedKey) -> LedgerResult<RestoreReport> {
    let archive = read_archive(path, key)?;
    Ok(report_for(&archive))
}

/// Replace the store's entire data set with the backup contents
///
/// All-or-nothing: the archive is fully validated and parsed first, so a
/// bad file changes nothing in memory or on disk.
pub fn restore_backup(
    store: &mut Store,
    path: &Path,
    key: &DerivedKey,
) -> LedgerResult<RestoreReport> {
    let archive = read_archive(path, key)?;
    let report = report_for(&archive);

    store.assets.replace(archive.assets);
    store.records.replace(archive.records);
    store.loans.replace(archive.loans);
    store.save_all(key)?;
    store.log_restore(key, report.summary())?;

    Ok(report)
}

fn report_for(archive: &BackupArchive) -> RestoreReport {
    RestoreReport {
        schema_version: archive.schema_version,
        created_at: archive.created_at,
        assets: archive.assets.len(),
        records: archive.records.len(),
        loans: archive.loans.len(),
    }
}

/// Read, verify, and decrypt a backup file into a typed archive
fn read_archive(path: &Path, key: &DerivedKey) -> LedgerResult<BackupArchive> {
    if path.extension().map_or(true, |ext| ext != BACKUP_EXTENSION) {
        return Err(LedgerError::RestoreInvalid(format!(
            "not a .{} backup file",
            BACKUP_EXTENSION
        )));
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| LedgerError::RestoreInvalid(format!("cannot read backup file: {}", e)))?;

    let container: BackupFile = serde_json::from_str(&contents)
        .map_err(|e| LedgerError::RestoreInvalid(format!("not a backup container: {}", e)))?;

    if container.marker != BACKUP_MARKER {
        return Err(LedgerError::RestoreInvalid(format!(
            "unrecognized marker: {}",
            container.marker
        )));
    }
    if container.version != BACKUP_FILE_VERSION {
        return Err(LedgerError::RestoreInvalid(format!(
            "unsupported backup version: {}",
            container.version
        )));
    }

    let plaintext = decrypt_string(&container.payload, key)
        .map_err(|e| LedgerError::RestoreInvalid(format!("payload does not decrypt: {}", e)))?;

    serde_json::from_str(&plaintext)
        .map_err(|e| LedgerError::RestoreInvalid(format!("payload is not a valid archive: {}", e)))
}
