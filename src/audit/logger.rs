//! Append-only encrypted audit log
//!
//! Each entry is sealed on its own as an `EncryptedData` envelope and
//! appended as one JSON line, so the log stays append-only and readable
//! line by line without decrypting the whole file.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use crate::crypto::encryption::{decrypt_string, encrypt_string, EncryptedData};
use crate::crypto::key_derivation::DerivedKey;
use crate::error::{LedgerError, LedgerResult};

use super::entry::AuditEntry;

/// Writes and reads the encrypted JSONL audit log
pub struct AuditLog {
    log_path: PathBuf,
}

impl AuditLog {
    /// Create a new AuditLog that writes to the specified path
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append an entry, sealed and flushed immediately
    pub fn append(&self, entry: &AuditEntry, key: &DerivedKey) -> LedgerResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| LedgerError::Io(format!("Failed to open audit log: {}", e)))?;

        let plaintext = serde_json::to_string(entry)
            .map_err(|e| LedgerError::Json(format!("Failed to serialize audit entry: {}", e)))?;
        let envelope = encrypt_string(&plaintext, key)?;
        let line = serde_json::to_string(&envelope)
            .map_err(|e| LedgerError::Json(format!("Failed to serialize audit envelope: {}", e)))?;

        writeln!(file, "{}", line)
            .map_err(|e| LedgerError::Io(format!("Failed to write audit entry: {}", e)))?;

        file.flush()
            .map_err(|e| LedgerError::Io(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }

    /// Read all audit entries, oldest first
    pub fn read_all(&self, key: &DerivedKey) -> LedgerResult<Vec<AuditEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| LedgerError::Io(format!("Failed to open audit log: {}", e)))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                LedgerError::Io(format!(
                    "Failed to read audit log line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let envelope: EncryptedData = serde_json::from_str(&line).map_err(|e| {
                LedgerError::Json(format!(
                    "Failed to parse audit envelope at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;
            let plaintext = decrypt_string(&envelope, key)?;
            let entry: AuditEntry = serde_json::from_str(&plaintext).map_err(|e| {
                LedgerError::Json(format!(
                    "Failed to parse audit entry at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            entries.push(entry);
        }

        Ok(entries)
    }

    /// Read the most recent N entries
    pub fn read_recent(&self, count: usize, key: &DerivedKey) -> LedgerResult<Vec<AuditEntry>> {
        let all_entries = self.read_all(key)?;
        let start = all_entries.len().saturating_sub(count);
        Ok(all_entries[start..].to_vec())
    }

    /// Number of entries in the log
    pub fn entry_count(&self) -> LedgerResult<usize> {
        if !self.log_path.exists() {
            return Ok(0);
        }

        let file = File::open(&self.log_path)
            .map_err(|e| LedgerError::Io(format!("Failed to open audit log: {}", e)))?;

        let reader = BufReader::new(file);
        let count = reader
            .lines()
            .map_while(Result::ok)
            .filter(|l| !l.trim().is_empty())
            .count();

        Ok(count)
    }

    /// Check if the audit log file exists
    pub fn exists(&self) -> bool {
        self.log_path.exists()
    }

    /// Path to the audit log file
    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }
}
