//! Encrypted document I/O with atomic writes
//!
//! Every data document on disk is a JSON envelope (`EncryptedData`) whose
//! ciphertext is the JSON of the typed collection. Writes go through a
//! temp file, fsync, and rename so a crash leaves either the old document
//! or the new one, never a torn file.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::crypto::encryption::{decrypt_string, encrypt_string, EncryptedData};
use crate::crypto::key_derivation::DerivedKey;
use crate::error::{LedgerError, LedgerResult};

/// Load and decrypt a document, returning a default value when the file
/// does not exist or cannot be read back as the expected shape.
///
/// An envelope with an unsupported format version is the one failure that
/// propagates as a hard error rather than falling back to a default.
pub fn load_document<T, P>(path: P, key: &DerivedKey) -> LedgerResult<T>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| LedgerError::Storage(format!("Failed to read {}: {}", path.display(), e)))?;

    let envelope: EncryptedData = match serde_json::from_str(&contents) {
        Ok(envelope) => envelope,
        Err(_) => return Ok(T::default()),
    };

    let plaintext = match decrypt_string(&envelope, key) {
        Ok(plaintext) => plaintext,
        Err(LedgerError::UnsupportedVersion(v)) => {
            return Err(LedgerError::UnsupportedVersion(v))
        }
        Err(_) => return Ok(T::default()),
    };

    match serde_json::from_str(&plaintext) {
        Ok(data) => Ok(data),
        Err(_) => Ok(T::default()),
    }
}

/// Encrypt and write a document atomically (write to temp, fsync, rename)
pub fn save_document<T, P>(path: P, data: &T, key: &DerivedKey) -> LedgerResult<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            LedgerError::Storage(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let plaintext = serde_json::to_string(data)
        .map_err(|e| LedgerError::Storage(format!("Failed to serialize document: {}", e)))?;

    let envelope = encrypt_string(&plaintext, key)?;

    let temp_path = path.with_extension("json.tmp");

    let file = File::create(&temp_path)
        .map_err(|e| LedgerError::Storage(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &envelope)
        .map_err(|e| LedgerError::Storage(format!("Failed to write envelope: {}", e)))?;

    writer
        .flush()
        .map_err(|e| LedgerError::Storage(format!("Failed to flush data: {}", e)))?;

    // Sync to disk before rename
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| LedgerError::Storage(format!("Failed to sync data: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        LedgerError::Storage(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}
