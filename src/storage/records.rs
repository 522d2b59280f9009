//! Ledger record repository
//!
//! Loads and saves the encrypted records document and answers the two
//! queries the services need: records waiting on a price snapshot and
//! records touching a given asset.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::crypto::key_derivation::DerivedKey;
use crate::error::LedgerError;
use crate::models::ids::{AssetId, RecordId};
use crate::models::record::{LedgerRecord, RecordKind};

use super::document::{load_document, save_document};

/// Serializable records document
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct RecordData {
    records: Vec<LedgerRecord>,
}

/// Repository for ledger record persistence
pub struct RecordRepository {
    path: PathBuf,
    data: HashMap<RecordId, LedgerRecord>,
}

impl RecordRepository {
    /// Create a new record repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: HashMap::new(),
        }
    }

    /// Load records from disk
    pub fn load(&mut self, key: &DerivedKey) -> Result<(), LedgerError> {
        let file_data: RecordData = load_document(&self.path, key)?;

        self.data.clear();
        for record in file_data.records {
            self.data.insert(record.id, record);
        }

        Ok(())
    }

    /// Save records to disk
    pub fn save(&self, key: &DerivedKey) -> Result<(), LedgerError> {
        let file_data = RecordData {
            records: self.data.values().cloned().collect(),
        };
        save_document(&self.path, &file_data, key)
    }

    /// Get a record by ID
    pub fn get(&self, id: RecordId) -> Option<&LedgerRecord> {
        self.data.get(&id)
    }

    /// Get all records, newest date first (ties broken by creation time)
    pub fn get_all(&self) -> Vec<LedgerRecord> {
        let mut records: Vec<_> = self.data.values().cloned().collect();
        records.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then(b.created_at.cmp(&a.created_at))
        });
        records
    }

    /// Records whose snapshot lookup failed and has not been repaired,
    /// oldest date first
    pub fn pending_price_sync(&self) -> Vec<LedgerRecord> {
        let mut records: Vec<_> = self
            .data
            .values()
            .filter(|r| r.needs_price_sync)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        records
    }

    /// Records that reference a given asset (linked or transfer endpoint)
    pub fn for_asset(&self, asset_id: AssetId) -> Vec<LedgerRecord> {
        let mut records: Vec<_> = self
            .data
            .values()
            .filter(|r| match &r.kind {
                RecordKind::Expense { linked_asset_id, .. }
                | RecordKind::Income { linked_asset_id, .. } => {
                    *linked_asset_id == Some(asset_id)
                }
                RecordKind::Transfer {
                    from_asset_id,
                    to_asset_id,
                    ..
                } => *from_asset_id == Some(asset_id) || *to_asset_id == Some(asset_id),
            })
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        records
    }

    /// Insert or update a record
    pub fn upsert(&mut self, record: LedgerRecord) {
        self.data.insert(record.id, record);
    }

    /// Delete a record, returning whether it existed
    pub fn delete(&mut self, id: RecordId) -> bool {
        self.data.remove(&id).is_some()
    }

    /// Check if a record exists
    pub fn exists(&self, id: RecordId) -> bool {
        self.data.contains_key(&id)
    }

    /// Replace the whole collection (restore path)
    pub fn replace(&mut self, records: Vec<LedgerRecord>) {
        self.data.clear();
        for record in records {
            self.data.insert(record.id, record);
        }
    }

    /// Count records
    pub fn count(&self) -> usize {
        self.data.len()
    }
}
