//! Storage layer for satbook
//!
//! Encrypted JSON documents with atomic writes, plus the audit log. The
//! `Store` is the single writer; services borrow it mutably and go
//! through its repositories and audit helpers.

pub mod assets;
pub mod document;
pub mod loans;
pub mod records;

pub use assets::AssetRepository;
pub use document::{load_document, save_document};
pub use loans::LoanRepository;
pub use records::RecordRepository;

use crate::audit::{AuditEntry, AuditLog, EntityKind};
use crate::config::paths::LedgerPaths;
use crate::crypto::key_derivation::DerivedKey;
use crate::error::LedgerError;
use crate::models::asset::{BalanceAdjustment, BitcoinBalancePolicy};
use crate::models::ids::AssetId;

/// Main storage coordinator that provides access to all repositories
pub struct Store {
    paths: LedgerPaths,
    pub assets: AssetRepository,
    pub records: RecordRepository,
    pub loans: LoanRepository,
    audit: AuditLog,
}

impl Store {
    /// Create a new Store instance
    pub fn new(paths: LedgerPaths) -> Result<Self, LedgerError> {
        paths.ensure_directories()?;

        Ok(Self {
            assets: AssetRepository::new(paths.assets_file()),
            records: RecordRepository::new(paths.records_file()),
            loans: LoanRepository::new(paths.loans_file()),
            audit: AuditLog::new(paths.audit_log()),
            paths,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &LedgerPaths {
        &self.paths
    }

    /// Get the audit log
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Load all data from disk
    ///
    /// Runs the asset floor repair; when anything had to be repaired the
    /// repaired document is written straight back so disk matches memory.
    /// Returns the repaired asset ids.
    pub fn load_all(
        &mut self,
        key: &DerivedKey,
        policy: BitcoinBalancePolicy,
    ) -> Result<Vec<AssetId>, LedgerError> {
        let repaired = self.assets.load(key, policy)?;
        self.records.load(key)?;
        self.loans.load(key)?;

        if !repaired.is_empty() {
            self.assets.save(key)?;
        }

        Ok(repaired)
    }

    /// Save all data to disk
    pub fn save_all(&self, key: &DerivedKey) -> Result<(), LedgerError> {
        self.assets.save(key)?;
        self.records.save(key)?;
        self.loans.save(key)?;
        Ok(())
    }

    /// Record a create operation in the audit log
    pub fn log_create(
        &self,
        key: &DerivedKey,
        entity: EntityKind,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
    ) -> Result<(), LedgerError> {
        self.audit
            .append(&AuditEntry::create(entity, entity_id, entity_name), key)
    }

    /// Record an update operation in the audit log
    pub fn log_update(
        &self,
        key: &DerivedKey,
        entity: EntityKind,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        summary: Option<String>,
    ) -> Result<(), LedgerError> {
        self.audit.append(
            &AuditEntry::update(entity, entity_id, entity_name, summary),
            key,
        )
    }

    /// Record a delete operation in the audit log
    pub fn log_delete(
        &self,
        key: &DerivedKey,
        entity: EntityKind,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
    ) -> Result<(), LedgerError> {
        self.audit
            .append(&AuditEntry::delete(entity, entity_id, entity_name), key)
    }

    /// Record a balance adjustment in the audit log
    pub fn log_adjust(
        &self,
        key: &DerivedKey,
        adjustment: &BalanceAdjustment,
        entity_name: Option<String>,
    ) -> Result<(), LedgerError> {
        let summary = format!(
            "requested {}, applied {}, balance {}{}",
            adjustment.requested_delta,
            adjustment.actual_delta,
            adjustment.new_balance,
            if adjustment.clamped { " (clamped)" } else { "" }
        );
        self.audit.append(
            &AuditEntry::adjust(adjustment.asset_id.to_string(), entity_name, summary),
            key,
        )
    }

    /// Record a restore from backup in the audit log
    pub fn log_restore(&self, key: &DerivedKey, summary: String) -> Result<(), LedgerError> {
        self.audit.append(&AuditEntry::restore(summary), key)
    }
}
