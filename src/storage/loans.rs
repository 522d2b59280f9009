//! Loan repository
//!
//! Loads and saves the encrypted loans document.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::crypto::key_derivation::DerivedKey;
use crate::error::LedgerError;
use crate::models::ids::LoanId;
use crate::models::loan::Loan;

use super::document::{load_document, save_document};

/// Serializable loans document
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct LoanData {
    loans: Vec<Loan>,
}

/// Repository for loan persistence
pub struct LoanRepository {
    path: PathBuf,
    data: HashMap<LoanId, Loan>,
}

impl LoanRepository {
    /// Create a new loan repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: HashMap::new(),
        }
    }

    /// Load loans from disk
    pub fn load(&mut self, key: &DerivedKey) -> Result<(), LedgerError> {
        let file_data: LoanData = load_document(&self.path, key)?;

        self.data.clear();
        for loan in file_data.loans {
            self.data.insert(loan.id, loan);
        }

        Ok(())
    }

    /// Save loans to disk
    pub fn save(&self, key: &DerivedKey) -> Result<(), LedgerError> {
        let file_data = LoanData {
            loans: self.data.values().cloned().collect(),
        };
        save_document(&self.path, &file_data, key)
    }

    /// Get a loan by ID
    pub fn get(&self, id: LoanId) -> Option<&Loan> {
        self.data.get(&id)
    }

    /// Get all loans, sorted by name
    pub fn get_all(&self) -> Vec<Loan> {
        let mut loans: Vec<_> = self.data.values().cloned().collect();
        loans.sort_by(|a, b| a.name.cmp(&b.name));
        loans
    }

    /// Insert or update a loan
    pub fn upsert(&mut self, loan: Loan) {
        self.data.insert(loan.id, loan);
    }

    /// Delete a loan, returning whether it existed
    pub fn delete(&mut self, id: LoanId) -> bool {
        self.data.remove(&id).is_some()
    }

    /// Check if a loan exists
    pub fn exists(&self, id: LoanId) -> bool {
        self.data.contains_key(&id)
    }

    /// Replace the whole collection (restore path)
    pub fn replace(&mut self, loans: Vec<Loan>) {
        self.data.clear();
        for loan in loans {
            self.data.insert(loan.id, loan);
        }
    }

    /// Count loans
    pub fn count(&self) -> usize {
        self.data.len()
    }
}
