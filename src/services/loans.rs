//! Loan service
//!
//! CRUD over loans plus schedule queries. Changes to the financial terms
//! re-run the derived-field refresh so the cached payment and interest
//! figures always match the terms on disk.

use chrono::NaiveDate;

use crate::amortization::{self, ScheduleEntry};
use crate::audit::EntityKind;
use crate::crypto::session::KeyProvider;
use crate::error::{LedgerError, LedgerResult};
use crate::models::ids::{AssetId, LoanId};
use crate::models::loan::{Loan, RepaymentType};
use crate::models::money::Amount;
use crate::storage::Store;

/// Input for a new loan
#[derive(Debug, Clone)]
pub struct LoanInput {
    pub name: String,
    pub institution: String,
    pub principal: Amount,
    pub annual_rate: f64,
    pub term_months: u32,
    pub start_date: NaiveDate,
    pub repayment: RepaymentType,
    pub repayment_day: Option<u32>,
    pub interest_payment_day: Option<u32>,
    pub linked_asset_id: Option<AssetId>,
    pub memo: Option<String>,
}

/// Partial update for a loan
#[derive(Debug, Clone, Default)]
pub struct LoanPatch {
    pub name: Option<String>,
    pub institution: Option<String>,
    pub principal: Option<Amount>,
    pub annual_rate: Option<f64>,
    pub term_months: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub repayment: Option<RepaymentType>,
    pub paid_months: Option<u32>,
    pub repayment_day: Option<Option<u32>>,
    pub interest_payment_day: Option<Option<u32>>,
    pub linked_asset_id: Option<Option<AssetId>>,
    pub memo: Option<Option<String>>,
}

/// Service for loan operations
pub struct LoanService<'a> {
    store: &'a mut Store,
    keys: &'a dyn KeyProvider,
}

impl<'a> LoanService<'a> {
    /// Create a new loan service
    pub fn new(store: &'a mut Store, keys: &'a dyn KeyProvider) -> Self {
        Self { store, keys }
    }

    /// Create a loan
    ///
    /// `paid_months` is seeded from the elapsed time between the start date
    /// and today; the user maintains it afterwards.
    pub fn create_loan(&mut self, input: LoanInput, today: NaiveDate) -> LedgerResult<Loan> {
        let key = self.keys.require_key()?;

        let mut loan = Loan::new(
            input.name,
            input.institution,
            input.principal,
            input.annual_rate,
            input.term_months,
            input.start_date,
            input.repayment,
        );
        loan.repayment_day = input.repayment_day;
        loan.interest_payment_day = input.interest_payment_day;
        loan.linked_asset_id = input.linked_asset_id;
        loan.memo = input.memo;
        loan.paid_months = amortization::paid_months_since(input.start_date, today)
            .min(input.term_months);

        loan.validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        self.store.loans.upsert(loan.clone());
        self.store.loans.save(key)?;
        self.store.log_create(
            key,
            EntityKind::Loan,
            loan.id.to_string(),
            Some(loan.name.clone()),
        )?;

        Ok(loan)
    }

    /// Update a loan
    ///
    /// Always refreshes the cached derived fields; a patch that only touches
    /// descriptive fields recomputes to the same values.
    pub fn update_loan(&mut self, id: LoanId, patch: LoanPatch) -> LedgerResult<Loan> {
        let key = self.keys.require_key()?;

        let mut loan = self
            .store
            .loans
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::loan_not_found(id.to_string()))?;

        if let Some(name) = patch.name {
            loan.name = name;
        }
        if let Some(institution) = patch.institution {
            loan.institution = institution;
        }
        if let Some(principal) = patch.principal {
            loan.principal = principal;
        }
        if let Some(rate) = patch.annual_rate {
            loan.annual_rate = rate;
        }
        if let Some(term) = patch.term_months {
            loan.term_months = term;
        }
        if let Some(start) = patch.start_date {
            loan.start_date = start;
        }
        if let Some(repayment) = patch.repayment {
            loan.repayment = repayment;
        }
        if let Some(paid) = patch.paid_months {
            loan.paid_months = paid.min(loan.term_months);
        }
        if let Some(day) = patch.repayment_day {
            loan.repayment_day = day;
        }
        if let Some(day) = patch.interest_payment_day {
            loan.interest_payment_day = day;
        }
        if let Some(linked) = patch.linked_asset_id {
            loan.linked_asset_id = linked;
        }
        if let Some(memo) = patch.memo {
            loan.memo = memo;
        }

        loan.validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;
        loan.refresh_derived();

        self.store.loans.upsert(loan.clone());
        self.store.loans.save(key)?;
        self.store.log_update(
            key,
            EntityKind::Loan,
            id.to_string(),
            Some(loan.name.clone()),
            None,
        )?;

        Ok(loan)
    }

    /// Delete a loan
    pub fn delete_loan(&mut self, id: LoanId) -> LedgerResult<Loan> {
        let key = self.keys.require_key()?;

        let loan = self
            .store
            .loans
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::loan_not_found(id.to_string()))?;

        self.store.loans.delete(id);
        self.store.loans.save(key)?;
        self.store.log_delete(
            key,
            EntityKind::Loan,
            id.to_string(),
            Some(loan.name.clone()),
        )?;

        Ok(loan)
    }

    /// Get a loan by ID
    pub fn get(&self, id: LoanId) -> LedgerResult<Loan> {
        self.store
            .loans
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::loan_not_found(id.to_string()))
    }

    /// List all loans, sorted by name
    pub fn list(&self) -> Vec<Loan> {
        self.store.loans.get_all()
    }

    /// Full repayment schedule for a loan
    pub fn schedule_for(&self, id: LoanId) -> LedgerResult<Vec<ScheduleEntry>> {
        Ok(self.get(id)?.schedule())
    }

    /// Whole months of the loan elapsed as of `today`, capped at the term
    pub fn paid_months(&self, id: LoanId, today: NaiveDate) -> LedgerResult<u32> {
        let loan = self.get(id)?;
        Ok(amortization::paid_months_since(loan.start_date, today).min(loan.term_months))
    }

    /// Principal still owed as of `today`
    pub fn remaining_principal(&self, id: LoanId, today: NaiveDate) -> LedgerResult<Amount> {
        let loan = self.get(id)?;
        let paid = amortization::paid_months_since(loan.start_date, today).min(loan.term_months);
        Ok(loan.remaining_principal(paid))
    }
}
