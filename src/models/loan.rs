//! Loan model
//!
//! An installment loan with cached derived figures. The cached fields
//! (`monthly_payment`, `total_interest`) are recomputed from the financial
//! terms whenever those terms change; the schedule itself is derived on
//! demand and never persisted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::amortization;

use super::ids::{AssetId, LoanId};
use super::money::Amount;

/// Repayment policy of a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RepaymentType {
    /// Constant monthly payment (annuity)
    EqualPrincipalAndInterest,
    /// Constant principal component, shrinking payment
    EqualPrincipal,
    /// Interest-only until the final month, which repays the principal
    Bullet,
}

impl fmt::Display for RepaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EqualPrincipalAndInterest => write!(f, "equal principal and interest"),
            Self::EqualPrincipal => write!(f, "equal principal"),
            Self::Bullet => write!(f, "bullet"),
        }
    }
}

/// An installment loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    /// Unique identifier
    pub id: LoanId,

    /// Loan name (e.g., "Jeonse loan")
    pub name: String,

    /// Lending institution
    pub institution: String,

    /// Principal in won
    pub principal: Amount,

    /// Annual interest rate in percent
    pub annual_rate: f64,

    /// Term in months
    pub term_months: u32,

    /// Date the loan started
    pub start_date: NaiveDate,

    /// Repayment policy
    pub repayment: RepaymentType,

    /// Months already paid; user-maintained, seeded from
    /// `amortization::paid_months_since`
    #[serde(default)]
    pub paid_months: u32,

    /// Day of month the payment is due
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repayment_day: Option<u32>,

    /// Day of month interest is due (bullet loans only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_payment_day: Option<u32>,

    /// Asset the payments are drawn from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_asset_id: Option<AssetId>,

    /// Free-form note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,

    /// Cached: first-month payment total
    pub monthly_payment: Amount,

    /// Cached: interest over the full term
    pub total_interest: Amount,

    /// When the loan was created
    pub created_at: DateTime<Utc>,

    /// When the loan was last modified
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// Create a loan with derived fields computed from its terms
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        institution: impl Into<String>,
        principal: Amount,
        annual_rate: f64,
        term_months: u32,
        start_date: NaiveDate,
        repayment: RepaymentType,
    ) -> Self {
        let now = Utc::now();
        let mut loan = Self {
            id: LoanId::new(),
            name: name.into(),
            institution: institution.into(),
            principal,
            annual_rate,
            term_months,
            start_date,
            repayment,
            paid_months: 0,
            repayment_day: None,
            interest_payment_day: None,
            linked_asset_id: None,
            memo: None,
            monthly_payment: Amount::zero(),
            total_interest: Amount::zero(),
            created_at: now,
            updated_at: now,
        };
        loan.refresh_derived();
        loan
    }

    /// Recompute cached figures from the financial terms
    ///
    /// Must run after any change to principal, rate, term, or repayment
    /// type.
    pub fn refresh_derived(&mut self) {
        self.monthly_payment = amortization::monthly_payment(
            self.principal,
            self.annual_rate,
            self.term_months,
            self.repayment,
        );
        self.total_interest = amortization::total_interest(
            self.principal,
            self.annual_rate,
            self.term_months,
            self.repayment,
        );
        self.updated_at = Utc::now();
    }

    /// Full repayment schedule
    pub fn schedule(&self) -> Vec<amortization::ScheduleEntry> {
        amortization::schedule(
            self.principal,
            self.annual_rate,
            self.term_months,
            self.start_date,
            self.repayment,
        )
    }

    /// Date of the final payment
    pub fn end_date(&self) -> NaiveDate {
        amortization::add_months(self.start_date, self.term_months)
    }

    /// Principal still owed after `paid_months` payments of the schedule
    pub fn remaining_principal(&self, paid_months: u32) -> Amount {
        let repaid: Amount = self
            .schedule()
            .iter()
            .filter(|e| e.month <= paid_months)
            .map(|e| e.principal)
            .sum();
        self.principal - repaid
    }

    /// Validate the loan
    pub fn validate(&self) -> Result<(), LoanValidationError> {
        if self.name.trim().is_empty() {
            return Err(LoanValidationError::EmptyName);
        }
        if !self.principal.is_positive() {
            return Err(LoanValidationError::NonPositivePrincipal);
        }
        if self.term_months == 0 {
            return Err(LoanValidationError::ZeroTerm);
        }
        if !self.annual_rate.is_finite() || self.annual_rate < 0.0 {
            return Err(LoanValidationError::InvalidRate);
        }
        if let Some(day) = self.repayment_day {
            if !(1..=31).contains(&day) {
                return Err(LoanValidationError::InvalidPaymentDay(day));
            }
        }
        if let Some(day) = self.interest_payment_day {
            if self.repayment != RepaymentType::Bullet {
                return Err(LoanValidationError::InterestDayOnNonBullet);
            }
            if !(1..=31).contains(&day) {
                return Err(LoanValidationError::InvalidPaymentDay(day));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Loan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {} over {} months)",
            self.name, self.institution, self.principal, self.term_months
        )
    }
}

/// Validation errors for loans
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoanValidationError {
    EmptyName,
    NonPositivePrincipal,
    ZeroTerm,
    InvalidRate,
    InvalidPaymentDay(u32),
    InterestDayOnNonBullet,
}

impl fmt::Display for LoanValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Loan name cannot be empty"),
            Self::NonPositivePrincipal => write!(f, "Principal must be positive"),
            Self::ZeroTerm => write!(f, "Term must be at least one month"),
            Self::InvalidRate => write!(f, "Interest rate must be a non-negative number"),
            Self::InvalidPaymentDay(day) => {
                write!(f, "Payment day {} is out of range (1-31)", day)
            }
            Self::InterestDayOnNonBullet => {
                write!(f, "Interest payment day only applies to bullet loans")
            }
        }
    }
}

impl std::error::Error for LoanValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_loan() -> Loan {
        Loan::new(
            "Jeonse loan",
            "KB",
            Amount::new(12_000_000),
            6.0,
            12,
            d(2025, 1, 15),
            RepaymentType::EqualPrincipalAndInterest,
        )
    }

    #[test]
    fn test_new_computes_derived_fields() {
        let loan = sample_loan();
        assert_eq!(loan.monthly_payment, Amount::new(1_032_797));
        assert_eq!(loan.total_interest, Amount::new(393_566));
    }

    #[test]
    fn test_refresh_derived_tracks_term_changes() {
        let mut loan = sample_loan();
        loan.repayment = RepaymentType::Bullet;
        loan.refresh_derived();

        assert_eq!(loan.monthly_payment, Amount::new(60_000));
        assert_eq!(loan.total_interest, Amount::new(720_000));
    }

    #[test]
    fn test_end_date() {
        assert_eq!(sample_loan().end_date(), d(2026, 1, 15));
    }

    #[test]
    fn test_remaining_principal() {
        let loan = sample_loan();
        assert_eq!(loan.remaining_principal(0), loan.principal);
        assert_eq!(loan.remaining_principal(12), Amount::zero());

        // After one payment the balance drops by the first principal part
        assert_eq!(
            loan.remaining_principal(1),
            Amount::new(12_000_000 - 972_797)
        );
    }

    #[test]
    fn test_validation() {
        let mut loan = sample_loan();
        assert!(loan.validate().is_ok());

        loan.term_months = 0;
        assert_eq!(loan.validate(), Err(LoanValidationError::ZeroTerm));
        loan.term_months = 12;

        loan.interest_payment_day = Some(25);
        assert_eq!(
            loan.validate(),
            Err(LoanValidationError::InterestDayOnNonBullet)
        );
        loan.repayment = RepaymentType::Bullet;
        assert!(loan.validate().is_ok());

        loan.repayment_day = Some(32);
        assert_eq!(
            loan.validate(),
            Err(LoanValidationError::InvalidPaymentDay(32))
        );
    }

    #[test]
    fn test_repayment_type_serde_camel_case() {
        assert_eq!(
            serde_json::to_string(&RepaymentType::EqualPrincipalAndInterest).unwrap(),
            "\"equalPrincipalAndInterest\""
        );
        let t: RepaymentType = serde_json::from_str("\"bullet\"").unwrap();
        assert_eq!(t, RepaymentType::Bullet);
    }

    #[test]
    fn test_serialization_round_trip() {
        let loan = sample_loan();
        let json = serde_json::to_string(&loan).unwrap();
        let back: Loan = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, loan.id);
        assert_eq!(back.monthly_payment, loan.monthly_payment);
    }
}
