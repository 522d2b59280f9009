//! Loan amortization math
//!
//! Pure functions over `(principal, annual rate, term, repayment type)`.
//! No storage, no I/O. All schedules satisfy two exact identities: the
//! principal components sum to the principal to the won (the final month
//! absorbs rounding drift), and every entry's total equals its principal
//! plus its interest.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::loan::RepaymentType;
use crate::models::money::Amount;

/// One month of a repayment schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// 1-based month index
    pub month: u32,

    /// Payment date: `start_date` plus `month` months, day-of-month clamped
    /// to the shorter month where needed
    pub date: NaiveDate,

    /// Principal component
    pub principal: Amount,

    /// Interest component
    pub interest: Amount,

    /// Payment total (`principal + interest`)
    pub total: Amount,
}

/// Monthly rate as a fraction: `annual_rate / 100 / 12`
pub fn monthly_rate(annual_rate: f64) -> f64 {
    annual_rate / 100.0 / 12.0
}

/// Full repayment schedule for a loan
///
/// Empty when `term_months` is zero.
pub fn schedule(
    principal: Amount,
    annual_rate: f64,
    term_months: u32,
    start_date: NaiveDate,
    repayment: RepaymentType,
) -> Vec<ScheduleEntry> {
    if term_months == 0 {
        return Vec::new();
    }

    let p = principal.units();
    let n = term_months as i64;
    let r = monthly_rate(annual_rate);

    let mut entries = Vec::with_capacity(term_months as usize);
    let mut remaining = p;

    match repayment {
        RepaymentType::EqualPrincipalAndInterest => {
            let payment = annuity_payment(p, r, n);
            for m in 1..=term_months {
                let interest = round_interest(remaining, r);
                let (principal_part, total) = if m == term_months {
                    // Final month clears the balance exactly
                    (remaining, remaining + interest)
                } else {
                    (payment - interest, payment)
                };
                remaining -= principal_part;
                entries.push(entry(m, start_date, principal_part, interest, total));
            }
        }
        RepaymentType::EqualPrincipal => {
            let per_month = p / n;
            for m in 1..=term_months {
                let interest = round_interest(remaining, r);
                let principal_part = if m == term_months { remaining } else { per_month };
                remaining -= principal_part;
                entries.push(entry(
                    m,
                    start_date,
                    principal_part,
                    interest,
                    principal_part + interest,
                ));
            }
        }
        RepaymentType::Bullet => {
            let interest = round_interest(p, r);
            for m in 1..=term_months {
                let principal_part = if m == term_months { p } else { 0 };
                entries.push(entry(
                    m,
                    start_date,
                    principal_part,
                    interest,
                    principal_part + interest,
                ));
            }
        }
    }

    entries
}

/// Constant monthly payment: the first entry's total
pub fn monthly_payment(
    principal: Amount,
    annual_rate: f64,
    term_months: u32,
    repayment: RepaymentType,
) -> Amount {
    schedule(principal, annual_rate, term_months, far_future_safe_date(), repayment)
        .first()
        .map(|e| e.total)
        .unwrap_or_default()
}

/// Total interest over the life of the loan
pub fn total_interest(
    principal: Amount,
    annual_rate: f64,
    term_months: u32,
    repayment: RepaymentType,
) -> Amount {
    schedule(principal, annual_rate, term_months, far_future_safe_date(), repayment)
        .iter()
        .map(|e| e.interest)
        .sum()
}

/// Whole months elapsed since `start_date`, floored at zero
///
/// A month counts only once its payment date has passed: starting on the
/// 15th, the first month is complete on the 15th of the following month.
/// Used as a suggested default for a loan's paid-months, never
/// authoritative.
pub fn paid_months_since(start_date: NaiveDate, today: NaiveDate) -> u32 {
    if today < start_date {
        return 0;
    }
    let mut months = (today.year() - start_date.year()) * 12
        + (today.month() as i32 - start_date.month() as i32);
    if today.day() < start_date.day() {
        months -= 1;
    }
    months.max(0) as u32
}

/// `date` plus `months` months, clamping the day to the shorter month
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}

fn entry(month: u32, start_date: NaiveDate, principal: i64, interest: i64, total: i64) -> ScheduleEntry {
    ScheduleEntry {
        month,
        date: add_months(start_date, month),
        principal: Amount::new(principal),
        interest: Amount::new(interest),
        total: Amount::new(total),
    }
}

/// Annuity payment: `P * r / (1 - (1+r)^-n)`, rounded to the won
///
/// Degenerates to straight division at a zero rate.
fn annuity_payment(principal: i64, monthly_rate: f64, term_months: i64) -> i64 {
    if monthly_rate == 0.0 {
        return principal / term_months;
    }
    let p = principal as f64;
    let payment = p * monthly_rate / (1.0 - (1.0 + monthly_rate).powi(-(term_months as i32)));
    payment.round() as i64
}

fn round_interest(balance: i64, monthly_rate: f64) -> i64 {
    (balance as f64 * monthly_rate).round() as i64
}

// Anchor date for calls that only need amounts, not dates.
fn far_future_safe_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).expect("valid constant date")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn twelve_million() -> Amount {
        Amount::new(12_000_000)
    }

    fn assert_exact_sums(principal: Amount, annual_rate: f64, term: u32, repayment: RepaymentType) {
        let entries = schedule(principal, annual_rate, term, d(2025, 1, 15), repayment);
        assert_eq!(entries.len(), term as usize);

        let principal_sum: Amount = entries.iter().map(|e| e.principal).sum();
        let interest_sum: Amount = entries.iter().map(|e| e.interest).sum();
        let total_sum: Amount = entries.iter().map(|e| e.total).sum();

        assert_eq!(principal_sum, principal, "principal must sum exactly");
        assert_eq!(total_sum, principal + interest_sum);
        for e in &entries {
            assert_eq!(e.total, e.principal + e.interest);
        }
    }

    #[test]
    fn test_equal_principal_and_interest_schedule() {
        let entries = schedule(
            twelve_million(),
            6.0,
            12,
            d(2025, 1, 15),
            RepaymentType::EqualPrincipalAndInterest,
        );

        // P = 12,000,000 at 0.5%/month over 12 months: payment = 1,032,797
        assert_eq!(entries[0].total, Amount::new(1_032_797));
        assert_eq!(entries[0].interest, Amount::new(60_000));
        assert_eq!(entries[0].principal, Amount::new(972_797));

        // Constant payment through month 11
        for e in &entries[..11] {
            assert_eq!(e.total, Amount::new(1_032_797));
        }

        // Final month absorbs the rounding drift
        assert_eq!(entries[11].principal, Amount::new(1_027_661));
        assert_eq!(entries[11].interest, Amount::new(5_138));
        assert_eq!(entries[11].total, Amount::new(1_032_799));

        let principal_sum: Amount = entries.iter().map(|e| e.principal).sum();
        assert_eq!(principal_sum, twelve_million());
    }

    #[test]
    fn test_equal_principal_schedule() {
        let entries = schedule(
            twelve_million(),
            6.0,
            12,
            d(2025, 1, 15),
            RepaymentType::EqualPrincipal,
        );

        assert_eq!(entries[0].principal, Amount::new(1_000_000));
        assert_eq!(entries[0].interest, Amount::new(60_000));
        assert_eq!(entries[0].total, Amount::new(1_060_000));

        assert_eq!(entries[11].principal, Amount::new(1_000_000));
        assert_eq!(entries[11].interest, Amount::new(5_000));
        assert_eq!(entries[11].total, Amount::new(1_005_000));

        // Totals strictly decrease as the balance shrinks
        for pair in entries.windows(2) {
            assert!(pair[1].total < pair[0].total);
        }
    }

    #[test]
    fn test_bullet_schedule() {
        let entries = schedule(
            twelve_million(),
            6.0,
            12,
            d(2025, 1, 15),
            RepaymentType::Bullet,
        );

        for e in &entries[..11] {
            assert_eq!(e.principal, Amount::zero());
            assert_eq!(e.total, Amount::new(60_000));
        }
        assert_eq!(entries[11].principal, twelve_million());
        assert_eq!(entries[11].total, Amount::new(12_060_000));
    }

    #[test]
    fn test_exact_sum_identities() {
        for repayment in [
            RepaymentType::EqualPrincipalAndInterest,
            RepaymentType::EqualPrincipal,
            RepaymentType::Bullet,
        ] {
            assert_exact_sums(twelve_million(), 6.0, 12, repayment);
            assert_exact_sums(Amount::new(10_000_001), 3.7, 37, repayment);
            assert_exact_sums(Amount::new(1_000_000), 0.0, 12, repayment);
            assert_exact_sums(Amount::new(500_000), 9.9, 1, repayment);
        }
    }

    #[test]
    fn test_zero_rate_has_no_interest() {
        let entries = schedule(
            Amount::new(1_200_000),
            0.0,
            12,
            d(2025, 1, 15),
            RepaymentType::EqualPrincipalAndInterest,
        );
        assert!(entries.iter().all(|e| e.interest.is_zero()));
        assert_eq!(entries[0].total, Amount::new(100_000));
        assert_eq!(
            total_interest(
                Amount::new(1_200_000),
                0.0,
                12,
                RepaymentType::EqualPrincipalAndInterest
            ),
            Amount::zero()
        );
    }

    #[test]
    fn test_zero_term_is_empty() {
        let entries = schedule(
            twelve_million(),
            6.0,
            0,
            d(2025, 1, 15),
            RepaymentType::Bullet,
        );
        assert!(entries.is_empty());
        assert_eq!(
            monthly_payment(twelve_million(), 6.0, 0, RepaymentType::Bullet),
            Amount::zero()
        );
    }

    #[test]
    fn test_monthly_payment_and_total_interest() {
        assert_eq!(
            monthly_payment(
                twelve_million(),
                6.0,
                12,
                RepaymentType::EqualPrincipalAndInterest
            ),
            Amount::new(1_032_797)
        );
        assert_eq!(
            total_interest(twelve_million(), 6.0, 12, RepaymentType::EqualPrincipal),
            Amount::new(390_000)
        );
        assert_eq!(
            total_interest(twelve_million(), 6.0, 12, RepaymentType::Bullet),
            Amount::new(720_000)
        );
    }

    #[test]
    fn test_schedule_dates_clamp_to_shorter_month() {
        let entries = schedule(
            Amount::new(300_000),
            6.0,
            3,
            d(2025, 1, 31),
            RepaymentType::EqualPrincipal,
        );
        assert_eq!(entries[0].date, d(2025, 2, 28));
        assert_eq!(entries[1].date, d(2025, 3, 31));
        assert_eq!(entries[2].date, d(2025, 4, 30));
    }

    #[test]
    fn test_paid_months_since() {
        let start = d(2025, 1, 15);

        assert_eq!(paid_months_since(start, d(2024, 12, 1)), 0);
        assert_eq!(paid_months_since(start, d(2025, 1, 15)), 0);
        assert_eq!(paid_months_since(start, d(2025, 2, 14)), 0);
        assert_eq!(paid_months_since(start, d(2025, 2, 15)), 1);
        assert_eq!(paid_months_since(start, d(2025, 8, 20)), 7);
        assert_eq!(paid_months_since(start, d(2026, 1, 15)), 12);
    }

    #[test]
    fn test_add_months() {
        assert_eq!(add_months(d(2025, 1, 31), 1), d(2025, 2, 28));
        assert_eq!(add_months(d(2024, 1, 31), 1), d(2024, 2, 29));
        assert_eq!(add_months(d(2025, 11, 30), 3), d(2026, 2, 28));
    }
}
