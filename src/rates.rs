//! Exchange rate seam
//!
//! The recorder and reporting code never fetch prices themselves; callers
//! hand in a `RateSource`. A source that cannot answer returns
//! `RateUnavailable`, which the recorder treats as "snapshot pending",
//! never as a failed record.

use chrono::NaiveDate;

use crate::error::LedgerResult;

/// Provides BTC/fiat exchange rates
///
/// Rates are fiat units per whole bitcoin (e.g. KRW per BTC).
pub trait RateSource {
    /// The current rate
    fn current(&self) -> LedgerResult<f64>;

    /// The rate on a given date
    fn historical(&self, date: NaiveDate) -> LedgerResult<f64>;
}

impl<T: RateSource + ?Sized> RateSource for &T {
    fn current(&self) -> LedgerResult<f64> {
        (**self).current()
    }

    fn historical(&self, date: NaiveDate) -> LedgerResult<f64> {
        (**self).historical(date)
    }
}
