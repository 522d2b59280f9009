//! Price reconciliation
//!
//! Repairs records whose snapshot lookup failed at creation. Each pass is
//! idempotent: repaired records drop out of the pending set, still-failing
//! ones are left untouched for the next pass. Repairing a snapshot never
//! applies a missed balance delta.

use crate::audit::EntityKind;
use crate::crypto::session::KeyProvider;
use crate::error::LedgerResult;
use crate::models::ids::RecordId;
use crate::models::money::{sats_from_krw, Currency};
use crate::rates::RateSource;
use crate::storage::Store;

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct PriceSyncReport {
    /// Records whose snapshot got filled in
    pub repaired: Vec<RecordId>,
    /// Records still waiting on a rate
    pub still_pending: Vec<RecordId>,
}

impl PriceSyncReport {
    /// True when nothing was pending to begin with
    pub fn is_empty(&self) -> bool {
        self.repaired.is_empty() && self.still_pending.is_empty()
    }
}

/// Service for the price reconciliation pass
pub struct PriceSyncService<'a> {
    store: &'a mut Store,
    keys: &'a dyn KeyProvider,
}

impl<'a> PriceSyncService<'a> {
    /// Create a new price sync service
    pub fn new(store: &'a mut Store, keys: &'a dyn KeyProvider) -> Self {
        Self { store, keys }
    }

    /// Repair pending snapshots from the rate source
    ///
    /// Saves once at the end when anything was repaired.
    pub fn sync_pending_prices(&mut self, rates: &dyn RateSource) -> LedgerResult<PriceSyncReport> {
        let key = self.keys.require_key()?;

        let pending = self.store.records.pending_price_sync();
        let mut report = PriceSyncReport::default();

        for mut record in pending {
            let rate = match rates.historical(record.date) {
                Ok(rate) if rate.is_finite() && rate > 0.0 => rate,
                _ => {
                    report.still_pending.push(record.id);
                    continue;
                }
            };

            record.snapshot_rate = Some(rate);
            if record.currency == Currency::Krw {
                record.sats_equivalent = sats_from_krw(record.amount, rate);
            }
            record.needs_price_sync = false;
            record.updated_at = chrono::Utc::now();

            let id = record.id;
            self.store.records.upsert(record);
            self.store.log_update(
                key,
                EntityKind::Record,
                id.to_string(),
                None,
                Some(format!("price snapshot repaired at rate {}", rate)),
            )?;
            report.repaired.push(id);
        }

        if !report.repaired.is_empty() {
            self.store.records.save(key)?;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::LedgerPaths;
    use crate::config::settings::Settings;
    use crate::crypto::session::SessionKeys;
    use crate::error::LedgerError;
    use crate::models::asset::BitcoinBalancePolicy;
    use crate::models::money::Amount;
    use crate::models::record::PaymentMethod;
    use crate::services::records::{ExpenseInput, RecordService};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    struct FixedRate(f64);

    impl RateSource for FixedRate {
        fn current(&self) -> LedgerResult<f64> {
            Ok(self.0)
        }
        fn historical(&self, _date: NaiveDate) -> LedgerResult<f64> {
            Ok(self.0)
        }
    }

    struct OfflineRate;

    impl RateSource for OfflineRate {
        fn current(&self) -> LedgerResult<f64> {
            Err(LedgerError::RateUnavailable("feed offline".into()))
        }
        fn historical(&self, _date: NaiveDate) -> LedgerResult<f64> {
            Err(LedgerError::RateUnavailable("feed offline".into()))
        }
    }

    fn setup() -> (TempDir, Store, SessionKeys) {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let store = Store::new(paths).unwrap();

        let mut settings = Settings::default();
        let mut keys = SessionKeys::locked();
        keys.unlock("test passphrase", &mut settings).unwrap();

        (temp_dir, store, keys)
    }

    fn pending_expense(store: &mut Store, keys: &SessionKeys) -> RecordId {
        let mut service =
            RecordService::new(store, keys, BitcoinBalancePolicy::AllowNegative);
        let outcome = service
            .add_expense(
                ExpenseInput {
                    date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
                    amount: Amount::new(30_000),
                    currency: Currency::Krw,
                    category: "groceries".into(),
                    payment_method: PaymentMethod::Cash,
                    linked_asset_id: None,
                    card_id: None,
                    installment_months: None,
                    memo: None,
                },
                &OfflineRate,
            )
            .unwrap();
        outcome.record_id
    }

    #[test]
    fn test_sync_repairs_pending_records() {
        let (_temp, mut store, keys) = setup();
        let id = pending_expense(&mut store, &keys);

        let mut sync = PriceSyncService::new(&mut store, &keys);
        let report = sync.sync_pending_prices(&FixedRate(159_300_000.0)).unwrap();

        assert_eq!(report.repaired, vec![id]);
        assert!(report.still_pending.is_empty());

        let record = store.records.get(id).unwrap();
        assert!(!record.needs_price_sync);
        assert_eq!(record.snapshot_rate, Some(159_300_000.0));
        assert_eq!(record.sats_equivalent, Some(Amount::new(18_832)));
    }

    #[test]
    fn test_sync_leaves_failures_pending() {
        let (_temp, mut store, keys) = setup();
        let id = pending_expense(&mut store, &keys);

        let mut sync = PriceSyncService::new(&mut store, &keys);
        let report = sync.sync_pending_prices(&OfflineRate).unwrap();

        assert!(report.repaired.is_empty());
        assert_eq!(report.still_pending, vec![id]);
        assert!(store.records.get(id).unwrap().needs_price_sync);
    }

    #[test]
    fn test_sync_is_idempotent() {
        let (_temp, mut store, keys) = setup();
        pending_expense(&mut store, &keys);

        let mut sync = PriceSyncService::new(&mut store, &keys);
        let first = sync.sync_pending_prices(&FixedRate(100_000_000.0)).unwrap();
        assert_eq!(first.repaired.len(), 1);

        let mut sync = PriceSyncService::new(&mut store, &keys);
        let second = sync.sync_pending_prices(&FixedRate(100_000_000.0)).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn test_sync_requires_unlocked_session() {
        let (_temp, mut store, keys) = setup();
        pending_expense(&mut store, &keys);

        let locked = SessionKeys::locked();
        let mut sync = PriceSyncService::new(&mut store, &locked);
        let result = sync.sync_pending_prices(&FixedRate(100_000_000.0));
        assert!(matches!(result, Err(LedgerError::AuthRequired)));
    }
}
