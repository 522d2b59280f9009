//! Transaction recorder
//!
//! The write path is ordered and contractual: authentication, validation,
//! snapshot resolution, durable persistence, then linked-balance
//! propagation. A rate failure never blocks recording, and a propagation
//! failure never rolls the record back.

use chrono::{NaiveDate, Utc};

use crate::audit::EntityKind;
use crate::crypto::key_derivation::DerivedKey;
use crate::crypto::session::KeyProvider;
use crate::error::{LedgerError, LedgerResult};
use crate::models::asset::{BalanceAdjustment, BitcoinBalancePolicy};
use crate::models::ids::{AssetId, CardId, RecordId};
use crate::models::money::{sats_from_krw, Amount, Currency};
use crate::models::record::{LedgerRecord, PaymentMethod, RecordKind};
use crate::rates::RateSource;
use crate::storage::Store;

/// Input for a new expense record
#[derive(Debug, Clone)]
pub struct ExpenseInput {
    pub date: NaiveDate,
    pub amount: Amount,
    pub currency: Currency,
    pub category: String,
    pub payment_method: PaymentMethod,
    pub linked_asset_id: Option<AssetId>,
    pub card_id: Option<CardId>,
    pub installment_months: Option<u32>,
    pub memo: Option<String>,
}

/// Input for a new income record
#[derive(Debug, Clone)]
pub struct IncomeInput {
    pub date: NaiveDate,
    pub amount: Amount,
    pub currency: Currency,
    pub source: String,
    pub deposit_method: PaymentMethod,
    pub linked_asset_id: Option<AssetId>,
    pub memo: Option<String>,
}

/// Input for a new transfer record
#[derive(Debug, Clone)]
pub struct TransferInput {
    pub date: NaiveDate,
    pub amount: Amount,
    pub currency: Currency,
    pub from_asset_id: Option<AssetId>,
    pub to_asset_id: Option<AssetId>,
    pub to_card_id: Option<CardId>,
    pub memo: Option<String>,
}

/// How the currency-conversion snapshot resolved at creation
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotOutcome {
    /// The historical rate was fetched and pinned
    Resolved { rate: f64 },
    /// The lookup failed; the record is flagged for a later sync pass
    Pending,
}

/// What happened to the linked asset's balance
#[derive(Debug, Clone, PartialEq)]
pub enum PropagationOutcome {
    /// The record does not settle against any asset
    NotLinked,
    /// The balance moved; the adjustment reports exactly how
    Applied(BalanceAdjustment),
    /// Propagation could not run; the record is durable regardless
    Failed(String),
}

/// Composite result of recording a transaction
#[derive(Debug, Clone)]
pub struct RecordOutcome {
    pub record_id: RecordId,
    pub snapshot: SnapshotOutcome,
    pub propagation: PropagationOutcome,
}

/// Partial update for a ledger record
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub date: Option<NaiveDate>,
    pub amount: Option<Amount>,
    /// `Some(None)` clears the memo
    pub memo: Option<Option<String>>,
    /// Expense records only
    pub category: Option<String>,
    /// Income records only
    pub source: Option<String>,
    /// `Some(None)` unlinks
    pub linked_asset_id: Option<Option<AssetId>>,
    /// Explicit KRW/BTC rate; re-derives the snapshot and clears the
    /// pending flag
    pub rate_override: Option<f64>,
}

/// Service for transaction records
pub struct RecordService<'a> {
    store: &'a mut Store,
    keys: &'a dyn KeyProvider,
    policy: BitcoinBalancePolicy,
}

impl<'a> RecordService<'a> {
    /// Create a new record service
    pub fn new(
        store: &'a mut Store,
        keys: &'a dyn KeyProvider,
        policy: BitcoinBalancePolicy,
    ) -> Self {
        Self {
            store,
            keys,
            policy,
        }
    }

    /// Record an expense
    pub fn add_expense(
        &mut self,
        input: ExpenseInput,
        rates: &dyn RateSource,
    ) -> LedgerResult<RecordOutcome> {
        let mut record = LedgerRecord::new(
            input.date,
            input.amount,
            input.currency,
            RecordKind::Expense {
                category: input.category,
                payment_method: input.payment_method,
                linked_asset_id: input.linked_asset_id,
                card_id: input.card_id,
                installment_months: input.installment_months,
            },
        );
        record.memo = input.memo;
        self.add(record, rates)
    }

    /// Record an income
    pub fn add_income(
        &mut self,
        input: IncomeInput,
        rates: &dyn RateSource,
    ) -> LedgerResult<RecordOutcome> {
        let mut record = LedgerRecord::new(
            input.date,
            input.amount,
            input.currency,
            RecordKind::Income {
                source: input.source,
                deposit_method: input.deposit_method,
                linked_asset_id: input.linked_asset_id,
            },
        );
        record.memo = input.memo;
        self.add(record, rates)
    }

    /// Record a transfer
    ///
    /// Transfers are informational: they never move asset balances.
    pub fn add_transfer(
        &mut self,
        input: TransferInput,
        rates: &dyn RateSource,
    ) -> LedgerResult<RecordOutcome> {
        let mut record = LedgerRecord::new(
            input.date,
            input.amount,
            input.currency,
            RecordKind::Transfer {
                from_asset_id: input.from_asset_id,
                to_asset_id: input.to_asset_id,
                to_card_id: input.to_card_id,
            },
        );
        record.memo = input.memo;
        self.add(record, rates)
    }

    fn add(
        &mut self,
        mut record: LedgerRecord,
        rates: &dyn RateSource,
    ) -> LedgerResult<RecordOutcome> {
        let key = self.keys.require_key()?;

        record
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        let snapshot = resolve_snapshot(&mut record, rates);

        // Persist before propagation; a failure here leaves no partial state
        let record_id = record.id;
        let settles = record.settles_against();
        let is_inflow = record.is_inflow();
        let kind_name = record.kind.name();
        let currency = record.currency;
        let amount = record.amount;
        let sats_equivalent = record.sats_equivalent;

        self.store.records.upsert(record);
        self.store.records.save(key)?;
        self.store.log_create(
            key,
            EntityKind::Record,
            record_id.to_string(),
            Some(kind_name.to_string()),
        )?;

        let propagation = match settles {
            None => PropagationOutcome::NotLinked,
            Some(asset_id) => self.propagate(
                key,
                asset_id,
                currency,
                amount,
                sats_equivalent,
                is_inflow,
            ),
        };

        Ok(RecordOutcome {
            record_id,
            snapshot,
            propagation,
        })
    }

    /// Apply the record's delta to its linked asset
    ///
    /// Runs only after the record is durable. Failures are reported, not
    /// propagated; the record stands either way.
    fn propagate(
        &mut self,
        key: &DerivedKey,
        asset_id: AssetId,
        currency: Currency,
        amount: Amount,
        sats_equivalent: Option<Amount>,
        is_inflow: bool,
    ) -> PropagationOutcome {
        let Some(asset) = self.store.assets.get(asset_id) else {
            return PropagationOutcome::Failed(format!("asset not found: {}", asset_id));
        };
        let mut asset = asset.clone();

        let magnitude = match currency {
            Currency::Sats => amount,
            Currency::Krw if !asset.is_fiat() => match sats_equivalent {
                Some(sats) => sats,
                // Pending snapshot: there is no sats figure to apply
                None => {
                    return PropagationOutcome::Failed(
                        "rate unavailable: no sats equivalent for this record".to_string(),
                    )
                }
            },
            Currency::Krw => amount,
        };
        let delta = if is_inflow { magnitude } else { -magnitude };

        let adjustment = asset.apply_delta(delta, self.policy);
        let name = asset.name().to_string();

        self.store.assets.upsert(asset);
        if let Err(e) = self.store.assets.save(key) {
            return PropagationOutcome::Failed(format!("failed to save asset: {}", e));
        }
        if let Err(e) = self.store.log_adjust(key, &adjustment, Some(name)) {
            return PropagationOutcome::Failed(format!("failed to audit adjustment: {}", e));
        }

        PropagationOutcome::Applied(adjustment)
    }

    /// Update a record's descriptive and linkage fields
    ///
    /// Never re-runs propagation; the linked balance keeps whatever the
    /// original recording applied. Compensating entries are the caller's
    /// domain.
    pub fn update_record(&mut self, id: RecordId, patch: RecordPatch) -> LedgerResult<LedgerRecord> {
        let key = self.keys.require_key()?;

        let mut record = self
            .store
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::record_not_found(id.to_string()))?;

        if let Some(date) = patch.date {
            record.date = date;
        }
        if let Some(amount) = patch.amount {
            record.amount = amount;
        }
        if let Some(memo) = patch.memo {
            record.memo = memo;
        }
        if let Some(category) = patch.category {
            match &mut record.kind {
                RecordKind::Expense { category: c, .. } => *c = category,
                _ => {
                    return Err(LedgerError::Validation(
                        "Category only applies to expense records".into(),
                    ))
                }
            }
        }
        if let Some(source) = patch.source {
            match &mut record.kind {
                RecordKind::Income { source: s, .. } => *s = source,
                _ => {
                    return Err(LedgerError::Validation(
                        "Source only applies to income records".into(),
                    ))
                }
            }
        }
        if let Some(linked) = patch.linked_asset_id {
            match &mut record.kind {
                RecordKind::Expense { linked_asset_id, .. }
                | RecordKind::Income { linked_asset_id, .. } => *linked_asset_id = linked,
                RecordKind::Transfer { .. } => {
                    return Err(LedgerError::Validation(
                        "Transfers carry explicit endpoints, not a linked asset".into(),
                    ))
                }
            }
        }
        if let Some(rate) = patch.rate_override {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(LedgerError::Validation(format!(
                    "Rate override must be positive, got {}",
                    rate
                )));
            }
            record.snapshot_rate = Some(rate);
            record.needs_price_sync = false;
        }

        record
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        // The sats figure only moves when the caller supplies a rate; an
        // amount or date edit keeps the snapshot taken at recording time
        if patch.rate_override.is_some() {
            match record.currency {
                Currency::Sats => record.sats_equivalent = Some(record.amount),
                Currency::Krw => {
                    if let Some(rate) = record.snapshot_rate {
                        record.sats_equivalent = sats_from_krw(record.amount, rate);
                    }
                }
            }
        }
        record.updated_at = Utc::now();

        self.store.records.upsert(record.clone());
        self.store.records.save(key)?;
        self.store.log_update(
            key,
            EntityKind::Record,
            id.to_string(),
            Some(record.kind.name().to_string()),
            None,
        )?;

        Ok(record)
    }

    /// Delete a record
    ///
    /// Does not reverse any balance propagation the record applied when it
    /// was created.
    pub fn delete_record(&mut self, id: RecordId) -> LedgerResult<LedgerRecord> {
        let key = self.keys.require_key()?;

        let record = self
            .store
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::record_not_found(id.to_string()))?;

        self.store.records.delete(id);
        self.store.records.save(key)?;
        self.store.log_delete(
            key,
            EntityKind::Record,
            id.to_string(),
            Some(record.kind.name().to_string()),
        )?;

        Ok(record)
    }

    /// Get a record by ID
    pub fn get(&self, id: RecordId) -> LedgerResult<LedgerRecord> {
        self.store
            .records
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::record_not_found(id.to_string()))
    }

    /// List all records, newest first
    pub fn list(&self) -> Vec<LedgerRecord> {
        self.store.records.get_all()
    }
}

/// Resolve the currency-conversion snapshot for a new record
///
/// A SATS record's sats value stands regardless of the rate fetch; the
/// fetch only fills the display snapshot. A KRW record with a failed fetch
/// is flagged for a later sync pass.
fn resolve_snapshot(record: &mut LedgerRecord, rates: &dyn RateSource) -> SnapshotOutcome {
    match record.currency {
        Currency::Sats => {
            record.sats_equivalent = Some(record.amount);
            match rates.historical(record.date) {
                Ok(rate) if rate.is_finite() && rate > 0.0 => {
                    record.snapshot_rate = Some(rate);
                    record.needs_price_sync = false;
                    SnapshotOutcome::Resolved { rate }
                }
                _ => {
                    record.needs_price_sync = true;
                    SnapshotOutcome::Pending
                }
            }
        }
        Currency::Krw => match rates.historical(record.date) {
            Ok(rate) if rate.is_finite() && rate > 0.0 => {
                record.snapshot_rate = Some(rate);
                record.sats_equivalent = sats_from_krw(record.amount, rate);
                record.needs_price_sync = false;
                SnapshotOutcome::Resolved { rate }
            }
            _ => {
                record.snapshot_rate = None;
                record.sats_equivalent = None;
                record.needs_price_sync = true;
                SnapshotOutcome::Pending
            }
        },
    }
}
