//! Asset service
//!
//! Business logic for fiat accounts and bitcoin wallets: creation,
//! updates, deletion, the clamped balance adjuster, and portfolio
//! summaries. Every mutation requires an unlocked session and is written
//! durably and audited before it returns.

use crate::crypto::session::KeyProvider;
use crate::error::{LedgerError, LedgerResult};
use crate::models::asset::{
    Asset, BalanceAdjustment, BitcoinBalancePolicy, Overdraft, WalletKind,
};
use crate::models::ids::AssetId;
use crate::models::money::{krw_value_of_sats, Amount};
use crate::audit::EntityKind;
use crate::storage::Store;

/// Partial update for an asset
///
/// `overdraft` is doubly optional: `None` leaves the facet alone,
/// `Some(None)` removes it, `Some(Some(_))` replaces it.
#[derive(Debug, Clone, Default)]
pub struct AssetPatch {
    pub name: Option<String>,
    pub overdraft: Option<Option<Overdraft>>,
    pub wallet: Option<WalletKind>,
}

/// Service for asset operations
pub struct AssetService<'a> {
    store: &'a mut Store,
    keys: &'a dyn KeyProvider,
    policy: BitcoinBalancePolicy,
}

impl<'a> AssetService<'a> {
    /// Create a new asset service
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

    /// Create a fiat account
    pub fn create_fiat(
        &mut self,
        name: &str,
        opening_balance: Amount,
        overdraft: Option<Overdraft>,
    ) -> LedgerResult<Asset> {
        let asset = Asset::new_fiat(name, opening_balance, overdraft);
        self.create(asset)
    }

    /// Create a bitcoin wallet
    pub fn create_bitcoin(
        &mut self,
        name: &str,
        wallet: WalletKind,
        opening_balance_sats: Amount,
    ) -> LedgerResult<Asset> {
        let asset = Asset::new_bitcoin(name, wallet, opening_balance_sats);
        self.create(asset)
    }

    fn create(&mut self, mut asset: Asset) -> LedgerResult<Asset> {
        let key = self.keys.require_key()?;

        asset
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        if self.store.assets.get_by_name(asset.name()).is_some() {
            return Err(LedgerError::Duplicate {
                entity_type: "Asset",
                identifier: asset.name().to_string(),
            });
        }

        // An opening balance below the floor is clamped up, same as any
        // other out-of-bounds balance
        asset.repair_floor(self.policy);

        self.store.assets.upsert(asset.clone());
        self.store.assets.save(key)?;
        self.store.log_create(
            key,
            EntityKind::Asset,
            asset.id().to_string(),
            Some(asset.name().to_string()),
        )?;

        Ok(asset)
    }

    /// Update an asset's descriptive fields
    pub fn update(&mut self, id: AssetId, patch: AssetPatch) -> LedgerResult<Asset> {
        let key = self.keys.require_key()?;

        let mut asset = self
            .store
            .assets
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::asset_not_found(id.to_string()))?;

        if let Some(name) = &patch.name {
            if let Some(existing) = self.store.assets.get_by_name(name) {
                if existing.id() != id {
                    return Err(LedgerError::Duplicate {
                        entity_type: "Asset",
                        identifier: name.clone(),
                    });
                }
            }
        }

        let mut changes = Vec::new();
        match &mut asset {
            Asset::Fiat(a) => {
                if let Some(name) = patch.name {
                    changes.push(format!("name: {} -> {}", a.name, name));
                    a.name = name;
                }
                if let Some(overdraft) = patch.overdraft {
                    changes.push(match &overdraft {
                        Some(od) => format!("overdraft: limit {}", od.credit_limit),
                        None => "overdraft: removed".to_string(),
                    });
                    a.overdraft = overdraft;
                }
                if patch.wallet.is_some() {
                    return Err(LedgerError::Validation(
                        "Wallet kind only applies to bitcoin assets".into(),
                    ));
                }
            }
            Asset::Bitcoin(a) => {
                if let Some(name) = patch.name {
                    changes.push(format!("name: {} -> {}", a.name, name));
                    a.name = name;
                }
                if let Some(wallet) = patch.wallet {
                    changes.push(format!("wallet: {} -> {}", a.wallet, wallet));
                    a.wallet = wallet;
                }
                if patch.overdraft.is_some() {
                    return Err(LedgerError::Validation(
                        "Overdraft only applies to fiat assets".into(),
                    ));
                }
            }
        }

        asset
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;

        // A tightened overdraft can strand the balance below the new floor
        if asset.repair_floor(self.policy) {
            changes.push(format!("balance clamped to {}", asset.balance()));
        }

        self.store.assets.upsert(asset.clone());
        self.store.assets.save(key)?;
        self.store.log_update(
            key,
            EntityKind::Asset,
            id.to_string(),
            Some(asset.name().to_string()),
            if changes.is_empty() {
                None
            } else {
                Some(changes.join(", "))
            },
        )?;

        Ok(asset)
    }

    /// Delete an asset
    ///
    /// Records that reference the asset keep their link; they simply stop
    /// resolving. Deletion never rewrites history.
    pub fn delete(&mut self, id: AssetId) -> LedgerResult<Asset> {
        let key = self.keys.require_key()?;

        let asset = self
            .store
            .assets
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::asset_not_found(id.to_string()))?;

        self.store.assets.delete(id);
        self.store.assets.save(key)?;
        self.store.log_delete(
            key,
            EntityKind::Asset,
            id.to_string(),
            Some(asset.name().to_string()),
        )?;

        Ok(asset)
    }

    /// Apply a signed delta to an asset's balance, clamping to its floor
    ///
    /// Clamping is a successful outcome; the returned adjustment reports
    /// what was actually applied.
    pub fn adjust_balance(
        &mut self,
        id: AssetId,
        delta: Amount,
    ) -> LedgerResult<BalanceAdjustment> {
        let key = self.keys.require_key()?;

        let mut asset = self
            .store
            .assets
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::asset_not_found(id.to_string()))?;

        let adjustment = asset.apply_delta(delta, self.policy);
        let name = asset.name().to_string();

        self.store.assets.upsert(asset);
        self.store.assets.save(key)?;
        self.store.log_adjust(key, &adjustment, Some(name))?;

        Ok(adjustment)
    }

    /// Get an asset by ID
    pub fn get(&self, id: AssetId) -> LedgerResult<Asset> {
        self.store
            .assets
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::asset_not_found(id.to_string()))
    }

    /// List all assets, sorted by name
    pub fn list(&self) -> Vec<Asset> {
        self.store.assets.get_all()
    }

    /// Sum of fiat balances in won
    pub fn total_fiat(&self) -> Amount {
        self.store
            .assets
            .get_all()
            .iter()
            .filter(|a| a.is_fiat())
            .map(|a| a.balance())
            .sum()
    }

    /// Sum of bitcoin balances in satoshis
    pub fn total_bitcoin_sats(&self) -> Amount {
        self.store
            .assets
            .get_all()
            .iter()
            .filter(|a| !a.is_fiat())
            .map(|a| a.balance())
            .sum()
    }

    /// Total portfolio value in won at the given KRW/BTC rate
    ///
    /// None when the rate cannot price anything.
    pub fn total_value_in_fiat(&self, rate: f64) -> Option<Amount> {
        let bitcoin_value = krw_value_of_sats(self.total_bitcoin_sats(), rate)?;
        Some(self.total_fiat() + bitcoin_value)
    }

    /// Fraction of portfolio value held in bitcoin, in [0, 1]
    ///
    /// A portfolio worth nothing holds no bitcoin: the ratio is 0.0. None
    /// only when the rate cannot price the holdings.
    pub fn bitcoin_ratio(&self, rate: f64) -> Option<f64> {
        let bitcoin_value = krw_value_of_sats(self.total_bitcoin_sats(), rate)?;
        let total = self.total_fiat() + bitcoin_value;
        if total.is_zero() {
            return Some(0.0);
        }
        Some(bitcoin_value.units() as f64 / total.units() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::LedgerPaths;
    use crate::config::settings::Settings;
    use crate::crypto::session::SessionKeys;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Store, SessionKeys) {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        let store = Store::new(paths).unwrap();

        let mut settings = Settings::default();
        let mut keys = SessionKeys::locked();
        keys.unlock("test passphrase", &mut settings).unwrap();

        (temp_dir, store, keys)
    }

    fn policy() -> BitcoinBalancePolicy {
        BitcoinBalancePolicy::AllowNegative
    }

    #[test]
    fn test_create_fiat() {
        let (_temp, mut store, keys) = setup();
        let mut service = AssetService::new(&mut store, &keys, policy());

        let asset = service
            .create_fiat("KB Checking", Amount::new(100_000), None)
            .unwrap();
        assert_eq!(asset.name(), "KB Checking");
        assert_eq!(asset.balance(), Amount::new(100_000));
    }

    #[test]
    fn test_create_requires_unlocked_session() {
        let (_temp, mut store, _keys) = setup();
        let locked = SessionKeys::locked();
        let mut service = AssetService::new(&mut store, &locked, policy());

        let result = service.create_fiat("Checking", Amount::zero(), None);
        assert!(matches!(result, Err(LedgerError::AuthRequired)));
    }

    #[test]
    fn test_create_rejects_duplicate_name() {
        let (_temp, mut store, keys) = setup();
        let mut service = AssetService::new(&mut store, &keys, policy());

        service.create_fiat("Checking", Amount::zero(), None).unwrap();
        let result = service.create_fiat("Checking", Amount::zero(), None);
        assert!(matches!(result, Err(LedgerError::Duplicate { .. })));
    }

    #[test]
    fn test_adjust_balance_clamps_at_credit_limit() {
        let (_temp, mut store, keys) = setup();
        let mut service = AssetService::new(&mut store, &keys, policy());

        let asset = service
            .create_fiat(
                "Overdraft account",
                Amount::new(-100_000),
                Some(Overdraft::new(Amount::new(500_000), 8.0)),
            )
            .unwrap();

        let adj = service
            .adjust_balance(asset.id(), Amount::new(-450_000))
            .unwrap();

        assert!(adj.clamped);
        assert_eq!(adj.requested_delta, Amount::new(-450_000));
        assert_eq!(adj.actual_delta, Amount::new(-400_000));
        assert_eq!(adj.new_balance, Amount::new(-500_000));

        // The clamped result is durable
        assert_eq!(service.get(asset.id()).unwrap().balance(), Amount::new(-500_000));
    }

    #[test]
    fn test_adjust_balance_is_audited() {
        let (_temp, mut store, keys) = setup();
        {
            let mut service = AssetService::new(&mut store, &keys, policy());
            let asset = service.create_fiat("Checking", Amount::new(50_000), None).unwrap();
            service.adjust_balance(asset.id(), Amount::new(-10_000)).unwrap();
        }

        let key = keys.require_key().unwrap();
        let entries = store.audit().read_all(key).unwrap();
        assert!(entries
            .iter()
            .any(|e| e.operation == crate::audit::Operation::Adjust));
    }

    #[test]
    fn test_update_name_and_overdraft() {
        let (_temp, mut store, keys) = setup();
        let mut service = AssetService::new(&mut store, &keys, policy());

        let asset = service.create_fiat("Old name", Amount::zero(), None).unwrap();

        let updated = service
            .update(
                asset.id(),
                AssetPatch {
                    name: Some("New name".into()),
                    overdraft: Some(Some(Overdraft::new(Amount::new(200_000), 6.0))),
                    wallet: None,
                },
            )
            .unwrap();

        assert_eq!(updated.name(), "New name");
        assert_eq!(updated.floor(policy()), Some(Amount::new(-200_000)));
    }

    #[test]
    fn test_update_tightened_overdraft_clamps_balance() {
        let (_temp, mut store, keys) = setup();
        let mut service = AssetService::new(&mut store, &keys, policy());

        let asset = service
            .create_fiat(
                "Overdraft account",
                Amount::new(-300_000),
                Some(Overdraft::new(Amount::new(500_000), 8.0)),
            )
            .unwrap();

        let updated = service
            .update(
                asset.id(),
                AssetPatch {
                    overdraft: Some(Some(Overdraft::new(Amount::new(100_000), 8.0))),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.balance(), Amount::new(-100_000));
    }

    #[test]
    fn test_delete() {
        let (_temp, mut store, keys) = setup();
        let mut service = AssetService::new(&mut store, &keys, policy());

        let asset = service.create_fiat("Temp", Amount::zero(), None).unwrap();
        service.delete(asset.id()).unwrap();

        assert!(service.get(asset.id()).is_err());
        assert!(matches!(
            service.delete(asset.id()),
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[test]
    fn test_portfolio_totals() {
        let (_temp, mut store, keys) = setup();
        let mut service = AssetService::new(&mut store, &keys, policy());

        service.create_fiat("Checking", Amount::new(1_000_000), None).unwrap();
        service
            .create_bitcoin("Cold", WalletKind::Onchain, Amount::new(2_000_000))
            .unwrap();

        assert_eq!(service.total_fiat(), Amount::new(1_000_000));
        assert_eq!(service.total_bitcoin_sats(), Amount::new(2_000_000));

        // At 100,000,000 KRW/BTC a sat is worth one won
        let total = service.total_value_in_fiat(100_000_000.0).unwrap();
        assert_eq!(total, Amount::new(3_000_000));

        let ratio = service.bitcoin_ratio(100_000_000.0).unwrap();
        assert!((ratio - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_bitcoin_ratio_empty_portfolio() {
        let (_temp, mut store, keys) = setup();
        let service = AssetService::new(&mut store, &keys, policy());

        // Nothing held yet still prices to a ratio, not a missing one
        assert_eq!(service.bitcoin_ratio(100_000_000.0), Some(0.0));
        assert!(service.bitcoin_ratio(0.0).is_none());
    }
}
