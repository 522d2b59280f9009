//! Asset repository
//!
//! Loads and saves the encrypted assets document. Load runs the floor
//! repair over every asset and reports which ones it had to fix so the
//! caller can persist the repaired state.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::crypto::key_derivation::DerivedKey;
use crate::error::LedgerError;
use crate::models::asset::{Asset, BitcoinBalancePolicy};
use crate::models::ids::AssetId;

use super::document::{load_document, save_document};

/// Serializable assets document
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct AssetData {
    assets: Vec<Asset>,
}

/// Repository for asset persistence
pub struct AssetRepository {
    path: PathBuf,
    data: HashMap<AssetId, Asset>,
}

impl AssetRepository {
    /// Create a new asset repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: HashMap::new(),
        }
    }

    /// Load assets from disk, repairing any out-of-bounds balances
    ///
    /// Returns the ids of repaired assets; non-empty means the caller
    /// should save so the repair is durable.
    pub fn load(
        &mut self,
        key: &DerivedKey,
        policy: BitcoinBalancePolicy,
    ) -> Result<Vec<AssetId>, LedgerError> {
        let file_data: AssetData = load_document(&self.path, key)?;

        let mut repaired = Vec::new();
        self.data.clear();
        for mut asset in file_data.assets {
            if asset.repair_floor(policy) {
                repaired.push(asset.id());
            }
            self.data.insert(asset.id(), asset);
        }

        Ok(repaired)
    }

    /// Save assets to disk
    pub fn save(&self, key: &DerivedKey) -> Result<(), LedgerError> {
        let file_data = AssetData {
            assets: self.data.values().cloned().collect(),
        };
        save_document(&self.path, &file_data, key)
    }

    /// Get an asset by ID
    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.data.get(&id)
    }

    /// Get all assets, sorted by name
    pub fn get_all(&self) -> Vec<Asset> {
        let mut assets: Vec<_> = self.data.values().cloned().collect();
        assets.sort_by(|a, b| a.name().cmp(b.name()));
        assets
    }

    /// Get an asset by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> Option<&Asset> {
        let name_lower = name.to_lowercase();
        self.data
            .values()
            .find(|a| a.name().to_lowercase() == name_lower)
    }

    /// Insert or update an asset
    pub fn upsert(&mut self, asset: Asset) {
        self.data.insert(asset.id(), asset);
    }

    /// Delete an asset, returning whether it existed
    pub fn delete(&mut self, id: AssetId) -> bool {
        self.data.remove(&id).is_some()
    }

    /// Check if an asset exists
    pub fn exists(&self, id: AssetId) -> bool {
        self.data.contains_key(&id)
    }

    /// Replace the whole collection (restore path)
    pub fn replace(&mut self, assets: Vec<Asset>) {
        self.data.clear();
        for asset in assets {
            self.data.insert(asset.id(), asset);
        }
    }

    /// Count assets
    pub fn count(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key_derivation::{derive_key, KeyDerivationParams};
    use crate::models::money::Amount;
    use tempfile::TempDir;

    fn test_key() -> DerivedKey {
        let params = KeyDerivationParams::new();
        derive_key("test_passphrase", &params).unwrap()
    }

    fn policy() -> BitcoinBalancePolicy {
        BitcoinBalancePolicy::AllowNegative
    }

    fn create_test_repo() -> (TempDir, AssetRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("assets.json");
        (temp_dir, AssetRepository::new(path))
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, mut repo) = create_test_repo();
        let repaired = repo.load(&test_key(), policy()).unwrap();
        assert!(repaired.is_empty());
        assert_eq!(repo.count(), 0);
    }

    #[test]
    fn test_upsert_and_get() {
        let (_temp_dir, mut repo) = create_test_repo();

        let asset = Asset::new_fiat("Checking", Amount::new(100_000), None);
        let id = asset.id();
        repo.upsert(asset);

        let retrieved = repo.get(id).unwrap();
        assert_eq!(retrieved.name(), "Checking");
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, mut repo) = create_test_repo();
        let key = test_key();

        let asset = Asset::new_fiat("Savings", Amount::new(50_000), None);
        let id = asset.id();
        repo.upsert(asset);
        repo.save(&key).unwrap();

        let path = temp_dir.path().join("assets.json");
        let mut repo2 = AssetRepository::new(path);
        repo2.load(&key, policy()).unwrap();

        let retrieved = repo2.get(id).unwrap();
        assert_eq!(retrieved.name(), "Savings");
        assert_eq!(retrieved.balance(), Amount::new(50_000));
    }

    #[test]
    fn test_load_repairs_floor_violations() {
        let (temp_dir, mut repo) = create_test_repo();
        let key = test_key();

        let mut asset = Asset::new_fiat("Checking", Amount::zero(), None);
        if let Asset::Fiat(a) = &mut asset {
            a.balance = Amount::new(-42);
        }
        let id = asset.id();
        repo.upsert(asset);
        repo.save(&key).unwrap();

        let path = temp_dir.path().join("assets.json");
        let mut repo2 = AssetRepository::new(path);
        let repaired = repo2.load(&key, policy()).unwrap();

        assert_eq!(repaired, vec![id]);
        assert_eq!(repo2.get(id).unwrap().balance(), Amount::zero());
    }

    #[test]
    fn test_get_all_sorted_by_name() {
        let (_temp_dir, mut repo) = create_test_repo();

        repo.upsert(Asset::new_fiat("Zebra", Amount::zero(), None));
        repo.upsert(Asset::new_fiat("Alpha", Amount::zero(), None));

        let all = repo.get_all();
        assert_eq!(all[0].name(), "Alpha");
        assert_eq!(all[1].name(), "Zebra");
    }

    #[test]
    fn test_get_by_name_case_insensitive() {
        let (_temp_dir, mut repo) = create_test_repo();
        repo.upsert(Asset::new_fiat("KB Checking", Amount::zero(), None));

        assert!(repo.get_by_name("kb checking").is_some());
        assert!(repo.get_by_name("other").is_none());
    }

    #[test]
    fn test_delete() {
        let (_temp_dir, mut repo) = create_test_repo();

        let asset = Asset::new_fiat("Temp", Amount::zero(), None);
        let id = asset.id();
        repo.upsert(asset);
        assert!(repo.exists(id));

        assert!(repo.delete(id));
        assert!(!repo.exists(id));
        assert!(!repo.delete(id));
    }

    #[test]
    fn test_replace() {
        let (_temp_dir, mut repo) = create_test_repo();
        repo.upsert(Asset::new_fiat("Old", Amount::zero(), None));

        let replacement = Asset::new_fiat("New", Amount::new(1), None);
        repo.replace(vec![replacement]);

        assert_eq!(repo.count(), 1);
        assert!(repo.get_by_name("New").is_some());
        assert!(repo.get_by_name("Old").is_none());
    }
}
