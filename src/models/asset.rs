//! Asset models
//!
//! An asset is either a fiat account (won) or a bitcoin wallet (satoshis).
//! Balances only move through `apply_delta`, which clamps to the asset's
//! floor and reports what it actually did.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::AssetId;
use super::money::Amount;

/// Kind of bitcoin wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    /// On-chain wallet
    Onchain,
    /// Lightning wallet
    Lightning,
}

impl fmt::Display for WalletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Onchain => write!(f, "on-chain"),
            Self::Lightning => write!(f, "lightning"),
        }
    }
}

/// Floor policy for bitcoin wallet balances
///
/// Fiat floors are fixed by the overdraft facet; the bitcoin floor is a
/// settings knob. `AllowNegative` keeps negative sat balances representable
/// (pending-spend tracking), `NonNegative` clamps at zero like a
/// non-overdraft fiat account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BitcoinBalancePolicy {
    /// Negative sat balances are allowed (no floor)
    #[default]
    AllowNegative,
    /// Sat balances are clamped at zero
    NonNegative,
}

/// Overdraft facet for a fiat account
///
/// Permits the balance to go negative down to `-credit_limit`, accruing
/// interest on the drawn amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overdraft {
    /// Maximum negative draw, as a non-negative amount
    pub credit_limit: Amount,

    /// Annual interest rate in percent on the drawn balance
    pub interest_rate: f64,

    /// Manual override for the estimated monthly interest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_interest: Option<Amount>,
}

impl Overdraft {
    /// Create an overdraft facet
    pub fn new(credit_limit: Amount, interest_rate: f64) -> Self {
        Self {
            credit_limit,
            interest_rate,
            estimated_interest: None,
        }
    }

    /// Estimated interest for one month at the current balance
    ///
    /// Zero when the balance is not drawn, override or not. The stored
    /// override wins over the formula for a drawn balance.
    pub fn estimated_monthly_interest(&self, balance: Amount) -> Amount {
        if !balance.is_negative() {
            return Amount::zero();
        }
        if let Some(override_amount) = self.estimated_interest {
            return override_amount;
        }
        let drawn = balance.abs().units() as f64;
        Amount::new((drawn * self.interest_rate / 100.0 / 12.0).round() as i64)
    }
}

/// A fiat account denominated in won
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiatAsset {
    /// Unique identifier
    pub id: AssetId,

    /// Account name (e.g., "KB Checking")
    pub name: String,

    /// Current balance in won
    pub balance: Amount,

    /// Overdraft facet; absent means the balance floors at zero
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overdraft: Option<Overdraft>,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last modified
    pub updated_at: DateTime<Utc>,
}

/// A bitcoin wallet denominated in satoshis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitcoinAsset {
    /// Unique identifier
    pub id: AssetId,

    /// Wallet name (e.g., "Phoenix")
    pub name: String,

    /// Wallet kind
    pub wallet: WalletKind,

    /// Current balance in satoshis
    pub balance_sats: Amount,

    /// When the wallet was created
    pub created_at: DateTime<Utc>,

    /// When the wallet was last modified
    pub updated_at: DateTime<Utc>,
}

/// Result of a balance adjustment
///
/// `actual_delta` is `new_balance - old_balance`; it differs from
/// `requested_delta` exactly when `clamped` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceAdjustment {
    /// Asset whose balance moved
    pub asset_id: AssetId,

    /// Signed delta the caller asked for
    pub requested_delta: Amount,

    /// Signed delta actually applied
    pub actual_delta: Amount,

    /// Balance after the adjustment
    pub new_balance: Amount,

    /// Whether the delta was reduced to respect the asset's floor
    pub clamped: bool,
}

/// A balance-holding asset: fiat account or bitcoin wallet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Asset {
    Fiat(FiatAsset),
    Bitcoin(BitcoinAsset),
}

impl Asset {
    /// Create a fiat account
    pub fn new_fiat(
        name: impl Into<String>,
        opening_balance: Amount,
        overdraft: Option<Overdraft>,
    ) -> Self {
        let now = Utc::now();
        Self::Fiat(FiatAsset {
            id: AssetId::new(),
            name: name.into(),
            balance: opening_balance,
            overdraft,
            created_at: now,
            updated_at: now,
        })
    }

    /// Create a bitcoin wallet
    pub fn new_bitcoin(
        name: impl Into<String>,
        wallet: WalletKind,
        opening_balance_sats: Amount,
    ) -> Self {
        let now = Utc::now();
        Self::Bitcoin(BitcoinAsset {
            id: AssetId::new(),
            name: name.into(),
            wallet,
            balance_sats: opening_balance_sats,
            created_at: now,
            updated_at: now,
        })
    }

    /// Unique identifier
    pub fn id(&self) -> AssetId {
        match self {
            Self::Fiat(a) => a.id,
            Self::Bitcoin(a) => a.id,
        }
    }

    /// Asset name
    pub fn name(&self) -> &str {
        match self {
            Self::Fiat(a) => &a.name,
            Self::Bitcoin(a) => &a.name,
        }
    }

    /// Current balance (won for fiat, satoshis for bitcoin)
    pub fn balance(&self) -> Amount {
        match self {
            Self::Fiat(a) => a.balance,
            Self::Bitcoin(a) => a.balance_sats,
        }
    }

    /// When the asset was last modified
    pub fn updated_at(&self) -> DateTime<Utc> {
        match self {
            Self::Fiat(a) => a.updated_at,
            Self::Bitcoin(a) => a.updated_at,
        }
    }

    /// True for fiat accounts
    pub fn is_fiat(&self) -> bool {
        matches!(self, Self::Fiat(_))
    }

    /// The lowest balance this asset may hold, if any
    ///
    /// Fiat without overdraft floors at zero, fiat with overdraft at
    /// `-credit_limit`. Bitcoin floors per `policy`.
    pub fn floor(&self, policy: BitcoinBalancePolicy) -> Option<Amount> {
        match self {
            Self::Fiat(a) => match &a.overdraft {
                Some(od) => Some(-od.credit_limit),
                None => Some(Amount::zero()),
            },
            Self::Bitcoin(_) => match policy {
                BitcoinBalancePolicy::AllowNegative => None,
                BitcoinBalancePolicy::NonNegative => Some(Amount::zero()),
            },
        }
    }

    /// Apply a signed delta to the balance, clamping to the floor
    ///
    /// The only sanctioned balance mutator. Clamping is a successful
    /// outcome, reported in the returned adjustment rather than as an error.
    pub fn apply_delta(
        &mut self,
        delta: Amount,
        policy: BitcoinBalancePolicy,
    ) -> BalanceAdjustment {
        let old = self.balance();
        let proposed = old + delta;
        let new = match self.floor(policy) {
            Some(floor) => proposed.max(floor),
            None => proposed,
        };
        self.set_balance(new);
        BalanceAdjustment {
            asset_id: self.id(),
            requested_delta: delta,
            actual_delta: new - old,
            new_balance: new,
            clamped: new != proposed,
        }
    }

    /// Clamp a persisted balance back above the floor
    ///
    /// Returns true when the balance was out of bounds and got repaired.
    /// Runs at load time to catch values written by an external edit or a
    /// since-fixed bug.
    pub fn repair_floor(&mut self, policy: BitcoinBalancePolicy) -> bool {
        let Some(floor) = self.floor(policy) else {
            return false;
        };
        if self.balance() >= floor {
            return false;
        }
        self.set_balance(floor);
        true
    }

    /// Validate the asset
    pub fn validate(&self) -> Result<(), AssetValidationError> {
        if self.name().trim().is_empty() {
            return Err(AssetValidationError::EmptyName);
        }
        if self.name().len() > 100 {
            return Err(AssetValidationError::NameTooLong(self.name().len()));
        }
        if let Self::Fiat(a) = self {
            if let Some(od) = &a.overdraft {
                if od.credit_limit.is_negative() {
                    return Err(AssetValidationError::NegativeCreditLimit);
                }
                if !od.interest_rate.is_finite() || od.interest_rate < 0.0 {
                    return Err(AssetValidationError::InvalidInterestRate);
                }
            }
        }
        Ok(())
    }

    fn set_balance(&mut self, new: Amount) {
        match self {
            Self::Fiat(a) => {
                a.balance = new;
                a.updated_at = Utc::now();
            }
            Self::Bitcoin(a) => {
                a.balance_sats = new;
                a.updated_at = Utc::now();
            }
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fiat(a) => write!(f, "{} ({} KRW)", a.name, a.balance),
            Self::Bitcoin(a) => write!(f, "{} ({} sats, {})", a.name, a.balance_sats, a.wallet),
        }
    }
}

/// Validation errors for assets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetValidationError {
    EmptyName,
    NameTooLong(usize),
    NegativeCreditLimit,
    InvalidInterestRate,
}

impl fmt::Display for AssetValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Asset name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Asset name too long ({} chars, max 100)", len)
            }
            Self::NegativeCreditLimit => write!(f, "Credit limit cannot be negative"),
            Self::InvalidInterestRate => write!(f, "Interest rate must be a non-negative number"),
        }
    }
}

impl std::error::Error for AssetValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> BitcoinBalancePolicy {
        BitcoinBalancePolicy::AllowNegative
    }

    #[test]
    fn test_fiat_floor_without_overdraft() {
        let asset = Asset::new_fiat("Checking", Amount::new(100_000), None);
        assert_eq!(asset.floor(policy()), Some(Amount::zero()));
    }

    #[test]
    fn test_fiat_floor_with_overdraft() {
        let od = Overdraft::new(Amount::new(500_000), 8.0);
        let asset = Asset::new_fiat("Overdraft", Amount::zero(), Some(od));
        assert_eq!(asset.floor(policy()), Some(Amount::new(-500_000)));
    }

    #[test]
    fn test_bitcoin_floor_follows_policy() {
        let asset = Asset::new_bitcoin("Cold", WalletKind::Onchain, Amount::new(1_000));
        assert_eq!(asset.floor(BitcoinBalancePolicy::AllowNegative), None);
        assert_eq!(
            asset.floor(BitcoinBalancePolicy::NonNegative),
            Some(Amount::zero())
        );
    }

    #[test]
    fn test_apply_delta_plain() {
        let mut asset = Asset::new_fiat("Checking", Amount::new(100_000), None);
        let adj = asset.apply_delta(Amount::new(-30_000), policy());

        assert!(!adj.clamped);
        assert_eq!(adj.requested_delta, Amount::new(-30_000));
        assert_eq!(adj.actual_delta, Amount::new(-30_000));
        assert_eq!(adj.new_balance, Amount::new(70_000));
        assert_eq!(asset.balance(), Amount::new(70_000));
    }

    #[test]
    fn test_apply_delta_clamps_at_zero() {
        let mut asset = Asset::new_fiat("Checking", Amount::new(20_000), None);
        let adj = asset.apply_delta(Amount::new(-50_000), policy());

        assert!(adj.clamped);
        assert_eq!(adj.requested_delta, Amount::new(-50_000));
        assert_eq!(adj.actual_delta, Amount::new(-20_000));
        assert_eq!(adj.new_balance, Amount::zero());
    }

    #[test]
    fn test_apply_delta_clamps_at_credit_limit() {
        let od = Overdraft::new(Amount::new(500_000), 8.0);
        let mut asset = Asset::new_fiat("Overdraft", Amount::new(-100_000), Some(od));
        let adj = asset.apply_delta(Amount::new(-450_000), policy());

        assert!(adj.clamped);
        assert_eq!(adj.requested_delta, Amount::new(-450_000));
        assert_eq!(adj.actual_delta, Amount::new(-400_000));
        assert_eq!(adj.new_balance, Amount::new(-500_000));
    }

    #[test]
    fn test_apply_delta_landing_on_floor_is_not_clamped() {
        let mut asset = Asset::new_fiat("Checking", Amount::new(30_000), None);
        let adj = asset.apply_delta(Amount::new(-30_000), policy());

        assert!(!adj.clamped);
        assert_eq!(adj.new_balance, Amount::zero());
    }

    #[test]
    fn test_apply_delta_zero_is_valid() {
        let mut asset = Asset::new_fiat("Checking", Amount::new(100_000), None);
        let adj = asset.apply_delta(Amount::zero(), policy());

        assert!(!adj.clamped);
        assert_eq!(adj.actual_delta, Amount::zero());
    }

    #[test]
    fn test_bitcoin_unclamped_by_default() {
        let mut asset = Asset::new_bitcoin("Phoenix", WalletKind::Lightning, Amount::new(5_000));
        let adj = asset.apply_delta(Amount::new(-8_000), policy());

        assert!(!adj.clamped);
        assert_eq!(adj.new_balance, Amount::new(-3_000));
    }

    #[test]
    fn test_bitcoin_clamped_under_non_negative_policy() {
        let mut asset = Asset::new_bitcoin("Phoenix", WalletKind::Lightning, Amount::new(5_000));
        let adj = asset.apply_delta(Amount::new(-8_000), BitcoinBalancePolicy::NonNegative);

        assert!(adj.clamped);
        assert_eq!(adj.actual_delta, Amount::new(-5_000));
        assert_eq!(adj.new_balance, Amount::zero());
    }

    #[test]
    fn test_repair_floor() {
        let mut asset = Asset::new_fiat("Checking", Amount::new(100), None);
        assert!(!asset.repair_floor(policy()));

        // Simulate a persisted out-of-bounds balance
        if let Asset::Fiat(a) = &mut asset {
            a.balance = Amount::new(-42);
        }
        assert!(asset.repair_floor(policy()));
        assert_eq!(asset.balance(), Amount::zero());
    }

    #[test]
    fn test_estimated_monthly_interest() {
        let od = Overdraft::new(Amount::new(500_000), 12.0);

        // 300,000 drawn at 12%/yr is 3,000 per month
        assert_eq!(
            od.estimated_monthly_interest(Amount::new(-300_000)),
            Amount::new(3_000)
        );
        assert_eq!(
            od.estimated_monthly_interest(Amount::new(50_000)),
            Amount::zero()
        );

        let with_override = Overdraft {
            estimated_interest: Some(Amount::new(1_234)),
            ..od
        };
        assert_eq!(
            with_override.estimated_monthly_interest(Amount::new(-300_000)),
            Amount::new(1_234)
        );
        // An undrawn account owes nothing even with an override on file
        assert_eq!(
            with_override.estimated_monthly_interest(Amount::new(50_000)),
            Amount::zero()
        );
        assert_eq!(
            with_override.estimated_monthly_interest(Amount::zero()),
            Amount::zero()
        );
    }

    #[test]
    fn test_validation() {
        let mut asset = Asset::new_fiat("Valid", Amount::zero(), None);
        assert!(asset.validate().is_ok());

        if let Asset::Fiat(a) = &mut asset {
            a.name = String::new();
        }
        assert_eq!(asset.validate(), Err(AssetValidationError::EmptyName));

        let bad_limit = Asset::new_fiat(
            "Bad",
            Amount::zero(),
            Some(Overdraft::new(Amount::new(-1), 5.0)),
        );
        assert_eq!(
            bad_limit.validate(),
            Err(AssetValidationError::NegativeCreditLimit)
        );
    }

    #[test]
    fn test_serde_kind_tag() {
        let asset = Asset::new_bitcoin("Cold", WalletKind::Onchain, Amount::new(100));
        let json = serde_json::to_string(&asset).unwrap();
        assert!(json.contains("\"kind\":\"bitcoin\""));

        let back: Asset = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id(), asset.id());
        assert_eq!(back.balance(), Amount::new(100));
    }
}
