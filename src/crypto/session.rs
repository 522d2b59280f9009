//! Session key management
//!
//! `SessionKeys` owns the derived key for the current unlocked session and
//! is the single place the key lives in memory. Services check the
//! `KeyProvider` seam before any mutation; a locked session refuses with
//! `AuthRequired` instead of writing unencrypted or defaulting a key.

use crate::config::settings::Settings;
use crate::error::{LedgerError, LedgerResult};

use super::encryption::{decrypt_string, encrypt_string};
use super::key_derivation::{derive_key, DerivedKey, KeyDerivationParams};

/// Marker sealed into the settings on first unlock; decrypting it back
/// proves a passphrase matches without storing any derivative of the
/// passphrase itself.
const VERIFICATION_MARKER: &str = "satbook_verify";

/// Source of the session encryption key
pub trait KeyProvider {
    /// The current session key, or None while locked
    fn encryption_key(&self) -> Option<&DerivedKey>;

    /// The session key, or `AuthRequired` while locked
    fn require_key(&self) -> LedgerResult<&DerivedKey> {
        self.encryption_key().ok_or(LedgerError::AuthRequired)
    }
}

/// Holds the derived key for an unlocked session
pub struct SessionKeys {
    key: Option<DerivedKey>,
}

impl SessionKeys {
    /// Create a locked session
    pub fn locked() -> Self {
        Self { key: None }
    }

    /// Whether a key is currently held
    pub fn is_unlocked(&self) -> bool {
        self.key.is_some()
    }

    /// Unlock with a passphrase
    ///
    /// On first use (no stored parameters) this initializes the key
    /// derivation parameters and the verification blob in `settings`; the
    /// caller decides when to persist them. On later unlocks the passphrase
    /// is checked against the stored blob and a mismatch is
    /// `InvalidPassphrase`, leaving the session locked.
    pub fn unlock(&mut self, passphrase: &str, settings: &mut Settings) -> LedgerResult<()> {
        match (&settings.encryption.key_params, &settings.encryption.verification) {
            (Some(params), Some(verification)) => {
                let key = derive_key(passphrase, params)?;
                let marker = decrypt_string(verification, &key)
                    .map_err(|_| LedgerError::InvalidPassphrase)?;
                if marker != VERIFICATION_MARKER {
                    return Err(LedgerError::InvalidPassphrase);
                }
                self.key = Some(key);
            }
            _ => {
                // First unlock sets up the encryption parameters
                let params = KeyDerivationParams::new();
                let key = derive_key(passphrase, &params)?;
                let verification = encrypt_string(VERIFICATION_MARKER, &key)?;
                settings.encryption.key_params = Some(params);
                settings.encryption.verification = Some(verification);
                self.key = Some(key);
            }
        }
        Ok(())
    }

    /// Drop the session key
    pub fn lock(&mut self) {
        self.key = None;
    }
}

impl KeyProvider for SessionKeys {
    fn encryption_key(&self) -> Option<&DerivedKey> {
        self.key.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locked_session_has_no_key() {
        let session = SessionKeys::locked();
        assert!(!session.is_unlocked());
        assert!(session.encryption_key().is_none());
        assert!(matches!(
            session.require_key(),
            Err(LedgerError::AuthRequired)
        ));
    }

    #[test]
    fn test_first_unlock_initializes_settings() {
        let mut settings = Settings::default();
        let mut session = SessionKeys::locked();

        session.unlock("correct horse", &mut settings).unwrap();

        assert!(session.is_unlocked());
        assert!(settings.encryption.key_params.is_some());
        assert!(settings.encryption.verification.is_some());
    }

    #[test]
    fn test_unlock_with_matching_passphrase() {
        let mut settings = Settings::default();
        let mut session = SessionKeys::locked();
        session.unlock("correct horse", &mut settings).unwrap();
        session.lock();
        assert!(!session.is_unlocked());

        session.unlock("correct horse", &mut settings).unwrap();
        assert!(session.is_unlocked());
    }

    #[test]
    fn test_unlock_with_wrong_passphrase() {
        let mut settings = Settings::default();
        let mut session = SessionKeys::locked();
        session.unlock("correct horse", &mut settings).unwrap();
        session.lock();

        let result = session.unlock("battery staple", &mut settings);
        assert!(matches!(result, Err(LedgerError::InvalidPassphrase)));
        assert!(!session.is_unlocked());
    }

    #[test]
    fn test_lock_drops_key() {
        let mut settings = Settings::default();
        let mut session = SessionKeys::locked();
        session.unlock("correct horse", &mut settings).unwrap();

        session.lock();
        assert!(session.encryption_key().is_none());
    }
}
