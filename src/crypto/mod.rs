//! Cryptographic functions for satbook
//!
//! Provides AES-256-GCM encryption with Argon2id key derivation for
//! at-rest encryption of all ledger data, plus the session key seam
//! services check before mutating.

pub mod encryption;
pub mod key_derivation;
pub mod session;

pub use encryption::{decrypt, decrypt_string, encrypt, encrypt_string, EncryptedData};
pub use key_derivation::{derive_key, DerivedKey, KeyDerivationParams};
pub use session::{KeyProvider, SessionKeys};
