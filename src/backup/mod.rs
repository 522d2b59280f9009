//! Backup system for satbook
//!
//! Provides rolling encrypted backups with configurable retention and
//! strict, all-or-nothing restore.
//!
//! # Backup Format
//!
//! A backup is a single `.sbk` file named
//! `satbook-backup-YYYYMMDD-HHMMSS.sbk`. The outer JSON is plaintext and
//! carries only a `marker`, a container `version`, and one encrypted
//! `payload`. The payload seals the full data set: assets, ledger records,
//! and loans, plus the schema version and creation timestamp.
//!
//! # Retention Policy
//!
//! By default the newest 30 backups are kept, plus the newest backup of
//! each of the last 12 months that has one.
//!
//! # Restore
//!
//! `validate_backup` checks the extension, marker, version, decryption,
//! and the full typed parse of the payload; any failure is
//! `RestoreInvalid`. `restore_backup` runs the same validation and only
//! then replaces every collection, so a bad file changes nothing.
//!
//! # Example
//!
//! ```rust,ignore
//! use satbook::backup::{restore_backup, BackupManager};
//!
//! let manager = BackupManager::new(paths.backup_dir(), retention);
//! let (location, _deleted) = manager.create_backup_with_retention(&store, key)?;
//!
//! // Later, restore from it
//! let report = restore_backup(&mut store, &location.path, key)?;
//! println!("{}", report.summary());
//! ```

pub mod manager;
pub mod restore;

pub use manager::{BackupArchive, BackupFile, BackupInfo, BackupLocation, BackupManager};
pub use restore::{restore_backup, validate_backup, RestoreReport};
