//! Audit logging for satbook
//!
//! Records create, update, delete, balance-adjust, and restore operations
//! in an append-only encrypted JSONL log. Each line is its own
//! `EncryptedData` envelope, so the log can grow by appending without
//! rewriting previous entries.

mod entry;
mod logger;

pub use entry::{AuditEntry, EntityKind, Operation};
pub use logger::AuditLog;
