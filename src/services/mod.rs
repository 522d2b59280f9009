//! Service layer for satbook
//!
//! The service layer provides business logic on top of the storage layer:
//! validation, snapshot resolution, balance propagation, and the derived
//! loan figures. Every mutating operation requires an unlocked session and
//! follows the same write path: validate, persist, audit, then propagate.

pub mod assets;
pub mod loans;
pub mod price_sync;
pub mod records;

pub use assets::{AssetPatch, AssetService};
pub use loans::{LoanInput, LoanPatch, LoanService};
pub use price_sync::{PriceSyncReport, PriceSyncService};
pub use records::{
    ExpenseInput, IncomeInput, PropagationOutcome, RecordOutcome, RecordPatch, RecordService,
    SnapshotOutcome, TransferInput,
};
