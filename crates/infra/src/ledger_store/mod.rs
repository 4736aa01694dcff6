//! Movement storage and balance derivation.
//!
//! The store owns the movement set; the balance is always derived from it.
//! Every create/update/delete is audited as part of the same logical unit.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use r#trait::{LedgerStore, MovementPage, MovementQuery, Reconciliation};
