//! Inventory reconciliation core: request transitions and their paired
//! inventory adjustments. Everything here is pure; persistence and locking
//! belong to [`crate::services::lending`].

pub mod ledger;
pub mod returns;
pub mod state_machine;

pub use ledger::LedgerEntry;
pub use state_machine::Transition;
