//! Chronological ledger - append-only event store access.

mod ledger_service;
mod ledger_traits;


pub use ledger_service::{day_bounds_utc, intra_day_rank, LedgerService};
pub use ledger_traits::{CorrectedEconomics, LedgerRepositoryTrait, LedgerServiceTrait};
