//! Daily reconciliation - balance verification and narrative output.

mod engine;
mod narrative;
mod reconciliation_errors;
mod reconciliation_model;
mod reconciliation_service;
mod reconciliation_traits;


pub use engine::{compute_day_breakdown, reconcile_day, DayBreakdown};
pub use narrative::render_narrative;
pub use reconciliation_errors::ReconciliationError;
pub use reconciliation_model::{DailySummary, DayReport};
pub use reconciliation_service::ReconciliationService;
pub use reconciliation_traits::{
    NavObservationRepositoryTrait, ReconciliationServiceTrait, SummaryRepositoryTrait,
};
