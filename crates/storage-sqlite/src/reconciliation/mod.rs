mod model;
mod repository;

pub use model::{DailySummaryDB, NavObservationDB};
pub use repository::{NavObservationRepository, SummaryRepository};
