//! Import orchestration - the daily pull-parse-normalize-load cycle.

mod import_model;
mod import_traits;
mod orchestrator;

#[cfg(test)]
mod orchestrator_tests;

pub use import_model::{DayImportResult, ImportRun, ImportRunStatus};
pub use import_traits::{ImportRunRepositoryTrait, ImportServiceTrait};
pub use orchestrator::ImportOrchestrator;
