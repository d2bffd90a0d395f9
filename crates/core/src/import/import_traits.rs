use crate::events::RawBrokerRecord;
use crate::import::import_model::{DayImportResult, ImportRun};
use crate::synthetic::{ExpiringPosition, ResolutionOutcome, ValidationReport};
use crate::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Repository trait for import run checkpoints.
#[async_trait]
pub trait ImportRunRepositoryTrait: Send + Sync {
    /// Upsert; one row per (account, run date).
    async fn save_run(&self, run: &ImportRun) -> Result<()>;

    fn get_run(&self, account_id: &str, run_date: NaiveDate) -> Result<Option<ImportRun>>;
}

/// Trait defining the contract for the import orchestrator.
#[async_trait]
pub trait ImportServiceTrait: Send + Sync {
    /// Runs one day's full cycle: normalize the raw records, route NAV
    /// snapshots to the observation store, append serially, reconcile.
    /// Idempotent: re-running the same day from scratch is safe.
    async fn build_ledger_for_day(
        &self,
        account_id: &str,
        date: NaiveDate,
        records: &[RawBrokerRecord],
    ) -> Result<DayImportResult>;

    /// After-close synthetic pass over the day's expiring positions, then
    /// a fresh reconciliation of the day.
    async fn resolve_expirations(
        &self,
        account_id: &str,
        date: NaiveDate,
        positions: &[ExpiringPosition],
    ) -> Result<ResolutionOutcome>;

    /// Runs the synthetic validation pass and recomputes the summaries of
    /// any day whose events were corrected.
    async fn validate_synthetic_events(
        &self,
        account_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<ValidationReport>;

    /// Processes several days independently; one day's failure never
    /// prevents the remaining days from completing.
    async fn backfill(
        &self,
        account_id: &str,
        days: Vec<(NaiveDate, Vec<RawBrokerRecord>)>,
    ) -> Vec<(NaiveDate, Result<DayImportResult>)>;
}
