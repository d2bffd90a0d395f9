//! Repository and service traits for daily reconciliation.

use crate::events::NavObservation;
use crate::reconciliation::reconciliation_model::{DailySummary, DayReport};
use crate::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Repository trait for daily summary rows.
///
/// Summaries are derived data owned exclusively by the reconciliation
/// engine; `save_summary` is an upsert and every run recomputes the row
/// in full.
#[async_trait]
pub trait SummaryRepositoryTrait: Send + Sync {
    async fn save_summary(&self, summary: &DailySummary) -> Result<()>;

    fn get_summary(&self, account_id: &str, date: NaiveDate) -> Result<Option<DailySummary>>;

    fn get_summaries_in_range(
        &self,
        account_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailySummary>>;
}

/// Repository trait for broker-reported NAV observations.
#[async_trait]
pub trait NavObservationRepositoryTrait: Send + Sync {
    /// Upsert; the latest observation for an account and date wins.
    async fn save_observation(&self, observation: &NavObservation) -> Result<()>;

    fn get_observation(&self, account_id: &str, date: NaiveDate)
        -> Result<Option<NavObservation>>;

    /// The most recent observation strictly before `date`; the opening NAV
    /// for a day is the previous close.
    fn get_latest_observation_before(
        &self,
        account_id: &str,
        date: NaiveDate,
    ) -> Result<Option<NavObservation>>;
}

/// Trait defining the contract for reconciliation service operations.
#[async_trait]
pub trait ReconciliationServiceTrait: Send + Sync {
    /// Recomputes and stores the summary for one day and renders its
    /// narrative. Safe to re-run at any time.
    async fn reconcile_day(&self, account_id: &str, date: NaiveDate) -> Result<DayReport>;

    fn get_summary(&self, account_id: &str, date: NaiveDate) -> Result<Option<DailySummary>>;

    fn get_summaries_in_range(
        &self,
        account_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailySummary>>;
}
