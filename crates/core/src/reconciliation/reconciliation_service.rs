use crate::ledger::LedgerServiceTrait;
use crate::reconciliation::engine::{compute_day_breakdown, reconcile_day};
use crate::reconciliation::narrative::render_narrative;
use crate::reconciliation::reconciliation_model::{DailySummary, DayReport};
use crate::reconciliation::reconciliation_traits::{
    NavObservationRepositoryTrait, ReconciliationServiceTrait, SummaryRepositoryTrait,
};
use crate::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use std::sync::Arc;

/// Proves that a day's ending balance is explained by its starting balance
/// plus every recorded event, and narrates the day.
///
/// Reads the ledger; owns the derived summary rows.
#[derive(Clone)]
pub struct ReconciliationService {
    ledger: Arc<dyn LedgerServiceTrait>,
    summaries: Arc<dyn SummaryRepositoryTrait>,
    nav_observations: Arc<dyn NavObservationRepositoryTrait>,
}

impl ReconciliationService {
    pub fn new(
        ledger: Arc<dyn LedgerServiceTrait>,
        summaries: Arc<dyn SummaryRepositoryTrait>,
        nav_observations: Arc<dyn NavObservationRepositoryTrait>,
    ) -> Self {
        Self {
            ledger,
            summaries,
            nav_observations,
        }
    }
}

#[async_trait]
impl ReconciliationServiceTrait for ReconciliationService {
    async fn reconcile_day(&self, account_id: &str, date: NaiveDate) -> Result<DayReport> {
        debug!("Reconciling account '{}' for {}", account_id, date);

        let events = self.ledger.events_for_day(account_id, date)?;

        let opening_nav = self
            .nav_observations
            .get_latest_observation_before(account_id, date)?
            .map(|o| o.nav);
        let observed_closing = self
            .nav_observations
            .get_observation(account_id, date)?
            .map(|o| o.nav);

        let breakdown = compute_day_breakdown(&events);
        let summary = reconcile_day(account_id, date, opening_nav, observed_closing, &breakdown);

        if !summary.is_reconciled {
            warn!(
                "DISCREPANCY for account '{}' on {}: closing NAV off by {} from the ledger-implied value",
                account_id, date, summary.reconciliation_difference
            );
        }

        let narrative = render_narrative(&summary, &events);
        self.summaries.save_summary(&summary).await?;

        Ok(DayReport { summary, narrative })
    }

    fn get_summary(&self, account_id: &str, date: NaiveDate) -> Result<Option<DailySummary>> {
        self.summaries.get_summary(account_id, date)
    }

    fn get_summaries_in_range(
        &self,
        account_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailySummary>> {
        self.summaries.get_summaries_in_range(account_id, start, end)
    }
}
