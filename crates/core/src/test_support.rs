//! In-memory repository doubles shared by the service test modules.

use crate::events::{FinancialEvent, NavObservation, SyntheticStatus};
use crate::import::{ImportRun, ImportRunRepositoryTrait};
use crate::ledger::{CorrectedEconomics, LedgerRepositoryTrait};
use crate::reconciliation::{
    DailySummary, NavObservationRepositoryTrait, SummaryRepositoryTrait,
};
use crate::errors::DatabaseError;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub(crate) struct MockLedgerRepository {
    pub events: Arc<Mutex<Vec<FinancialEvent>>>,
}

impl MockLedgerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<FinancialEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerRepositoryTrait for MockLedgerRepository {
    async fn append(&self, event: &FinancialEvent) -> Result<bool> {
        let mut events = self.events.lock().unwrap();
        let duplicate = if event.is_synthetic {
            events.iter().any(|e| {
                e.account_id == event.account_id
                    && e.contract_key == event.contract_key
                    && e.expiration_date == event.expiration_date
            })
        } else {
            events.iter().any(|e| {
                e.source_transaction_id.is_some()
                    && e.source_transaction_id == event.source_transaction_id
            })
        };
        if duplicate {
            return Ok(false);
        }
        events.push(event.clone());
        Ok(true)
    }

    fn get_event(&self, event_id: &str) -> Result<FinancialEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == event_id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(event_id.to_string()).into())
    }

    fn get_events_in_range(
        &self,
        account_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<FinancialEvent>> {
        let mut events: Vec<FinancialEvent> = self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.account_id == account_id && e.timestamp >= start && e.timestamp < end)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }

    fn get_events_for_contract(
        &self,
        account_id: &str,
        contract_key: &str,
        expiration_date: NaiveDate,
    ) -> Result<Vec<FinancialEvent>> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| {
                e.account_id == account_id
                    && e.contract_key.as_deref() == Some(contract_key)
                    && e.expiration_date == Some(expiration_date)
            })
            .cloned()
            .collect())
    }

    fn get_unvalidated_synthetics(
        &self,
        account_id: &str,
        expiration_date: Option<NaiveDate>,
    ) -> Result<Vec<FinancialEvent>> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| {
                e.account_id == account_id
                    && e.is_synthetic
                    && e.synthetic_status == SyntheticStatus::Unknown
                    && expiration_date.is_none_or(|d| e.expiration_date == Some(d))
            })
            .cloned()
            .collect())
    }

    fn get_synthetic_events(&self, account_id: &str) -> Result<Vec<FinancialEvent>> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.account_id == account_id && e.is_synthetic)
            .cloned()
            .collect())
    }

    async fn mark_synthetic_validation(
        &self,
        event_id: &str,
        outcome: SyntheticStatus,
        confirmed_timestamp: Option<DateTime<Utc>>,
        corrected: Option<CorrectedEconomics>,
    ) -> Result<()> {
        let mut events = self.events.lock().unwrap();
        let event = events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| crate::errors::Error::from(DatabaseError::NotFound(event_id.to_string())))?;
        event.synthetic_status = outcome;
        event.confirmed_timestamp = confirmed_timestamp;
        if let Some(corrected) = corrected {
            event.cash_impact = corrected.cash_impact;
            event.realized_pnl = corrected.realized_pnl;
            event.commission = corrected.commission;
        }
        event.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Clone, Default)]
pub(crate) struct MockSummaryRepository {
    pub summaries: Arc<Mutex<Vec<DailySummary>>>,
}

impl MockSummaryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SummaryRepositoryTrait for MockSummaryRepository {
    async fn save_summary(&self, summary: &DailySummary) -> Result<()> {
        let mut summaries = self.summaries.lock().unwrap();
        summaries.retain(|s| s.id != summary.id);
        summaries.push(summary.clone());
        Ok(())
    }

    fn get_summary(&self, account_id: &str, date: NaiveDate) -> Result<Option<DailySummary>> {
        Ok(self
            .summaries
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.account_id == account_id && s.date == date)
            .cloned())
    }

    fn get_summaries_in_range(
        &self,
        account_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailySummary>> {
        let mut summaries: Vec<DailySummary> = self
            .summaries
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.account_id == account_id && s.date >= start && s.date <= end)
            .cloned()
            .collect();
        summaries.sort_by_key(|s| s.date);
        Ok(summaries)
    }
}

#[derive(Clone, Default)]
pub(crate) struct MockNavRepository {
    pub observations: Arc<Mutex<Vec<NavObservation>>>,
}

impl MockNavRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nav(self, account_id: &str, date: NaiveDate, nav: rust_decimal::Decimal) -> Self {
        self.observations.lock().unwrap().push(NavObservation {
            account_id: account_id.to_string(),
            date,
            nav,
            source: "TEST".to_string(),
        });
        self
    }
}

#[async_trait]
impl NavObservationRepositoryTrait for MockNavRepository {
    async fn save_observation(&self, observation: &NavObservation) -> Result<()> {
        let mut observations = self.observations.lock().unwrap();
        observations
            .retain(|o| !(o.account_id == observation.account_id && o.date == observation.date));
        observations.push(observation.clone());
        Ok(())
    }

    fn get_observation(&self, account_id: &str, date: NaiveDate) -> Result<Option<NavObservation>> {
        Ok(self
            .observations
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.account_id == account_id && o.date == date)
            .cloned())
    }

    fn get_latest_observation_before(
        &self,
        account_id: &str,
        date: NaiveDate,
    ) -> Result<Option<NavObservation>> {
        Ok(self
            .observations
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.account_id == account_id && o.date < date)
            .max_by_key(|o| o.date)
            .cloned())
    }
}

#[derive(Clone, Default)]
pub(crate) struct MockImportRunRepository {
    pub runs: Arc<Mutex<Vec<ImportRun>>>,
}

impl MockImportRunRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImportRunRepositoryTrait for MockImportRunRepository {
    async fn save_run(&self, run: &ImportRun) -> Result<()> {
        let mut runs = self.runs.lock().unwrap();
        runs.retain(|r| !(r.account_id == run.account_id && r.run_date == run.run_date));
        runs.push(run.clone());
        Ok(())
    }

    fn get_run(&self, account_id: &str, run_date: NaiveDate) -> Result<Option<ImportRun>> {
        Ok(self
            .runs
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.account_id == account_id && r.run_date == run_date)
            .cloned())
    }
}
