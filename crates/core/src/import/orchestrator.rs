use crate::events::{extract_nav_observations, normalize_batch, RawBrokerRecord};
use crate::import::import_model::{DayImportResult, ImportRun};
use crate::import::import_traits::{ImportRunRepositoryTrait, ImportServiceTrait};
use crate::ledger::LedgerServiceTrait;
use crate::reconciliation::{NavObservationRepositoryTrait, ReconciliationServiceTrait};
use crate::synthetic::{
    ExpiringPosition, ResolutionOutcome, SyntheticResolverTrait, ValidationReport,
};
use crate::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{error, info};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Drives the daily pull-parse-normalize-load cycle and triggers
/// reconciliation. All state lives in the stores handed in at
/// construction; the orchestrator itself is stateless.
#[derive(Clone)]
pub struct ImportOrchestrator {
    ledger: Arc<dyn LedgerServiceTrait>,
    resolver: Arc<dyn SyntheticResolverTrait>,
    reconciliation: Arc<dyn ReconciliationServiceTrait>,
    nav_observations: Arc<dyn NavObservationRepositoryTrait>,
    runs: Arc<dyn ImportRunRepositoryTrait>,
}

impl ImportOrchestrator {
    pub fn new(
        ledger: Arc<dyn LedgerServiceTrait>,
        resolver: Arc<dyn SyntheticResolverTrait>,
        reconciliation: Arc<dyn ReconciliationServiceTrait>,
        nav_observations: Arc<dyn NavObservationRepositoryTrait>,
        runs: Arc<dyn ImportRunRepositoryTrait>,
    ) -> Self {
        Self {
            ledger,
            resolver,
            reconciliation,
            nav_observations,
            runs,
        }
    }

    async fn process_day(
        &self,
        account_id: &str,
        date: NaiveDate,
        records: &[RawBrokerRecord],
    ) -> Result<DayImportResult> {
        // Normalization is parallel and pure; everything after it is a
        // strictly serial append phase, which keeps the run deterministic.
        let batch = normalize_batch(account_id, records);

        for observation in extract_nav_observations(account_id, records) {
            self.nav_observations.save_observation(&observation).await?;
        }

        // Authoritative settlements for an earlier session may arrive in
        // this batch; their expiration days need recomputing too.
        let settled_earlier: BTreeSet<NaiveDate> = batch
            .events
            .iter()
            .filter(|e| e.event_type.is_option_lifecycle())
            .filter_map(|e| e.expiration_date)
            .filter(|d| *d < date)
            .collect();

        let events_appended = self.ledger.append_batch(&batch.events).await?;

        for earlier_date in settled_earlier {
            self.reconciliation
                .reconcile_day(account_id, earlier_date)
                .await?;
        }
        let report = self.reconciliation.reconcile_day(account_id, date).await?;

        Ok(DayImportResult {
            events_appended,
            skipped: batch.skipped,
            summary: report.summary,
            narrative: report.narrative,
        })
    }
}

#[async_trait]
impl ImportServiceTrait for ImportOrchestrator {
    async fn build_ledger_for_day(
        &self,
        account_id: &str,
        date: NaiveDate,
        records: &[RawBrokerRecord],
    ) -> Result<DayImportResult> {
        let run = ImportRun::start(account_id, date, records.len());
        self.runs.save_run(&run).await?;

        match self.process_day(account_id, date, records).await {
            Ok(result) => {
                self.runs
                    .save_run(&run.complete(result.events_appended, result.skipped.len()))
                    .await?;
                info!(
                    "Imported {} events ({} skipped) for account '{}' on {}",
                    result.events_appended,
                    result.skipped.len(),
                    account_id,
                    date
                );
                Ok(result)
            }
            Err(e) => {
                error!(
                    "Import failed for account '{}' on {}: {}",
                    account_id, date, e
                );
                self.runs.save_run(&run.fail(e.to_string())).await?;
                Err(e)
            }
        }
    }

    async fn resolve_expirations(
        &self,
        account_id: &str,
        date: NaiveDate,
        positions: &[ExpiringPosition],
    ) -> Result<ResolutionOutcome> {
        let outcome = self
            .resolver
            .resolve_expirations(account_id, date, positions)
            .await?;
        if !outcome.emitted.is_empty() {
            self.reconciliation.reconcile_day(account_id, date).await?;
        }
        Ok(outcome)
    }

    async fn validate_synthetic_events(
        &self,
        account_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<ValidationReport> {
        let report = self.resolver.validate(account_id, date).await?;

        // A fresh verdict changes the economics of the expiration day;
        // recompute each affected summary.
        let affected: BTreeSet<NaiveDate> = report
            .entries
            .iter()
            .filter(|e| e.validated_this_pass)
            .filter_map(|e| e.expiration_date)
            .collect();
        for affected_date in affected {
            self.reconciliation
                .reconcile_day(account_id, affected_date)
                .await?;
        }

        Ok(report)
    }

    async fn backfill(
        &self,
        account_id: &str,
        days: Vec<(NaiveDate, Vec<RawBrokerRecord>)>,
    ) -> Vec<(NaiveDate, Result<DayImportResult>)> {
        let mut results = Vec::with_capacity(days.len());
        for (date, records) in days {
            let result = self.build_ledger_for_day(account_id, date, &records).await;
            if let Err(e) = &result {
                // Failures are isolated per day; the backfill continues.
                error!(
                    "Backfill day {} failed for account '{}': {}",
                    date, account_id, e
                );
            }
            results.push((date, result));
        }
        results
    }
}
