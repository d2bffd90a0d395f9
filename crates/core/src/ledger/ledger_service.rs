use crate::constants::EXCHANGE_TZ;
use crate::errors::Error;
use crate::events::{EventType, FinancialEvent, SyntheticStatus};
use crate::ledger::ledger_traits::{
    CorrectedEconomics, LedgerRepositoryTrait, LedgerServiceTrait,
};
use crate::synthetic::assess_against_authoritative;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use log::{debug, warn};
use std::sync::Arc;

/// Intra-day ordering rank for events sharing a timestamp.
///
/// Batch-imported records frequently share a timestamp; narrative output
/// must still be stable and reproducible, so ties are broken by event
/// class before falling back to the event id.
pub fn intra_day_rank(event_type: EventType) -> u8 {
    match event_type {
        EventType::Deposit | EventType::Withdrawal => 0,
        EventType::Trade => 1,
        EventType::OptionExpiration
        | EventType::OptionAssignment
        | EventType::OptionAssignmentAssumed => 2,
        EventType::InterestAccrual => 3,
        EventType::Fee | EventType::Commission => 4,
    }
}

/// UTC bounds `[start, end)` of one exchange-local calendar day.
pub fn day_bounds_utc(date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = local_midnight_utc(date)?;
    let next = date
        .checked_add_days(Days::new(1))
        .ok_or_else(|| Error::Unexpected(format!("date overflow after {}", date)))?;
    let end = local_midnight_utc(next)?;
    Ok((start, end))
}

fn local_midnight_utc(date: NaiveDate) -> Result<DateTime<Utc>> {
    let midnight = date.and_time(NaiveTime::MIN);
    EXCHANGE_TZ
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| Error::Unexpected(format!("no exchange-local midnight for {}", date)))
}

/// Service facade over the ledger store: dedup appends with authoritative-
/// over-synthetic precedence, trading-day queries in narrative order, and
/// the synthetic validation mutation.
#[derive(Clone)]
pub struct LedgerService {
    repository: Arc<dyn LedgerRepositoryTrait>,
}

impl LedgerService {
    pub fn new(repository: Arc<dyn LedgerRepositoryTrait>) -> Self {
        Self { repository }
    }

    /// An authoritative exercise/expiry record arriving for a contract that
    /// already carries a synthetic event supersedes the synthetic in place
    /// rather than inserting a second row, keeping the event count for the
    /// contract at exactly one. Returns `Some(false)` when the record was
    /// absorbed this way.
    async fn absorb_into_synthetic(&self, event: &FinancialEvent) -> Result<Option<bool>> {
        if event.is_synthetic || !event.event_type.is_option_lifecycle() {
            return Ok(None);
        }
        let (contract_key, expiration) = match (&event.contract_key, event.expiration_date) {
            (Some(key), Some(expiration)) => (key, expiration),
            _ => return Ok(None),
        };

        let existing =
            self.repository
                .get_events_for_contract(&event.account_id, contract_key, expiration)?;
        let synthetic = match existing.iter().find(|e| e.is_synthetic) {
            Some(s) => s,
            None => return Ok(None),
        };

        // A replayed authoritative record after validation is a no-op; the
        // recorded verdict (including a Contradicted audit trail) stands.
        if synthetic.synthetic_status != SyntheticStatus::Unknown {
            return Ok(Some(false));
        }

        let (outcome, corrected) = assess_against_authoritative(synthetic, event);
        if outcome == SyntheticStatus::Contradicted {
            warn!(
                "Synthetic assumption contradicted for {} exp {}: assumed ({}, pnl {}) vs authoritative ({}, pnl {})",
                contract_key,
                expiration,
                synthetic.event_type,
                synthetic.realized_pnl,
                event.event_type,
                event.realized_pnl
            );
        }
        self.repository
            .mark_synthetic_validation(&synthetic.id, outcome, Some(event.timestamp), corrected)
            .await?;
        Ok(Some(false))
    }
}

#[async_trait]
impl LedgerServiceTrait for LedgerService {
    async fn append(&self, event: &FinancialEvent) -> Result<bool> {
        if let Some(absorbed) = self.absorb_into_synthetic(event).await? {
            return Ok(absorbed);
        }
        self.repository.append(event).await
    }

    async fn append_batch(&self, events: &[FinancialEvent]) -> Result<usize> {
        let mut inserted = 0usize;
        for event in events {
            if self.append(event).await? {
                inserted += 1;
            } else {
                debug!(
                    "Skipping duplicate event (source tx {:?}) for account {}",
                    event.source_transaction_id, event.account_id
                );
            }
        }
        Ok(inserted)
    }

    fn events_for_day(&self, account_id: &str, date: NaiveDate) -> Result<Vec<FinancialEvent>> {
        let (start, end) = day_bounds_utc(date)?;
        let mut events = self.repository.get_events_in_range(account_id, start, end)?;
        events.sort_by(|a, b| {
            (a.timestamp, intra_day_rank(a.event_type), &a.id).cmp(&(
                b.timestamp,
                intra_day_rank(b.event_type),
                &b.id,
            ))
        });
        Ok(events)
    }

    fn events_for_contract(
        &self,
        account_id: &str,
        contract_key: &str,
        expiration_date: NaiveDate,
    ) -> Result<Vec<FinancialEvent>> {
        self.repository
            .get_events_for_contract(account_id, contract_key, expiration_date)
    }

    fn unvalidated_synthetics(
        &self,
        account_id: &str,
        expiration_date: Option<NaiveDate>,
    ) -> Result<Vec<FinancialEvent>> {
        self.repository
            .get_unvalidated_synthetics(account_id, expiration_date)
    }

    fn synthetic_events(&self, account_id: &str) -> Result<Vec<FinancialEvent>> {
        self.repository.get_synthetic_events(account_id)
    }

    async fn mark_synthetic_validation(
        &self,
        event_id: &str,
        outcome: SyntheticStatus,
        confirmed_timestamp: Option<DateTime<Utc>>,
        corrected: Option<CorrectedEconomics>,
    ) -> Result<()> {
        self.repository
            .mark_synthetic_validation(event_id, outcome, confirmed_timestamp, corrected)
            .await
    }
}
