use crate::events::{FinancialEvent, SyntheticStatus};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

/// Authoritative economics applied to a synthetic event when validation
/// finds the assumption was wrong. Supersedes in place; never duplicates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectedEconomics {
    pub cash_impact: Decimal,
    pub realized_pnl: Decimal,
    pub commission: Decimal,
}

/// Trait defining the contract for ledger storage operations.
///
/// The store is the sole owner of write access to event records. Writes
/// are serialized per database by the storage layer; reads may run
/// concurrently.
#[async_trait]
pub trait LedgerRepositoryTrait: Send + Sync {
    /// Inserts the event if it is not already present.
    ///
    /// Dedup key: `source_transaction_id` for authoritative events,
    /// `(account_id, contract_key, expiration_date)` for synthetic ones.
    /// A duplicate is a no-op returning `false`, not an error.
    async fn append(&self, event: &FinancialEvent) -> Result<bool>;

    fn get_event(&self, event_id: &str) -> Result<FinancialEvent>;

    /// All events for the account with `start <= timestamp < end`,
    /// ordered by timestamp ascending.
    fn get_events_in_range(
        &self,
        account_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<FinancialEvent>>;

    /// Every event (synthetic or authoritative) recorded for one option
    /// contract and expiration.
    fn get_events_for_contract(
        &self,
        account_id: &str,
        contract_key: &str,
        expiration_date: NaiveDate,
    ) -> Result<Vec<FinancialEvent>>;

    /// Synthetic events still awaiting an authoritative verdict, optionally
    /// restricted to one expiration date.
    fn get_unvalidated_synthetics(
        &self,
        account_id: &str,
        expiration_date: Option<NaiveDate>,
    ) -> Result<Vec<FinancialEvent>>;

    /// All synthetic events for the account, for the audit report.
    fn get_synthetic_events(&self, account_id: &str) -> Result<Vec<FinancialEvent>>;

    /// The only permitted mutation of a stored event: records the
    /// validation outcome, the authoritative event time, and (for
    /// contradictions) the corrected economics.
    async fn mark_synthetic_validation(
        &self,
        event_id: &str,
        outcome: SyntheticStatus,
        confirmed_timestamp: Option<DateTime<Utc>>,
        corrected: Option<CorrectedEconomics>,
    ) -> Result<()>;
}

/// Trait defining the contract for ledger service operations.
#[async_trait]
pub trait LedgerServiceTrait: Send + Sync {
    /// Appends one event with dedup-or-skip semantics. Returns whether an
    /// insert occurred.
    async fn append(&self, event: &FinancialEvent) -> Result<bool>;

    /// Appends a normalized batch serially, in the given order. Returns the
    /// number of events actually inserted.
    async fn append_batch(&self, events: &[FinancialEvent]) -> Result<usize>;

    /// All events whose timestamp falls within the exchange-local trading
    /// day, in the fixed narrative order: timestamp ascending, same-
    /// timestamp ties broken cash movements -> trades -> option lifecycle
    /// -> interest -> fees, then event id.
    fn events_for_day(&self, account_id: &str, date: NaiveDate) -> Result<Vec<FinancialEvent>>;

    fn events_for_contract(
        &self,
        account_id: &str,
        contract_key: &str,
        expiration_date: NaiveDate,
    ) -> Result<Vec<FinancialEvent>>;

    fn unvalidated_synthetics(
        &self,
        account_id: &str,
        expiration_date: Option<NaiveDate>,
    ) -> Result<Vec<FinancialEvent>>;

    fn synthetic_events(&self, account_id: &str) -> Result<Vec<FinancialEvent>>;

    async fn mark_synthetic_validation(
        &self,
        event_id: &str,
        outcome: SyntheticStatus,
        confirmed_timestamp: Option<DateTime<Utc>>,
        corrected: Option<CorrectedEconomics>,
    ) -> Result<()>;
}
