//! Raw broker record normalization.
//!
//! Converts one raw export record into at most one [`FinancialEvent`] with a
//! resolved UTC timestamp, signed cash impact, and realized P&L. Pure per
//! record; batching, persistence, and dedup are the ledger's concern.

use crate::constants::{
    DEPOSIT_DEFAULT_TIME, EXCHANGE_TZ, MARKET_CLOSE, WITHDRAWAL_DEFAULT_TIME,
};
use crate::events::events_errors::EventError;
use crate::events::events_model::{
    EventType, FinancialEvent, NavObservation, RawBrokerRecord, RawRecordKind, SyntheticStatus,
};
use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use log::warn;
use rayon::prelude::*;
use rust_decimal::Decimal;

/// A record rejected during batch normalization, with the index it had in
/// the input batch. Reported, never fatal.
#[derive(Debug, Clone)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: String,
}

/// Result of normalizing one batch of raw records.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    /// Events in `(timestamp, id)` order, ready for serial append.
    pub events: Vec<FinancialEvent>,
    pub skipped: Vec<SkippedRecord>,
}

/// Converts a raw broker record into zero or one ledger event.
///
/// Returns `Ok(None)` for record kinds that carry no economic event of
/// their own (NAV snapshots). Returns [`EventError::MalformedRecord`] when
/// a required field is absent; callers skip and log, the batch continues.
pub fn normalize_record(
    account_id: &str,
    record: &RawBrokerRecord,
) -> Result<Option<FinancialEvent>, EventError> {
    let kind = require(record.kind, "kind")?;

    match kind {
        RawRecordKind::CashMovement => normalize_cash_movement(account_id, record).map(Some),
        RawRecordKind::Trade => normalize_trade(account_id, record).map(Some),
        RawRecordKind::ExerciseExpiry => normalize_exercise_expiry(account_id, record).map(Some),
        RawRecordKind::Interest => normalize_interest(account_id, record).map(Some),
        RawRecordKind::Fee => normalize_fee(account_id, record).map(Some),
        RawRecordKind::NavSnapshot => Ok(None),
    }
}

/// Normalizes a batch of raw records in parallel, then re-serializes the
/// results into `(timestamp, id)` order so the subsequent append phase is
/// deterministic regardless of worker scheduling or feed arrival order.
pub fn normalize_batch(account_id: &str, records: &[RawBrokerRecord]) -> NormalizedBatch {
    let results: Vec<(usize, Result<Option<FinancialEvent>, EventError>)> = records
        .par_iter()
        .enumerate()
        .map(|(index, record)| (index, normalize_record(account_id, record)))
        .collect();

    let mut batch = NormalizedBatch::default();
    for (index, result) in results {
        match result {
            Ok(Some(event)) => batch.events.push(event),
            Ok(None) => {}
            Err(e) => {
                warn!(
                    "Skipping malformed record at batch index {} for account {}: {}",
                    index, account_id, e
                );
                batch.skipped.push(SkippedRecord {
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }

    batch
        .events
        .sort_by(|a, b| (a.timestamp, &a.id).cmp(&(b.timestamp, &b.id)));
    batch
}

/// Pulls the NAV snapshot records out of a raw batch. These never become
/// ledger events; the orchestrator upserts them into the observation store
/// for the reconciliation engine to check against.
pub fn extract_nav_observations(
    account_id: &str,
    records: &[RawBrokerRecord],
) -> Vec<NavObservation> {
    records
        .iter()
        .filter(|r| r.kind == Some(RawRecordKind::NavSnapshot))
        .filter_map(|r| {
            let (date, nav) = match (r.date, r.amount) {
                (Some(date), Some(nav)) => (date, nav),
                _ => {
                    warn!(
                        "Skipping NAV snapshot without date/amount for account {}",
                        account_id
                    );
                    return None;
                }
            };
            Some(NavObservation {
                account_id: account_id.to_string(),
                date,
                nav,
                source: r.description.clone().unwrap_or_else(|| "BROKER".to_string()),
            })
        })
        .collect()
}

fn normalize_cash_movement(
    account_id: &str,
    record: &RawBrokerRecord,
) -> Result<FinancialEvent, EventError> {
    let amount = require(record.amount, "amount")?;
    let transaction_id = require(record.transaction_id.clone(), "transaction_id")?;
    let date = require(record.date, "date")?;

    // Deposits land before the open, withdrawals at the close, unless the
    // broker supplied an explicit time. This assignment happens here, at
    // ingestion, and nowhere else; a wrong timestamp is a normalizer defect
    // fixed by replaying the event, never by patching stored data.
    let (event_type, default_time) = if amount >= Decimal::ZERO {
        (EventType::Deposit, DEPOSIT_DEFAULT_TIME)
    } else {
        (EventType::Withdrawal, WITHDRAWAL_DEFAULT_TIME)
    };
    let timestamp = exchange_timestamp(date, record.time.unwrap_or(default_time))?;

    let description = record.description.clone().unwrap_or_else(|| {
        match event_type {
            EventType::Deposit => format!("Deposit of {}", amount),
            _ => format!("Withdrawal of {}", amount.abs()),
        }
    });

    Ok(build_event(
        account_id,
        timestamp,
        event_type,
        description,
        amount,
        Decimal::ZERO,
        Decimal::ZERO,
        record,
        Some(transaction_id),
    ))
}

fn normalize_trade(
    account_id: &str,
    record: &RawBrokerRecord,
) -> Result<FinancialEvent, EventError> {
    let proceeds = require(record.amount, "amount")?;
    let transaction_id = require(record.transaction_id.clone(), "transaction_id")?;
    let date = require(record.date, "date")?;

    let commission = record.commission.unwrap_or(Decimal::ZERO).abs();
    let realized_pnl = record.realized_pnl.unwrap_or(Decimal::ZERO);
    let timestamp = exchange_timestamp(date, record.time.unwrap_or(MARKET_CLOSE))?;
    let description = record
        .description
        .clone()
        .unwrap_or_else(|| "Trade".to_string());

    Ok(build_event(
        account_id,
        timestamp,
        EventType::Trade,
        description,
        proceeds - commission,
        realized_pnl,
        commission,
        record,
        Some(transaction_id),
    ))
}

fn normalize_exercise_expiry(
    account_id: &str,
    record: &RawBrokerRecord,
) -> Result<FinancialEvent, EventError> {
    let transaction_id = require(record.transaction_id.clone(), "transaction_id")?;
    let date = require(record.date, "date")?;
    let contract_key = require(record.contract_key.clone(), "contract_key")?;
    let assigned = require(record.assigned, "assigned")?;

    let event_type = if assigned {
        EventType::OptionAssignment
    } else {
        EventType::OptionExpiration
    };
    let commission = record.commission.unwrap_or(Decimal::ZERO).abs();
    let cash_impact = record.amount.unwrap_or(Decimal::ZERO) - commission;
    let realized_pnl = record.realized_pnl.unwrap_or(Decimal::ZERO);
    let timestamp = exchange_timestamp(date, record.time.unwrap_or(MARKET_CLOSE))?;

    let description = record.description.clone().unwrap_or_else(|| {
        match event_type {
            EventType::OptionAssignment => format!("Assignment of {}", contract_key),
            _ => format!("Expiration of {}", contract_key),
        }
    });

    let mut event = build_event(
        account_id,
        timestamp,
        event_type,
        description,
        cash_impact,
        realized_pnl,
        commission,
        record,
        Some(transaction_id),
    );
    event.contract_key = Some(contract_key);
    event.expiration_date = Some(record.expiration_date.unwrap_or(date));
    Ok(event)
}

fn normalize_interest(
    account_id: &str,
    record: &RawBrokerRecord,
) -> Result<FinancialEvent, EventError> {
    let amount = require(record.amount, "amount")?;
    let transaction_id = require(record.transaction_id.clone(), "transaction_id")?;
    let date = require(record.date, "date")?;

    let timestamp = exchange_timestamp(date, record.time.unwrap_or(MARKET_CLOSE))?;
    let description = record
        .description
        .clone()
        .unwrap_or_else(|| "Interest accrual".to_string());

    Ok(build_event(
        account_id,
        timestamp,
        EventType::InterestAccrual,
        description,
        amount,
        Decimal::ZERO,
        Decimal::ZERO,
        record,
        Some(transaction_id),
    ))
}

fn normalize_fee(
    account_id: &str,
    record: &RawBrokerRecord,
) -> Result<FinancialEvent, EventError> {
    let amount = require(record.amount, "amount")?;
    let transaction_id = require(record.transaction_id.clone(), "transaction_id")?;
    let date = require(record.date, "date")?;

    let timestamp = exchange_timestamp(date, record.time.unwrap_or(MARKET_CLOSE))?;
    let description = record
        .description
        .clone()
        .unwrap_or_else(|| "Fee".to_string());

    // Fees always reduce cash regardless of how the feed signs them.
    Ok(build_event(
        account_id,
        timestamp,
        EventType::Fee,
        description,
        -amount.abs(),
        Decimal::ZERO,
        Decimal::ZERO,
        record,
        Some(transaction_id),
    ))
}

#[allow(clippy::too_many_arguments)]
fn build_event(
    account_id: &str,
    timestamp: DateTime<Utc>,
    event_type: EventType,
    description: String,
    cash_impact: Decimal,
    realized_pnl: Decimal,
    commission: Decimal,
    record: &RawBrokerRecord,
    source_transaction_id: Option<String>,
) -> FinancialEvent {
    let now = Utc::now();
    FinancialEvent {
        id: uuid::Uuid::new_v4().to_string(),
        account_id: account_id.to_string(),
        timestamp,
        event_type,
        description,
        cash_impact,
        realized_pnl,
        commission,
        currency: record
            .currency
            .clone()
            .unwrap_or_else(|| crate::constants::DEFAULT_CURRENCY.to_string()),
        source_transaction_id,
        contract_key: None,
        expiration_date: None,
        is_synthetic: false,
        synthetic_status: SyntheticStatus::Unknown,
        confirmed_timestamp: None,
        created_at: now,
        updated_at: now,
    }
}

/// Resolves an exchange-local date and time to UTC.
pub(crate) fn exchange_timestamp(
    date: NaiveDate,
    time: NaiveTime,
) -> Result<DateTime<Utc>, EventError> {
    match EXCHANGE_TZ.from_local_datetime(&date.and_time(time)) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        // Fall-back DST hour: take the earlier mapping.
        LocalResult::Ambiguous(earlier, _) => Ok(earlier.with_timezone(&Utc)),
        LocalResult::None => Err(EventError::MalformedRecord(format!(
            "nonexistent exchange-local time {} {}",
            date, time
        ))),
    }
}

fn require<T>(value: Option<T>, field: &str) -> Result<T, EventError> {
    value.ok_or_else(|| EventError::MalformedRecord(format!("missing required field '{}'", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn raw(kind: RawRecordKind) -> RawBrokerRecord {
        RawBrokerRecord {
            kind: Some(kind),
            transaction_id: Some("tx-1".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 3, 14),
            ..Default::default()
        }
    }

    #[test]
    fn deposit_defaults_to_pre_open_time() {
        let mut record = raw(RawRecordKind::CashMovement);
        record.amount = Some(dec!(50000));

        let event = normalize_record("acct-1", &record).unwrap().unwrap();
        assert_eq!(event.event_type, EventType::Deposit);
        assert_eq!(event.exchange_time(), NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert!(event.is_pre_open());
        assert_eq!(event.cash_impact, dec!(50000));
        assert_eq!(event.realized_pnl, Decimal::ZERO);
    }

    #[test]
    fn withdrawal_defaults_to_close_time() {
        let mut record = raw(RawRecordKind::CashMovement);
        record.amount = Some(dec!(-10000));

        let event = normalize_record("acct-1", &record).unwrap().unwrap();
        assert_eq!(event.event_type, EventType::Withdrawal);
        assert_eq!(event.exchange_time(), NaiveTime::from_hms_opt(16, 0, 0).unwrap());
        assert!(!event.is_pre_open());
        assert_eq!(event.cash_impact, dec!(-10000));
    }

    #[test]
    fn broker_supplied_time_takes_precedence() {
        let mut record = raw(RawRecordKind::CashMovement);
        record.amount = Some(dec!(100));
        record.time = NaiveTime::from_hms_opt(11, 15, 0);

        let event = normalize_record("acct-1", &record).unwrap().unwrap();
        assert_eq!(event.exchange_time(), NaiveTime::from_hms_opt(11, 15, 0).unwrap());
        assert!(!event.is_pre_open());
    }

    #[test]
    fn trade_cash_impact_nets_out_commission() {
        let mut record = raw(RawRecordKind::Trade);
        record.amount = Some(dec!(5000));
        record.commission = Some(dec!(20));
        record.realized_pnl = Some(dec!(5000));

        let event = normalize_record("acct-1", &record).unwrap().unwrap();
        assert_eq!(event.event_type, EventType::Trade);
        assert_eq!(event.cash_impact, dec!(4980));
        assert_eq!(event.realized_pnl, dec!(5000));
        assert_eq!(event.commission, dec!(20));
    }

    #[test]
    fn exercise_record_maps_to_authoritative_assignment() {
        let mut record = raw(RawRecordKind::ExerciseExpiry);
        record.contract_key = Some("SPX 20250314 P5000".to_string());
        record.assigned = Some(true);
        record.amount = Some(dec!(-350));
        record.realized_pnl = Some(dec!(-350));

        let event = normalize_record("acct-1", &record).unwrap().unwrap();
        assert_eq!(event.event_type, EventType::OptionAssignment);
        assert!(!event.is_synthetic);
        assert_eq!(event.contract_key.as_deref(), Some("SPX 20250314 P5000"));
        assert_eq!(
            event.expiration_date,
            NaiveDate::from_ymd_opt(2025, 3, 14)
        );
    }

    #[test]
    fn fee_is_always_a_cash_reduction() {
        let mut record = raw(RawRecordKind::Fee);
        record.amount = Some(dec!(12.50));

        let event = normalize_record("acct-1", &record).unwrap().unwrap();
        assert_eq!(event.event_type, EventType::Fee);
        assert_eq!(event.cash_impact, dec!(-12.50));
    }

    #[test]
    fn nav_snapshot_produces_no_event() {
        let mut record = raw(RawRecordKind::NavSnapshot);
        record.amount = Some(dec!(1000000));

        assert!(normalize_record("acct-1", &record).unwrap().is_none());

        let observations = extract_nav_observations("acct-1", &[record]);
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].nav, dec!(1000000));
    }

    #[test]
    fn missing_amount_is_malformed() {
        let record = raw(RawRecordKind::CashMovement);
        let err = normalize_record("acct-1", &record).unwrap_err();
        assert!(matches!(err, EventError::MalformedRecord(_)));
    }

    #[test]
    fn batch_skips_malformed_and_sorts_by_timestamp() {
        let mut deposit = raw(RawRecordKind::CashMovement);
        deposit.amount = Some(dec!(1000));

        let mut trade = raw(RawRecordKind::Trade);
        trade.transaction_id = Some("tx-2".to_string());
        trade.amount = Some(dec!(500));
        trade.time = NaiveTime::from_hms_opt(10, 0, 0);

        let malformed = raw(RawRecordKind::Trade); // no amount

        // Feed arrival order has the trade first; output must be timestamp order.
        let batch = normalize_batch("acct-1", &[trade, malformed, deposit]);
        assert_eq!(batch.events.len(), 2);
        assert_eq!(batch.skipped.len(), 1);
        assert_eq!(batch.skipped[0].index, 1);
        assert_eq!(batch.events[0].event_type, EventType::Deposit);
        assert_eq!(batch.events[1].event_type, EventType::Trade);
    }
}
