//! Event domain models.

use crate::constants::{EXCHANGE_TZ, MARKET_OPEN};
use crate::events::events_errors::EventError;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of economic event kinds the ledger understands.
///
/// Adding a kind is a compile-time-checked change: the normalizer and the
/// reconciliation engine both match exhaustively on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Deposit,
    Withdrawal,
    Trade,
    OptionExpiration,
    OptionAssignment,
    OptionAssignmentAssumed,
    InterestAccrual,
    Fee,
    Commission,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Deposit => "DEPOSIT",
            EventType::Withdrawal => "WITHDRAWAL",
            EventType::Trade => "TRADE",
            EventType::OptionExpiration => "OPTION_EXPIRATION",
            EventType::OptionAssignment => "OPTION_ASSIGNMENT",
            EventType::OptionAssignmentAssumed => "OPTION_ASSIGNMENT_ASSUMED",
            EventType::InterestAccrual => "INTEREST_ACCRUAL",
            EventType::Fee => "FEE",
            EventType::Commission => "COMMISSION",
        }
    }

    /// Deposits and withdrawals: money crossing the account boundary.
    pub fn is_cash_movement(&self) -> bool {
        matches!(self, EventType::Deposit | EventType::Withdrawal)
    }

    /// Expiration/assignment events, synthetic or authoritative.
    pub fn is_option_lifecycle(&self) -> bool {
        matches!(
            self,
            EventType::OptionExpiration
                | EventType::OptionAssignment
                | EventType::OptionAssignmentAssumed
        )
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(EventType::Deposit),
            "WITHDRAWAL" => Ok(EventType::Withdrawal),
            "TRADE" => Ok(EventType::Trade),
            "OPTION_EXPIRATION" => Ok(EventType::OptionExpiration),
            "OPTION_ASSIGNMENT" => Ok(EventType::OptionAssignment),
            "OPTION_ASSIGNMENT_ASSUMED" => Ok(EventType::OptionAssignmentAssumed),
            "INTEREST_ACCRUAL" => Ok(EventType::InterestAccrual),
            "FEE" => Ok(EventType::Fee),
            "COMMISSION" => Ok(EventType::Commission),
            other => Err(EventError::UnknownEventType(other.to_string())),
        }
    }
}

/// Validation state of a synthetic event against authoritative broker data.
///
/// Only meaningful when `FinancialEvent::is_synthetic` is true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyntheticStatus {
    /// No authoritative record has been seen yet.
    #[default]
    Unknown,
    /// Authoritative data matched the assumption within tolerance.
    Confirmed,
    /// Authoritative data contradicted the assumption; the event's
    /// economics were superseded with the authoritative values.
    Contradicted,
}

impl SyntheticStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyntheticStatus::Unknown => "UNKNOWN",
            SyntheticStatus::Confirmed => "CONFIRMED",
            SyntheticStatus::Contradicted => "CONTRADICTED",
        }
    }
}

impl FromStr for SyntheticStatus {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNKNOWN" => Ok(SyntheticStatus::Unknown),
            "CONFIRMED" => Ok(SyntheticStatus::Confirmed),
            "CONTRADICTED" => Ok(SyntheticStatus::Contradicted),
            other => Err(EventError::UnknownSyntheticStatus(other.to_string())),
        }
    }
}

/// An immutable fact about one economic occurrence in an account.
///
/// Events are inserted once and never modified, with a single exception:
/// the synthetic-validation fields (`synthetic_status`,
/// `confirmed_timestamp`, and the superseded economics of a contradicted
/// assumption) may be updated by the validation pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialEvent {
    /// Opaque unique identifier, assigned at normalization time.
    pub id: String,
    pub account_id: String,

    /// Effective moment of economic impact (UTC). Cash movements lacking a
    /// broker time get the conventional pre-open/close times so that
    /// reconciliation can classify them against the trading session.
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub description: String,

    /// Signed amount in the account's base currency; positive increases cash.
    pub cash_impact: Decimal,
    /// Signed amount attributable to trading P&L; zero for pure cash movements.
    pub realized_pnl: Decimal,
    /// Non-negative cost associated with the event.
    pub commission: Decimal,
    pub currency: String,

    /// Broker feed identifier; unique among non-synthetic events and the
    /// basis for idempotent loading. Absent for derived (synthetic) events.
    pub source_transaction_id: Option<String>,

    /// Option contract identifier, for option lifecycle events. Together
    /// with `expiration_date` this is the synthetic dedup key.
    pub contract_key: Option<String>,
    pub expiration_date: Option<NaiveDate>,

    pub is_synthetic: bool,
    #[serde(default)]
    pub synthetic_status: SyntheticStatus,
    /// The authoritative event time, populated once validation occurs.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_timestamp: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FinancialEvent {
    /// The exchange-local calendar date this event belongs to.
    pub fn effective_date(&self) -> NaiveDate {
        self.timestamp.with_timezone(&EXCHANGE_TZ).date_naive()
    }

    /// The exchange-local time of day.
    pub fn exchange_time(&self) -> NaiveTime {
        self.timestamp.with_timezone(&EXCHANGE_TZ).time()
    }

    /// Whether this event lands before the opening bell. Pre-open deposits
    /// adjust the baseline NAV used for the daily return calculation.
    pub fn is_pre_open(&self) -> bool {
        self.exchange_time() < MARKET_OPEN
    }

    /// Net proceeds after commission.
    pub fn net_cash_impact(&self) -> Decimal {
        self.cash_impact
    }

    /// Whether this event still awaits an authoritative verdict.
    pub fn is_pending_validation(&self) -> bool {
        self.is_synthetic && self.synthetic_status == SyntheticStatus::Unknown
    }
}

/// Declared kind of a raw broker export record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RawRecordKind {
    CashMovement,
    Trade,
    ExerciseExpiry,
    Interest,
    Fee,
    /// End-of-day account value observation. Produces no ledger event;
    /// routed to the NAV observation store by the orchestrator.
    NavSnapshot,
}

/// One record from the upstream broker export, already parsed out of its
/// wire format by the externally-owned import layer. The engine treats this
/// as an opaque typed stream.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawBrokerRecord {
    pub kind: Option<RawRecordKind>,
    /// Provider-assigned identifier; required for every kind that produces
    /// an event.
    pub transaction_id: Option<String>,
    pub date: Option<NaiveDate>,
    /// Exchange-local time, when the broker supplies one.
    pub time: Option<NaiveTime>,
    pub amount: Option<Decimal>,
    pub realized_pnl: Option<Decimal>,
    pub commission: Option<Decimal>,
    pub currency: Option<String>,
    pub description: Option<String>,
    /// Option contract identifier, for exercise/expiry records.
    pub contract_key: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    /// For exercise/expiry records: true when the contract was assigned or
    /// exercised rather than expiring worthless.
    pub assigned: Option<bool>,
}

/// A broker-reported end-of-day account value, checked against the value
/// implied by the ledger during reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NavObservation {
    pub account_id: String,
    pub date: NaiveDate,
    pub nav: Decimal,
    pub source: String,
}
