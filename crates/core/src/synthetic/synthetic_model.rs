//! Synthetic resolution domain models.

use crate::events::{FinancialEvent, SyntheticStatus};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Option right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptionRight {
    Put,
    Call,
}

/// An open option position reaching its expiration with no authoritative
/// outcome in the ledger yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringPosition {
    pub contract_key: String,
    pub underlying: String,
    pub strike: Decimal,
    pub right: OptionRight,
    /// Contracts held; negative for a short position.
    pub quantity: i64,
    /// Shares per contract.
    pub multiplier: i64,
    /// Underlying settlement price at/after expiration, when available.
    pub settlement_price: Option<Decimal>,
    pub currency: String,
}

impl ExpiringPosition {
    /// Intrinsic value per share at the given settlement price; zero when
    /// out of the money.
    pub fn intrinsic_value(&self, settlement: Decimal) -> Decimal {
        let value = match self.right {
            OptionRight::Call => settlement - self.strike,
            OptionRight::Put => self.strike - settlement,
        };
        value.max(Decimal::ZERO)
    }

    pub fn is_in_the_money(&self, settlement: Decimal) -> bool {
        self.intrinsic_value(settlement) > Decimal::ZERO
    }
}

/// A position the resolver could not decide yet. Reported as a pending
/// item and retried on the next scheduled pass, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSettlement {
    pub contract_key: String,
    pub reason: String,
}

/// Result of one resolver pass over a day's expiring positions.
#[derive(Debug, Clone, Default)]
pub struct ResolutionOutcome {
    /// Synthetic events created by this pass.
    pub emitted: Vec<FinancialEvent>,
    /// Contracts skipped because the ledger already holds an event for
    /// them (synthetic or authoritative) - the exactly-once guarantee.
    pub already_covered: Vec<String>,
    /// Positions deferred for lack of a settlement price.
    pub pending: Vec<PendingSettlement>,
}

/// One synthetic event's audit line in the validation report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationEntry {
    pub event_id: String,
    pub contract_key: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub status: SyntheticStatus,
    /// Stored economics; authoritative values once a contradiction has
    /// superseded the assumption.
    pub realized_pnl: Decimal,
    pub cash_impact: Decimal,
    pub confirmed_timestamp: Option<DateTime<Utc>>,
    /// True when this pass produced the verdict (as opposed to an earlier
    /// one); such days need their summaries recomputed.
    pub validated_this_pass: bool,
}

/// Audit report over all synthetic events for an account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub account_id: String,
    pub entries: Vec<ValidationEntry>,
    /// Events confirmed or contradicted during this pass (as opposed to
    /// on an earlier one).
    pub newly_validated: usize,
    pub still_unknown: usize,
}
