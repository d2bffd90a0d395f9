//! Reconciliation domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Derived, fully-recomputable reconciliation result for one trading day.
///
/// Upserted on every engine run for the date; holds no independent state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    /// `{account_id}_{date}` composite key.
    pub id: String,
    pub account_id: String,
    pub date: NaiveDate,

    /// Broker-observed NAV at the previous close; absent on an account's
    /// first day.
    pub opening_nav: Option<Decimal>,
    /// Opening NAV plus pre-open deposits - the baseline for the daily
    /// return, so a capital injection is not misread as performance.
    pub adjusted_opening_nav: Option<Decimal>,
    pub closing_nav: Decimal,
    /// Whether `closing_nav` came from a broker observation. When false
    /// the implied value is reported and there was nothing to verify
    /// against.
    pub closing_observed: bool,

    pub gross_pnl: Decimal,
    pub net_pnl: Decimal,
    pub net_cash_flow: Decimal,
    pub deposits: Decimal,
    pub withdrawals: Decimal,
    pub total_commissions: Decimal,
    pub total_fees: Decimal,
    pub total_interest: Decimal,
    pub exercise_proceeds: Decimal,
    pub exercise_commissions: Decimal,

    /// Observed closing NAV minus the value implied by the balance
    /// equation; zero when reconciled.
    pub reconciliation_difference: Decimal,
    pub is_reconciled: bool,

    /// Net P&L over the adjusted opening baseline, as a percentage.
    /// `None` when the opening NAV is zero or missing.
    pub daily_return_pct: Option<Decimal>,

    pub calculated_at: DateTime<Utc>,
}

impl DailySummary {
    pub fn summary_id(account_id: &str, date: NaiveDate) -> String {
        format!("{}_{}", account_id, date)
    }
}

/// The reconciliation engine's full output for one day.
#[derive(Debug, Clone)]
pub struct DayReport {
    pub summary: DailySummary,
    pub narrative: String,
}
