//! Database models for daily summaries and NAV observations.

use crate::events::model::{parse_decimal_column, to_utc};
use alm_core::events::NavObservation;
use alm_core::reconciliation::DailySummary;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use std::str::FromStr;

use rust_decimal::Decimal;

/// Database model for daily reconciliation summaries.
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::daily_summaries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DailySummaryDB {
    pub id: String,
    pub account_id: String,
    pub summary_date: NaiveDate,
    pub opening_nav: Option<String>,
    pub adjusted_opening_nav: Option<String>,
    pub closing_nav: String,
    pub closing_observed: bool,
    pub gross_pnl: String,
    pub net_pnl: String,
    pub net_cash_flow: String,
    pub deposits: String,
    pub withdrawals: String,
    pub total_commissions: String,
    pub total_fees: String,
    pub total_interest: String,
    pub exercise_proceeds: String,
    pub exercise_commissions: String,
    pub reconciliation_difference: String,
    pub is_reconciled: bool,
    pub daily_return_pct: Option<String>,
    pub calculated_at: NaiveDateTime,
}

impl From<DailySummary> for DailySummaryDB {
    fn from(summary: DailySummary) -> Self {
        Self {
            id: summary.id,
            account_id: summary.account_id,
            summary_date: summary.date,
            opening_nav: summary.opening_nav.map(|d| d.to_string()),
            adjusted_opening_nav: summary.adjusted_opening_nav.map(|d| d.to_string()),
            closing_nav: summary.closing_nav.to_string(),
            closing_observed: summary.closing_observed,
            gross_pnl: summary.gross_pnl.to_string(),
            net_pnl: summary.net_pnl.to_string(),
            net_cash_flow: summary.net_cash_flow.to_string(),
            deposits: summary.deposits.to_string(),
            withdrawals: summary.withdrawals.to_string(),
            total_commissions: summary.total_commissions.to_string(),
            total_fees: summary.total_fees.to_string(),
            total_interest: summary.total_interest.to_string(),
            exercise_proceeds: summary.exercise_proceeds.to_string(),
            exercise_commissions: summary.exercise_commissions.to_string(),
            reconciliation_difference: summary.reconciliation_difference.to_string(),
            is_reconciled: summary.is_reconciled,
            daily_return_pct: summary.daily_return_pct.map(|d| d.to_string()),
            calculated_at: summary.calculated_at.naive_utc(),
        }
    }
}

impl From<DailySummaryDB> for DailySummary {
    fn from(db: DailySummaryDB) -> Self {
        Self {
            opening_nav: db
                .opening_nav
                .as_deref()
                .map(|s| parse_decimal_column(s, "opening_nav")),
            adjusted_opening_nav: db
                .adjusted_opening_nav
                .as_deref()
                .map(|s| parse_decimal_column(s, "adjusted_opening_nav")),
            closing_nav: parse_decimal_column(&db.closing_nav, "closing_nav"),
            gross_pnl: parse_decimal_column(&db.gross_pnl, "gross_pnl"),
            net_pnl: parse_decimal_column(&db.net_pnl, "net_pnl"),
            net_cash_flow: parse_decimal_column(&db.net_cash_flow, "net_cash_flow"),
            deposits: parse_decimal_column(&db.deposits, "deposits"),
            withdrawals: parse_decimal_column(&db.withdrawals, "withdrawals"),
            total_commissions: parse_decimal_column(&db.total_commissions, "total_commissions"),
            total_fees: parse_decimal_column(&db.total_fees, "total_fees"),
            total_interest: parse_decimal_column(&db.total_interest, "total_interest"),
            exercise_proceeds: parse_decimal_column(&db.exercise_proceeds, "exercise_proceeds"),
            exercise_commissions: parse_decimal_column(
                &db.exercise_commissions,
                "exercise_commissions",
            ),
            reconciliation_difference: parse_decimal_column(
                &db.reconciliation_difference,
                "reconciliation_difference",
            ),
            daily_return_pct: db
                .daily_return_pct
                .as_deref()
                .and_then(|s| Decimal::from_str(s).ok()),
            calculated_at: to_utc(db.calculated_at),
            id: db.id,
            account_id: db.account_id,
            date: db.summary_date,
            closing_observed: db.closing_observed,
            is_reconciled: db.is_reconciled,
        }
    }
}

/// Database model for broker NAV observations.
#[derive(Queryable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::nav_observations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NavObservationDB {
    pub account_id: String,
    pub observation_date: NaiveDate,
    pub nav: String,
    pub source: String,
    pub updated_at: NaiveDateTime,
}

impl From<NavObservation> for NavObservationDB {
    fn from(observation: NavObservation) -> Self {
        Self {
            account_id: observation.account_id,
            observation_date: observation.date,
            nav: observation.nav.to_string(),
            source: observation.source,
            updated_at: Utc::now().naive_utc(),
        }
    }
}

impl From<NavObservationDB> for NavObservation {
    fn from(db: NavObservationDB) -> Self {
        Self {
            nav: parse_decimal_column(&db.nav, "nav"),
            account_id: db.account_id,
            date: db.observation_date,
            source: db.source,
        }
    }
}
