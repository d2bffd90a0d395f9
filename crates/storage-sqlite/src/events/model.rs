//! Database models for ledger events.

use alm_core::events::{EventType, FinancialEvent, SyntheticStatus};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses a stored decimal column, falling back to zero on a corrupt
/// value rather than poisoning the whole query.
pub(crate) fn parse_decimal_column(value_str: &str, field_name: &str) -> Decimal {
    match Decimal::from_str(value_str) {
        Ok(d) => d,
        Err(e) => {
            log::error!(
                "Failed to parse {} '{}' from storage: {}. Falling back to ZERO.",
                field_name,
                value_str,
                e
            );
            Decimal::ZERO
        }
    }
}

pub(crate) fn to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(naive, Utc)
}

/// Database model for financial events.
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::financial_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FinancialEventDB {
    pub id: String,
    pub account_id: String,
    pub event_timestamp: NaiveDateTime,
    pub event_type: String,
    pub description: String,
    pub cash_impact: String,
    pub realized_pnl: String,
    pub commission: String,
    pub currency: String,
    pub source_transaction_id: Option<String>,
    pub contract_key: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub is_synthetic: bool,
    pub synthetic_status: String,
    pub confirmed_timestamp: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<FinancialEvent> for FinancialEventDB {
    fn from(event: FinancialEvent) -> Self {
        Self {
            id: event.id,
            account_id: event.account_id,
            event_timestamp: event.timestamp.naive_utc(),
            event_type: event.event_type.as_str().to_string(),
            description: event.description,
            cash_impact: event.cash_impact.to_string(),
            realized_pnl: event.realized_pnl.to_string(),
            commission: event.commission.to_string(),
            currency: event.currency,
            source_transaction_id: event.source_transaction_id,
            contract_key: event.contract_key,
            expiration_date: event.expiration_date,
            is_synthetic: event.is_synthetic,
            synthetic_status: event.synthetic_status.as_str().to_string(),
            confirmed_timestamp: event.confirmed_timestamp.map(|t| t.naive_utc()),
            created_at: event.created_at.naive_utc(),
            updated_at: event.updated_at.naive_utc(),
        }
    }
}

impl TryFrom<FinancialEventDB> for FinancialEvent {
    type Error = alm_core::Error;

    fn try_from(db: FinancialEventDB) -> Result<Self, Self::Error> {
        Ok(Self {
            timestamp: to_utc(db.event_timestamp),
            event_type: EventType::from_str(&db.event_type)?,
            cash_impact: parse_decimal_column(&db.cash_impact, "cash_impact"),
            realized_pnl: parse_decimal_column(&db.realized_pnl, "realized_pnl"),
            commission: parse_decimal_column(&db.commission, "commission"),
            synthetic_status: SyntheticStatus::from_str(&db.synthetic_status)?,
            confirmed_timestamp: db.confirmed_timestamp.map(to_utc),
            created_at: to_utc(db.created_at),
            updated_at: to_utc(db.updated_at),
            id: db.id,
            account_id: db.account_id,
            description: db.description,
            currency: db.currency,
            source_transaction_id: db.source_transaction_id,
            contract_key: db.contract_key,
            expiration_date: db.expiration_date,
            is_synthetic: db.is_synthetic,
        })
    }
}
