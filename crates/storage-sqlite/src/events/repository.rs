use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use std::convert::TryInto;

use super::model::FinancialEventDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::financial_events;
use crate::schema::financial_events::dsl::*;
use alm_core::errors::{DatabaseError, Error, Result};
use alm_core::events::{FinancialEvent, SyntheticStatus};
use alm_core::ledger::{CorrectedEconomics, LedgerRepositoryTrait};

pub struct LedgerRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl LedgerRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

fn into_events(rows: Vec<FinancialEventDB>) -> Result<Vec<FinancialEvent>> {
    rows.into_iter().map(TryInto::try_into).collect()
}

#[async_trait]
impl LedgerRepositoryTrait for LedgerRepository {
    async fn append(&self, event: &FinancialEvent) -> Result<bool> {
        let record = FinancialEventDB::from(event.clone());
        let synthetic = event.is_synthetic;
        let event_account = event.account_id.clone();
        let event_contract = event.contract_key.clone();
        let event_expiration = event.expiration_date;

        self.writer
            .exec(move |conn| {
                if synthetic {
                    // A synthetic event may only exist when NOTHING is
                    // recorded for the contract yet, authoritative rows
                    // included; the unique index alone cannot express
                    // that, so check under the writer's serialization.
                    let existing: i64 = financial_events::table
                        .filter(account_id.eq(event_account))
                        .filter(contract_key.eq(event_contract))
                        .filter(expiration_date.eq(event_expiration))
                        .count()
                        .get_result(conn)
                        .into_core()?;
                    if existing > 0 {
                        return Ok(false);
                    }
                }

                // INSERT OR IGNORE honors the unique source_transaction_id
                // index: a replayed broker record affects zero rows.
                let inserted = diesel::insert_or_ignore_into(financial_events::table)
                    .values(&record)
                    .execute(conn)
                    .into_core()?;
                Ok(inserted > 0)
            })
            .await
    }

    fn get_event(&self, event_id: &str) -> Result<FinancialEvent> {
        let mut conn = get_connection(&self.pool)?;
        let row: FinancialEventDB = financial_events::table
            .find(event_id)
            .first(&mut conn)
            .optional()
            .into_core()?
            .ok_or_else(|| Error::Database(DatabaseError::NotFound(event_id.to_string())))?;
        row.try_into()
    }

    fn get_events_in_range(
        &self,
        input_account_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<FinancialEvent>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = financial_events::table
            .filter(account_id.eq(input_account_id))
            .filter(event_timestamp.ge(start.naive_utc()))
            .filter(event_timestamp.lt(end.naive_utc()))
            .order(event_timestamp.asc())
            .load::<FinancialEventDB>(&mut conn)
            .into_core()?;
        into_events(rows)
    }

    fn get_events_for_contract(
        &self,
        input_account_id: &str,
        input_contract_key: &str,
        input_expiration: NaiveDate,
    ) -> Result<Vec<FinancialEvent>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = financial_events::table
            .filter(account_id.eq(input_account_id))
            .filter(contract_key.eq(input_contract_key))
            .filter(expiration_date.eq(input_expiration))
            .order(event_timestamp.asc())
            .load::<FinancialEventDB>(&mut conn)
            .into_core()?;
        into_events(rows)
    }

    fn get_unvalidated_synthetics(
        &self,
        input_account_id: &str,
        input_expiration: Option<NaiveDate>,
    ) -> Result<Vec<FinancialEvent>> {
        let mut conn = get_connection(&self.pool)?;

        let mut query = financial_events::table
            .filter(account_id.eq(input_account_id))
            .filter(is_synthetic.eq(true))
            .filter(synthetic_status.eq(SyntheticStatus::Unknown.as_str()))
            .order(event_timestamp.asc())
            .into_boxed();

        if let Some(expiration) = input_expiration {
            query = query.filter(expiration_date.eq(expiration));
        }

        let rows = query.load::<FinancialEventDB>(&mut conn).into_core()?;
        into_events(rows)
    }

    fn get_synthetic_events(&self, input_account_id: &str) -> Result<Vec<FinancialEvent>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = financial_events::table
            .filter(account_id.eq(input_account_id))
            .filter(is_synthetic.eq(true))
            .order(event_timestamp.asc())
            .load::<FinancialEventDB>(&mut conn)
            .into_core()?;
        into_events(rows)
    }

    async fn mark_synthetic_validation(
        &self,
        event_id: &str,
        outcome: SyntheticStatus,
        input_confirmed: Option<DateTime<Utc>>,
        corrected: Option<CorrectedEconomics>,
    ) -> Result<()> {
        let target_id = event_id.to_string();
        let now = Utc::now().naive_utc();
        let confirmed_naive = input_confirmed.map(|t| t.naive_utc());

        self.writer
            .exec(move |conn| {
                let target = financial_events::table.filter(id.eq(&target_id));
                let changed = match corrected {
                    Some(economics) => diesel::update(target)
                        .set((
                            synthetic_status.eq(outcome.as_str()),
                            confirmed_timestamp.eq(confirmed_naive),
                            cash_impact.eq(economics.cash_impact.to_string()),
                            realized_pnl.eq(economics.realized_pnl.to_string()),
                            commission.eq(economics.commission.to_string()),
                            updated_at.eq(now),
                        ))
                        .execute(conn)
                        .into_core()?,
                    None => diesel::update(target)
                        .set((
                            synthetic_status.eq(outcome.as_str()),
                            confirmed_timestamp.eq(confirmed_naive),
                            updated_at.eq(now),
                        ))
                        .execute(conn)
                        .into_core()?,
                };
                if changed == 0 {
                    return Err(Error::Database(DatabaseError::NotFound(target_id.clone())));
                }
                Ok(())
            })
            .await
    }
}
