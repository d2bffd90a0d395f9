use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;

use super::model::{DailySummaryDB, NavObservationDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::{daily_summaries, nav_observations};
use alm_core::errors::Result;
use alm_core::events::NavObservation;
use alm_core::reconciliation::{
    DailySummary, NavObservationRepositoryTrait, SummaryRepositoryTrait,
};

pub struct SummaryRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl SummaryRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl SummaryRepositoryTrait for SummaryRepository {
    async fn save_summary(&self, summary: &DailySummary) -> Result<()> {
        let record = DailySummaryDB::from(summary.clone());
        self.writer
            .exec(move |conn| {
                // Summaries are derived rows recomputed in full each run.
                diesel::replace_into(daily_summaries::table)
                    .values(&record)
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }

    fn get_summary(
        &self,
        input_account_id: &str,
        input_date: NaiveDate,
    ) -> Result<Option<DailySummary>> {
        let mut conn = get_connection(&self.pool)?;
        let row = daily_summaries::table
            .filter(daily_summaries::account_id.eq(input_account_id))
            .filter(daily_summaries::summary_date.eq(input_date))
            .first::<DailySummaryDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(DailySummary::from))
    }

    fn get_summaries_in_range(
        &self,
        input_account_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailySummary>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = daily_summaries::table
            .filter(daily_summaries::account_id.eq(input_account_id))
            .filter(daily_summaries::summary_date.ge(start))
            .filter(daily_summaries::summary_date.le(end))
            .order(daily_summaries::summary_date.asc())
            .load::<DailySummaryDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(DailySummary::from).collect())
    }
}

pub struct NavObservationRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl NavObservationRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl NavObservationRepositoryTrait for NavObservationRepository {
    async fn save_observation(&self, observation: &NavObservation) -> Result<()> {
        let record = NavObservationDB::from(observation.clone());
        self.writer
            .exec(move |conn| {
                // Keyed by (account, date); the latest broker figure wins.
                diesel::replace_into(nav_observations::table)
                    .values(&record)
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }

    fn get_observation(
        &self,
        input_account_id: &str,
        input_date: NaiveDate,
    ) -> Result<Option<NavObservation>> {
        let mut conn = get_connection(&self.pool)?;
        let row = nav_observations::table
            .filter(nav_observations::account_id.eq(input_account_id))
            .filter(nav_observations::observation_date.eq(input_date))
            .first::<NavObservationDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(NavObservation::from))
    }

    fn get_latest_observation_before(
        &self,
        input_account_id: &str,
        input_date: NaiveDate,
    ) -> Result<Option<NavObservation>> {
        let mut conn = get_connection(&self.pool)?;
        let row = nav_observations::table
            .filter(nav_observations::account_id.eq(input_account_id))
            .filter(nav_observations::observation_date.lt(input_date))
            .order(nav_observations::observation_date.desc())
            .first::<NavObservationDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(NavObservation::from))
    }
}
