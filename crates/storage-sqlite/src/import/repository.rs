use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;

use super::model::ImportRunDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::import_runs;
use alm_core::errors::Result;
use alm_core::import::{ImportRun, ImportRunRepositoryTrait};

pub struct ImportRunRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl ImportRunRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl ImportRunRepositoryTrait for ImportRunRepository {
    async fn save_run(&self, run: &ImportRun) -> Result<()> {
        let record = ImportRunDB::from(run.clone());
        self.writer
            .exec(move |conn| {
                // One checkpoint per (account, date); re-runs replace it.
                diesel::replace_into(import_runs::table)
                    .values(&record)
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }

    fn get_run(&self, input_account_id: &str, input_run_date: NaiveDate) -> Result<Option<ImportRun>> {
        let mut conn = get_connection(&self.pool)?;
        let row = import_runs::table
            .filter(import_runs::account_id.eq(input_account_id))
            .filter(import_runs::run_date.eq(input_run_date))
            .first::<ImportRunDB>(&mut conn)
            .optional()
            .into_core()?;
        Ok(row.map(ImportRun::from))
    }
}
