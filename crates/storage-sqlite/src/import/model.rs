//! Database model for import run checkpoints.

use crate::events::model::to_utc;
use alm_core::import::{ImportRun, ImportRunStatus};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use std::str::FromStr;

#[derive(Queryable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::import_runs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ImportRunDB {
    pub id: String,
    pub account_id: String,
    pub run_date: NaiveDate,
    pub status: String,
    pub records_seen: i32,
    pub events_appended: i32,
    pub malformed_skipped: i32,
    pub started_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
    pub error: Option<String>,
}

impl From<ImportRun> for ImportRunDB {
    fn from(run: ImportRun) -> Self {
        Self {
            id: run.id,
            account_id: run.account_id,
            run_date: run.run_date,
            status: run.status.as_str().to_string(),
            records_seen: run.records_seen as i32,
            events_appended: run.events_appended as i32,
            malformed_skipped: run.malformed_skipped as i32,
            started_at: run.started_at.naive_utc(),
            completed_at: run.completed_at.map(|t| t.naive_utc()),
            error: run.error,
        }
    }
}

impl From<ImportRunDB> for ImportRun {
    fn from(db: ImportRunDB) -> Self {
        Self {
            status: ImportRunStatus::from_str(&db.status).unwrap_or(ImportRunStatus::Failed),
            records_seen: db.records_seen.max(0) as usize,
            events_appended: db.events_appended.max(0) as usize,
            malformed_skipped: db.malformed_skipped.max(0) as usize,
            started_at: to_utc(db.started_at),
            completed_at: db.completed_at.map(to_utc),
            id: db.id,
            account_id: db.account_id,
            run_date: db.run_date,
            error: db.error,
        }
    }
}
