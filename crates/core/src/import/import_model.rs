//! Import run state models.

use crate::events::SkippedRecord;
use crate::reconciliation::DailySummary;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of one day's import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportRunStatus {
    Running,
    Completed,
    Failed,
}

impl ImportRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportRunStatus::Running => "RUNNING",
            ImportRunStatus::Completed => "COMPLETED",
            ImportRunStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ImportRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportRunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RUNNING" => Ok(ImportRunStatus::Running),
            "COMPLETED" => Ok(ImportRunStatus::Completed),
            "FAILED" => Ok(ImportRunStatus::Failed),
            other => Err(format!("unknown import run status: {}", other)),
        }
    }
}

/// Idempotent import-state checkpoint: one row per (account, date),
/// replaced whenever the day is re-run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportRun {
    pub id: String,
    pub account_id: String,
    pub run_date: NaiveDate,
    pub status: ImportRunStatus,
    pub records_seen: usize,
    pub events_appended: usize,
    pub malformed_skipped: usize,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl ImportRun {
    pub fn start(account_id: &str, run_date: NaiveDate, records_seen: usize) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            run_date,
            status: ImportRunStatus::Running,
            records_seen,
            events_appended: 0,
            malformed_skipped: 0,
            started_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }

    pub fn complete(mut self, events_appended: usize, malformed_skipped: usize) -> Self {
        self.status = ImportRunStatus::Completed;
        self.events_appended = events_appended;
        self.malformed_skipped = malformed_skipped;
        self.completed_at = Some(Utc::now());
        self
    }

    pub fn fail(mut self, error: String) -> Self {
        self.status = ImportRunStatus::Failed;
        self.error = Some(error);
        self.completed_at = Some(Utc::now());
        self
    }
}

/// Result of one day's full import cycle.
#[derive(Debug, Clone)]
pub struct DayImportResult {
    pub events_appended: usize,
    pub skipped: Vec<SkippedRecord>,
    pub summary: DailySummary,
    pub narrative: String,
}
