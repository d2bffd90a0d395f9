use thiserror::Error;

/// Errors that occur while computing a day's reconciliation.
///
/// Note that a balance discrepancy is deliberately NOT in this enum: an
/// unreconciled day is a reportable business condition carried in the
/// `DailySummary`, not a program error.
#[derive(Error, Debug)]
pub enum ReconciliationError {
    #[error("Invalid reconciliation window: {0}")]
    InvalidWindow(String),

    #[error("Calculation failed: {0}")]
    Calculation(String),
}
