use thiserror::Error;

/// Errors produced while normalizing raw broker records into ledger events.
#[derive(Error, Debug)]
pub enum EventError {
    /// A raw record is missing a field required to build an event.
    /// Skipped and logged by batch callers; never fatal to a batch.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Unknown event type code: {0}")]
    UnknownEventType(String),

    #[error("Unknown synthetic status code: {0}")]
    UnknownSyntheticStatus(String),

    #[error("Invalid event data: {0}")]
    InvalidData(String),
}
