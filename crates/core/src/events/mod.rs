//! Events module - domain models, the normalizer, and errors.

mod events_errors;
mod events_model;
mod normalizer;

pub use events_errors::EventError;
pub use events_model::{
    EventType, FinancialEvent, NavObservation, RawBrokerRecord, RawRecordKind, SyntheticStatus,
};
pub use normalizer::{
    extract_nav_observations, normalize_batch, normalize_record, NormalizedBatch, SkippedRecord,
};

pub(crate) use normalizer::exchange_timestamp;
