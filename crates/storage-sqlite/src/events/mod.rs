pub(crate) mod model;
mod repository;

pub use model::FinancialEventDB;
pub use repository::LedgerRepository;
