mod model;
mod repository;

pub use model::ImportRunDB;
pub use repository::ImportRunRepository;
