pub(crate) mod database;
pub(crate) mod schemas;
pub(crate) mod types;

pub use database::{Database, ValidationReport};
pub use types::{ProfileSummary, StoreInfo, FORMAT_VERSION};
