pub(crate) mod operations;
pub(crate) mod types;

pub use operations::{scale, scale_factors, Merger};
pub use types::Profile;
