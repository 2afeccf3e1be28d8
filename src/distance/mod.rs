pub(crate) mod engine;
pub(crate) mod matrix;
pub(crate) mod metrics;
pub(crate) mod smooth;

pub use engine::{DistanceConfig, ProfileDistance};
pub use matrix::DistanceMatrix;
pub use metrics::{cosine, euclidean, multiset, vector_length, Metric, Pairwise, Summary};
pub use smooth::{Segment, SmoothedPair, Smoother};
