pub(crate) mod reader;
pub(crate) mod writer;

pub use reader::FastxReader;
pub use writer::{
    write_distance, write_distance_matrix, write_distribution, write_info, write_segments_json,
    write_stats, write_value,
};
