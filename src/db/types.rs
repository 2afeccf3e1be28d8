/// Format version written to new profile files
pub const FORMAT_VERSION: &str = "1.0.0";

/// Major format version this build can read
pub const FORMAT_MAJOR: u64 = 1;

/// Stored statistics of a profile, readable without loading its counts
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub name: String,
    pub length: usize,
    pub total: u64,
    pub non_zero: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
}

impl ProfileSummary {
    /// Number of possible k-mers for this profile's length
    pub fn number(&self) -> usize {
        crate::kmer::number_of_kmers(self.length)
    }
}

/// File-level attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreInfo {
    pub version: String,
    pub producer: String,
}
