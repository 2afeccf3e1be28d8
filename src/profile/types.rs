use std::collections::BTreeMap;

use crate::error::{ProfileError, Result};
use crate::kmer::{codec, Kmer, KmerCounter};

/// Represents a k-mer profile
///
/// `counts[i]` holds the count of the k-mer with lexicographic rank `i`, and
/// always has exactly 4^length entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Profile identifier, assigned by callers
    pub name: Option<String>,
    length: usize,
    counts: Vec<u64>,
}

impl Profile {
    /// Create an all-zero profile
    pub fn empty(length: usize) -> Result<Self> {
        codec::check_length(length)?;
        Ok(Profile::from_parts(length, vec![0; codec::number_of_kmers(length)], None))
    }

    /// Wrap an existing count vector, deriving the k-mer length from its size
    pub fn from_counts(counts: Vec<u64>, name: Option<String>) -> Result<Self> {
        let length = length_of(counts.len())?;
        Ok(Profile::from_parts(length, counts, name))
    }

    /// Round floating-point counts (as produced by scaling) back to integers
    pub fn from_scaled(counts: &[f64], name: Option<String>) -> Result<Self> {
        let counts = counts.iter().map(|&c| c.max(0.0).round() as u64).collect();
        Profile::from_counts(counts, name)
    }

    pub(crate) fn from_parts(length: usize, counts: Vec<u64>, name: Option<String>) -> Self {
        debug_assert_eq!(counts.len(), codec::number_of_kmers(length));
        Profile { name, length, counts }
    }

    /// Count all k-mers of `sequence`
    pub fn from_sequence(sequence: &[u8], length: usize) -> Result<Self> {
        Profile::from_sequences([sequence], length)
    }

    /// Count all k-mers of several sequences into one profile
    pub fn from_sequences<'a, I>(sequences: I, length: usize) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut counter = KmerCounter::new(length)?;
        for sequence in sequences {
            counter.count_sequence(sequence);
        }
        Ok(counter.into_profile(None))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// K-mer length
    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of possible k-mers with this length
    pub fn number(&self) -> usize {
        self.counts.len()
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Counts as floating-point values, for the metric layer
    pub fn to_f64(&self) -> Vec<f64> {
        self.counts.iter().map(|&c| c as f64).collect()
    }

    /// Count of a single k-mer, which must have the profile's length
    pub fn count_of(&self, kmer: &Kmer) -> Result<u64> {
        if kmer.len() != self.length {
            return Err(ProfileError::IncompatibleProfile {
                left: self.length,
                right: kmer.len(),
            });
        }
        Ok(self.counts[kmer.index() as usize])
    }

    /// Sum of k-mer counts
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Number of k-mers with a non-zero count
    pub fn non_zero(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    pub fn mean(&self) -> f64 {
        self.total() as f64 / self.number() as f64
    }

    pub fn median(&self) -> f64 {
        let mut sorted = self.counts.clone();
        sorted.sort_unstable();
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
        } else {
            sorted[mid] as f64
        }
    }

    /// Population standard deviation
    pub fn std(&self) -> f64 {
        let mean = self.mean();
        let variance = self
            .counts
            .iter()
            .map(|&c| {
                let d = c as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / self.number() as f64;
        variance.sqrt()
    }

    /// Sorted `(count, number of k-mers with that count)` pairs
    pub fn distribution(&self) -> Vec<(u64, usize)> {
        let mut distribution = BTreeMap::new();
        for &count in &self.counts {
            *distribution.entry(count).or_insert(0) += 1;
        }
        distribution.into_iter().collect()
    }

    pub(crate) fn check_compatible(&self, other: &Profile) -> Result<()> {
        if self.length != other.length {
            return Err(ProfileError::IncompatibleProfile {
                left: self.length,
                right: other.length,
            });
        }
        Ok(())
    }
}

/// K-mer length of a count vector with `len` entries
pub(crate) fn length_of(len: usize) -> Result<usize> {
    if len < codec::ALPHABET_SIZE || !len.is_power_of_two() || len.trailing_zeros() % 2 != 0 {
        return Err(ProfileError::InvalidCounts { len });
    }
    let length = len.trailing_zeros() as usize / 2;
    codec::check_length(length)?;
    Ok(length)
}
