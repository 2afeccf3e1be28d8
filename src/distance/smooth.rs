//! Adaptive-resolution smoothing of a pair of profiles
//!
//! Both profiles are walked together over blocks of the k-mer index space.
//! A block is split into its four sub-blocks (one more base of resolution)
//! while both profiles have enough support there, and collapsed into a single
//! aggregate count otherwise. Collapsed regions carry the same total as a
//! shrink of that block would.

use log::debug;
use serde::Serialize;

use super::metrics::Summary;
use crate::error::{ProfileError, Result};
use crate::kmer::ALPHABET_SIZE;
use crate::profile::Profile;

/// A contiguous range of k-mer ranks with one aggregate count per profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub start: usize,
    pub len: usize,
    pub left: u64,
    pub right: u64,
}

/// Variable-resolution representation of two smoothed profiles
///
/// Segments are ordered by `start` and cover `0..number` without gaps or
/// overlaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmoothedPair {
    pub number: usize,
    pub segments: Vec<Segment>,
}

impl SmoothedPair {
    /// Re-expand to full-length count vectors, placing each aggregate at the
    /// start of its segment and zero elsewhere
    pub fn flatten(&self) -> (Vec<u64>, Vec<u64>) {
        let mut left = vec![0; self.number];
        let mut right = vec![0; self.number];
        for segment in &self.segments {
            left[segment.start] = segment.left;
            right[segment.start] = segment.right;
        }
        (left, right)
    }

    /// Number of segments that lost resolution
    pub fn collapsed(&self) -> usize {
        self.segments.iter().filter(|s| s.len > 1).count()
    }
}

/// Smoothing parameters: summary function and threshold
#[derive(Debug, Clone, Default)]
pub struct Smoother {
    summary: Summary,
    threshold: f64,
}

impl Smoother {
    pub fn new(summary: Summary, threshold: f64) -> Self {
        Smoother { summary, threshold }
    }

    /// Smooth two profiles of equal length
    pub fn smooth(&self, left: &Profile, right: &Profile) -> Result<SmoothedPair> {
        left.check_compatible(right)?;
        self.smooth_counts(left.counts(), right.counts())
    }

    /// Smooth two raw count vectors whose length is a power of four
    pub fn smooth_counts(&self, left: &[u64], right: &[u64]) -> Result<SmoothedPair> {
        if left.len() != right.len() {
            return Err(ProfileError::IncompatibleProfile {
                left: left.len(),
                right: right.len(),
            });
        }
        let number = left.len();
        if !is_power_of_alphabet(number) {
            return Err(ProfileError::InvalidRange { length: number });
        }

        let mut segments = Vec::new();
        let mut stack = vec![(0usize, number)];

        while let Some((start, len)) = stack.pop() {
            if len == 1 {
                segments.push(Segment {
                    start,
                    len,
                    left: left[start],
                    right: right[start],
                });
                continue;
            }

            let left_blocks = collapse(left, start, len);
            let right_blocks = collapse(right, start, len);

            let support = self
                .summary
                .apply(&left_blocks.map(|c| c as f64))
                .min(self.summary.apply(&right_blocks.map(|c| c as f64)));

            if support <= self.threshold {
                segments.push(Segment {
                    start,
                    len,
                    left: left_blocks.iter().sum(),
                    right: right_blocks.iter().sum(),
                });
                continue;
            }

            // Reverse order so the lowest block is visited first
            let step = len / ALPHABET_SIZE;
            for i in (0..ALPHABET_SIZE).rev() {
                stack.push((start + i * step, step));
            }
        }

        let pair = SmoothedPair { number, segments };
        debug!(
            "Smoothing kept {} segments, {} collapsed",
            pair.segments.len(),
            pair.collapsed()
        );
        Ok(pair)
    }

    /// Smooth two profiles and re-expand the result into profiles
    pub fn smooth_profiles(&self, left: &Profile, right: &Profile) -> Result<(Profile, Profile)> {
        let (left_counts, right_counts) = self.smooth(left, right)?.flatten();
        Ok((
            Profile::from_parts(left.length(), left_counts, left.name.clone()),
            Profile::from_parts(right.length(), right_counts, right.name.clone()),
        ))
    }
}

/// Sums of the four equal sub-blocks of `vector[start..start + len]`
fn collapse(vector: &[u64], start: usize, len: usize) -> [u64; ALPHABET_SIZE] {
    let step = len / ALPHABET_SIZE;
    let mut blocks = [0u64; ALPHABET_SIZE];
    for (i, block) in blocks.iter_mut().enumerate() {
        let from = start + i * step;
        *block = vector[from..from + step].iter().sum();
    }
    blocks
}

fn is_power_of_alphabet(n: usize) -> bool {
    n.is_power_of_two() && n.trailing_zeros() % 2 == 0
}
