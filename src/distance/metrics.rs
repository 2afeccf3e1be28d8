//! Vector metrics over k-mer count vectors

use std::fmt;
use std::sync::Arc;

use crate::error::{ProfileError, Result};

/// Pairwise function used by the multiset distance
#[derive(Clone, Default)]
pub enum Pairwise {
    /// `|x - y| / ((x + 1)(y + 1))`
    #[default]
    Prod,
    /// `|x - y| / (x + y + 1)`
    Sum,
    /// User-supplied function, expected to be symmetric, non-negative and
    /// zero iff `x == y`
    Custom(Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>),
}

impl Pairwise {
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> f64 {
        match self {
            Pairwise::Prod => (x - y).abs() / ((x + 1.0) * (y + 1.0)),
            Pairwise::Sum => (x - y).abs() / (x + y + 1.0),
            Pairwise::Custom(f) => f(x, y),
        }
    }
}

impl fmt::Debug for Pairwise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pairwise::Prod => write!(f, "Prod"),
            Pairwise::Sum => write!(f, "Sum"),
            Pairwise::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Summary of a vector, used to decide where smoothing collapses
#[derive(Clone, Default)]
pub enum Summary {
    #[default]
    Min,
    Mean,
    Median,
    Custom(Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>),
}

impl Summary {
    /// Summarise a non-empty vector
    pub fn apply(&self, values: &[f64]) -> f64 {
        match self {
            Summary::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Summary::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Summary::Median => {
                let mut sorted = values.to_vec();
                sorted.sort_by(f64::total_cmp);
                let mid = sorted.len() / 2;
                if sorted.len() % 2 == 0 {
                    (sorted[mid - 1] + sorted[mid]) / 2.0
                } else {
                    sorted[mid]
                }
            }
            Summary::Custom(f) => f(values),
        }
    }
}

impl fmt::Debug for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::Min => write!(f, "Min"),
            Summary::Mean => write!(f, "Mean"),
            Summary::Median => write!(f, "Median"),
            Summary::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Distance applied as the last step of a comparison
#[derive(Debug, Clone)]
pub enum Metric {
    Multiset(Pairwise),
    Euclidean,
    Cosine,
}

impl Default for Metric {
    fn default() -> Self {
        Metric::Multiset(Pairwise::default())
    }
}

impl Metric {
    pub fn distance(&self, left: &[f64], right: &[f64]) -> Result<f64> {
        match self {
            Metric::Multiset(pairwise) => multiset(left, right, pairwise),
            Metric::Euclidean => euclidean(left, right),
            Metric::Cosine => cosine(left, right),
        }
    }
}

fn check_lengths(left: &[f64], right: &[f64]) -> Result<()> {
    if left.len() != right.len() {
        return Err(ProfileError::IncompatibleProfile {
            left: left.len(),
            right: right.len(),
        });
    }
    Ok(())
}

/// Euclidean length of a vector
pub fn vector_length(vector: &[f64]) -> f64 {
    vector.iter().map(|v| v * v).sum::<f64>().sqrt()
}

/// Euclidean distance between two vectors
pub fn euclidean(left: &[f64], right: &[f64]) -> Result<f64> {
    check_lengths(left, right)?;
    Ok(left
        .iter()
        .zip(right)
        .map(|(l, r)| (l - r) * (l - r))
        .sum::<f64>()
        .sqrt())
}

/// One minus the cosine similarity, or 0 when either vector has zero norm
pub fn cosine(left: &[f64], right: &[f64]) -> Result<f64> {
    check_lengths(left, right)?;

    let norms = vector_length(left) * vector_length(right);
    if norms == 0.0 {
        return Ok(0.0);
    }
    let dot: f64 = left.iter().zip(right).map(|(l, r)| l * r).sum();
    Ok(1.0 - dot / norms)
}

/// Multiset distance: the pairwise function summed over every position that
/// is non-zero in either vector, divided by the number of such positions
/// plus one
pub fn multiset(left: &[f64], right: &[f64], pairwise: &Pairwise) -> Result<f64> {
    check_lengths(left, right)?;

    let (sum, support) = left
        .iter()
        .zip(right)
        .filter(|&(&l, &r)| l != 0.0 || r != 0.0)
        .fold((0.0, 0usize), |(sum, support), (&l, &r)| {
            (sum + pairwise.apply(l, r), support + 1)
        });
    Ok(sum / (support + 1) as f64)
}
