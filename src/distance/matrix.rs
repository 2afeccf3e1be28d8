use log::info;
use rayon::prelude::*;

use super::engine::ProfileDistance;
use crate::error::Result;
use crate::profile::Profile;

/// Lower-triangular matrix of pairwise distances
///
/// Row `i - 1` holds the distances of profile `i` to profiles `0..i`, in
/// input order.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    names: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    /// Compute all `n(n-1)/2` distances, in parallel across rows
    ///
    /// Unnamed profiles are labelled by their 1-based position.
    pub fn build(profiles: &[Profile], distance: &ProfileDistance) -> Result<Self> {
        if let Some(first) = profiles.first() {
            for profile in &profiles[1..] {
                first.check_compatible(profile)?;
            }
        }

        info!(
            "Computing {} pairwise distances",
            profiles.len() * profiles.len().saturating_sub(1) / 2
        );

        let rows = (1..profiles.len())
            .into_par_iter()
            .map(|i| {
                (0..i)
                    .map(|j| distance.distance(&profiles[i], &profiles[j]))
                    .collect::<Result<Vec<f64>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let names = profiles
            .iter()
            .enumerate()
            .map(|(i, p)| p.name.clone().unwrap_or_else(|| (i + 1).to_string()))
            .collect();

        Ok(DistanceMatrix { names, rows })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Distance between profiles `i` and `j`
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        match i.cmp(&j) {
            std::cmp::Ordering::Equal => (i < self.len()).then_some(0.0),
            std::cmp::Ordering::Greater => self.rows.get(i - 1)?.get(j).copied(),
            std::cmp::Ordering::Less => self.rows.get(j - 1)?.get(i).copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profiles() -> Vec<Profile> {
        vec![
            Profile::from_sequence(b"ACGTTGCAAGGCTTAACCGG", 2).unwrap().with_name("a"),
            Profile::from_sequence(b"TTTTGGGCAAACCCGTAGTA", 2).unwrap().with_name("b"),
            Profile::from_sequence(b"ACGTTGCAAGGCTTAACCGG", 2).unwrap().with_name("c"),
        ]
    }

    #[test]
    fn test_matrix_shape() {
        let matrix = DistanceMatrix::build(&profiles(), &ProfileDistance::default()).unwrap();
        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix.names(), &["a", "b", "c"]);
        assert_eq!(matrix.rows().len(), 2);
        assert_eq!(matrix.rows()[0].len(), 1);
        assert_eq!(matrix.rows()[1].len(), 2);
    }

    #[test]
    fn test_matrix_values() {
        let profiles = profiles();
        let dist = ProfileDistance::default();
        let matrix = DistanceMatrix::build(&profiles, &dist).unwrap();

        let ab = dist.distance(&profiles[0], &profiles[1]).unwrap();
        assert_eq!(matrix.get(1, 0), Some(ab));
        assert_eq!(matrix.get(0, 1), Some(ab));
        assert_eq!(matrix.get(2, 0), Some(0.0));
        assert_eq!(matrix.get(2, 1), Some(ab));
        assert_eq!(matrix.get(1, 1), Some(0.0));
        assert_eq!(matrix.get(3, 0), None);
    }

    #[test]
    fn test_single_profile() {
        let matrix = DistanceMatrix::build(&profiles()[..1], &ProfileDistance::default()).unwrap();
        assert_eq!(matrix.names(), &["a"]);
        assert!(matrix.rows().is_empty());
    }

    #[test]
    fn test_unnamed_profiles_are_numbered() {
        let profiles = vec![Profile::empty(2).unwrap(), Profile::empty(2).unwrap()];
        let matrix = DistanceMatrix::build(&profiles, &ProfileDistance::default()).unwrap();
        assert_eq!(matrix.names(), &["1", "2"]);
    }

    #[test]
    fn test_mixed_lengths_rejected() {
        let profiles = vec![Profile::empty(2).unwrap(), Profile::empty(3).unwrap()];
        assert!(DistanceMatrix::build(&profiles, &ProfileDistance::default()).is_err());
    }
}
