use std::fmt;
use std::sync::Arc;

use log::debug;

use super::types::Profile;
use crate::distance::{multiset, Pairwise};
use crate::error::{ProfileError, Result};
use crate::kmer::{reverse_complement_index, ALPHABET_SIZE};

/// Element-wise merge strategy
#[derive(Clone, Default)]
pub enum Merger {
    /// `x + y`
    #[default]
    Sum,
    /// `x + y` where exactly one side is non-zero, else 0
    Xor,
    /// `x` where `y` is non-zero
    Intersect,
    /// `x` where `y` is zero
    NotIntersect,
    /// User-supplied function
    Custom(Arc<dyn Fn(u64, u64) -> u64 + Send + Sync>),
}

impl Merger {
    pub fn apply(&self, x: u64, y: u64) -> u64 {
        match self {
            Merger::Sum => x + y,
            Merger::Xor => {
                if (x == 0) != (y == 0) {
                    x + y
                } else {
                    0
                }
            }
            Merger::Intersect => {
                if y != 0 {
                    x
                } else {
                    0
                }
            }
            Merger::NotIntersect => {
                if y == 0 {
                    x
                } else {
                    0
                }
            }
            Merger::Custom(f) => f(x, y),
        }
    }
}

impl fmt::Debug for Merger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Merger::Sum => write!(f, "Sum"),
            Merger::Xor => write!(f, "Xor"),
            Merger::Intersect => write!(f, "Intersect"),
            Merger::NotIntersect => write!(f, "NotIntersect"),
            Merger::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl Profile {
    /// Element-wise sum of two profiles of equal length
    pub fn merge(&self, other: &Profile) -> Result<Profile> {
        self.merge_with(other, &Merger::Sum)
    }

    /// Merge two profiles with the given strategy
    ///
    /// The result keeps the name of `self`.
    pub fn merge_with(&self, other: &Profile, merger: &Merger) -> Result<Profile> {
        self.check_compatible(other)?;

        let counts = self
            .counts()
            .iter()
            .zip(other.counts())
            .map(|(&x, &y)| merger.apply(x, y))
            .collect();
        Ok(Profile::from_parts(self.length(), counts, self.name.clone()))
    }

    /// Add the count of each k-mer's reverse complement to it
    ///
    /// Palindromes are their own pair and keep their count unchanged.
    pub fn balance(&self) -> Profile {
        let length = self.length();
        let counts = self.counts();

        let balanced = (0..counts.len())
            .map(|i| {
                let rc = reverse_complement_index(i as u64, length) as usize;
                if rc == i {
                    counts[i]
                } else {
                    counts[i] + counts[rc]
                }
            })
            .collect();
        Profile::from_parts(length, balanced, self.name.clone())
    }

    /// Split into forward and reverse-complement groups
    ///
    /// Position `j` of both groups holds a k-mer and its reverse complement,
    /// with the lexicographically smaller one in the forward group. Counts are
    /// doubled so a palindrome's count is shared evenly between the groups.
    /// The groups are plain count vectors, not profiles.
    pub fn split(&self) -> (Vec<u64>, Vec<u64>) {
        let length = self.length();
        let counts = self.counts();
        let mut forward = Vec::with_capacity(counts.len() / 2);
        let mut reverse = Vec::with_capacity(counts.len() / 2);

        for (i, &count) in counts.iter().enumerate() {
            let rc = reverse_complement_index(i as u64, length) as usize;
            if i < rc {
                forward.push(count * 2);
                reverse.push(counts[rc] * 2);
            } else if i == rc {
                forward.push(count);
                reverse.push(count);
            }
        }

        (forward, reverse)
    }

    /// Multiset distance between the two halves of [`Profile::split`]
    ///
    /// Zero for a profile that is perfectly strand balanced.
    pub fn balance_distance(&self) -> Result<f64> {
        let (forward, reverse) = self.split();
        let forward: Vec<f64> = forward.into_iter().map(|c| c as f64).collect();
        let reverse: Vec<f64> = reverse.into_iter().map(|c| c as f64).collect();
        multiset(&forward, &reverse, &Pairwise::Prod)
    }

    /// Reduce the k-mer length by `levels`, summing counts over the trailing
    /// bases
    ///
    /// Shrinking approximates counting at the lower length: k-mers at the
    /// end of each sequence are under-represented.
    pub fn shrink(&self, levels: usize) -> Result<Profile> {
        if levels >= self.length() {
            return Err(ProfileError::InvalidShrink {
                levels,
                length: self.length(),
            });
        }

        let block = ALPHABET_SIZE.pow(levels as u32);
        let counts = self
            .counts()
            .chunks_exact(block)
            .map(|chunk| chunk.iter().sum())
            .collect();
        Ok(Profile::from_parts(self.length() - levels, counts, self.name.clone()))
    }

    /// Keep only counts that are non-zero in both profiles
    pub fn positive(&self, other: &Profile) -> Result<(Profile, Profile)> {
        let left = self.merge_with(other, &Merger::Intersect)?;
        let right = other.merge_with(self, &Merger::Intersect)?;
        Ok((left, right))
    }
}

/// Scaling factors that equalise two totals
///
/// The lower total gets a factor above one and the other gets one. With
/// `down`, both are divided by the larger factor so the higher total is
/// scaled down instead. An empty side cannot be scaled and leaves both
/// factors at one.
pub fn scale_factors(left_total: f64, right_total: f64, down: bool) -> (f64, f64) {
    if left_total <= 0.0 || right_total <= 0.0 {
        return (1.0, 1.0);
    }

    let (left, right) = if left_total < right_total {
        (right_total / left_total, 1.0)
    } else {
        (1.0, left_total / right_total)
    };

    if down {
        let factor = left.max(right);
        (left / factor, right / factor)
    } else {
        (left, right)
    }
}

/// Rescale two profiles to equal totals
pub fn scale(left: &Profile, right: &Profile, down: bool) -> Result<(Vec<f64>, Vec<f64>)> {
    left.check_compatible(right)?;
    Ok(scale_counts(&left.to_f64(), &right.to_f64(), down))
}

pub(crate) fn scale_counts(left: &[f64], right: &[f64], down: bool) -> (Vec<f64>, Vec<f64>) {
    let (left_scale, right_scale) =
        scale_factors(left.iter().sum(), right.iter().sum(), down);
    debug!("Scaling factors {} and {}", left_scale, right_scale);

    (
        left.iter().map(|c| c * left_scale).collect(),
        right.iter().map(|c| c * right_scale).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmer::{encode, is_palindrome};
    use pretty_assertions::assert_eq;

    fn profile(sequence: &[u8], k: usize) -> Profile {
        Profile::from_sequence(sequence, k).unwrap()
    }

    #[test]
    fn test_merge_matches_concatenation() {
        let left = profile(b"ACGTTGCA", 3);
        let right = profile(b"GGATCCA", 3);
        let merged = left.merge(&right).unwrap();

        let both = Profile::from_sequences([&b"ACGTTGCA"[..], &b"GGATCCA"[..]], 3).unwrap();
        assert_eq!(merged.counts(), both.counts());
        assert_eq!(merged.total(), left.total() + right.total());
    }

    #[test]
    fn test_merge_commutative_and_associative() {
        let a = profile(b"ACGTTGCAACGT", 2);
        let b = profile(b"TTTTGGGCA", 2);
        let c = profile(b"GATTACA", 2);

        assert_eq!(a.merge(&b).unwrap().counts(), b.merge(&a).unwrap().counts());
        assert_eq!(
            a.merge(&b).unwrap().merge(&c).unwrap().counts(),
            a.merge(&b.merge(&c).unwrap()).unwrap().counts()
        );
    }

    #[test]
    fn test_merge_incompatible() {
        let a = profile(b"ACGT", 2);
        let b = profile(b"ACGT", 3);
        assert_eq!(
            a.merge(&b),
            Err(ProfileError::IncompatibleProfile { left: 2, right: 3 })
        );
    }

    #[test]
    fn test_mergers() {
        let a = Profile::from_counts(vec![0, 1, 2, 3], None).unwrap();
        let b = Profile::from_counts(vec![5, 0, 0, 1], None).unwrap();

        assert_eq!(a.merge_with(&b, &Merger::Xor).unwrap().counts(), &[5, 1, 2, 0]);
        assert_eq!(a.merge_with(&b, &Merger::Intersect).unwrap().counts(), &[0, 0, 0, 3]);
        assert_eq!(a.merge_with(&b, &Merger::NotIntersect).unwrap().counts(), &[0, 1, 2, 0]);

        let max = Merger::Custom(Arc::new(|x: u64, y: u64| x.max(y)));
        assert_eq!(a.merge_with(&b, &max).unwrap().counts(), &[5, 1, 2, 3]);
    }

    #[test]
    fn test_balance() {
        let p = profile(b"AAAACCCGT", 2);
        let balanced = p.balance();

        // AA pairs with TT
        let aa = encode(b"AA").unwrap() as usize;
        let tt = encode(b"TT").unwrap() as usize;
        assert_eq!(balanced.counts()[aa], 3);
        assert_eq!(balanced.counts()[tt], 3);

        // CG is a palindrome and keeps its count
        let cg = encode(b"CG").unwrap() as usize;
        assert_eq!(balanced.counts()[cg], p.counts()[cg]);
    }

    #[test]
    fn test_balance_is_symmetric() {
        let p = profile(b"ACGGTTACCATGCAGGATTTACGATCCCAGT", 3);
        let balanced = p.balance();
        for i in 0..balanced.number() {
            let rc = reverse_complement_index(i as u64, 3) as usize;
            assert_eq!(balanced.counts()[i], balanced.counts()[rc]);
        }
        assert_eq!(balanced.total(), 2 * p.total());
    }

    #[test]
    fn test_balance_palindrome() {
        let p = profile(b"ACGT", 4);
        let balanced = p.balance();
        assert_eq!(balanced.counts(), p.counts());
    }

    #[test]
    fn test_split() {
        let p = profile(b"AATTCGAC", 2);
        let (forward, reverse) = p.split();

        // 16 two-mers: 4 palindromes and 6 complementary pairs
        assert_eq!(forward.len(), 10);
        assert_eq!(reverse.len(), 10);

        let palindrome_slots = (0..16u64).filter(|&i| is_palindrome(i, 2)).count();
        assert_eq!(palindrome_slots, 4);

        // Counts are doubled, palindromes appear once per side
        let total: u64 = forward.iter().sum::<u64>() + reverse.iter().sum::<u64>();
        assert_eq!(total, 2 * p.total());

        // AA (forward) against TT (reverse) sit in the same slot
        assert_eq!(forward[0], 2 * p.counts()[0]);
        assert_eq!(reverse[0], 2 * p.counts()[15]);
    }

    #[test]
    fn test_balance_distance() {
        assert_eq!(profile(b"ACGT", 2).balance_distance().unwrap(), 0.0);
        assert_eq!(profile(b"ACGT", 2).balance().balance_distance().unwrap(), 0.0);

        // AA = 2 against TT = 0: |4 - 0| / 5 over one supported slot + 1
        assert_eq!(profile(b"AAA", 2).balance_distance().unwrap(), 0.4);
    }

    #[test]
    fn test_shrink_preserves_total() {
        let p = profile(b"ACGGTTACCATGCAGGATTTACGATCCCAGT", 4);
        let shrunk = p.shrink(1).unwrap();
        assert_eq!(shrunk.length(), 3);
        assert_eq!(shrunk.number(), 64);
        assert_eq!(shrunk.total(), p.total());

        let shrunk = p.shrink(3).unwrap();
        assert_eq!(shrunk.length(), 1);
        assert_eq!(shrunk.total(), p.total());
    }

    #[test]
    fn test_shrink_sums_trailing_bases() {
        let p = Profile::from_counts((0..16).collect(), None).unwrap();
        let shrunk = p.shrink(1).unwrap();
        assert_eq!(shrunk.counts(), &[6, 22, 38, 54]);
    }

    #[test]
    fn test_shrink_matches_prefix_counts() {
        // Shrinking drops the last window of each sequence at the lower k
        let p = profile(b"ACGTACGT", 4);
        let direct = profile(b"ACGTACG", 3);
        assert_eq!(p.shrink(1).unwrap().counts(), direct.counts());
    }

    #[test]
    fn test_shrink_too_far() {
        let p = profile(b"ACGT", 2);
        assert_eq!(
            p.shrink(2),
            Err(ProfileError::InvalidShrink { levels: 2, length: 2 })
        );
    }

    #[test]
    fn test_positive() {
        let a = Profile::from_counts(vec![0, 1, 2, 3], None).unwrap();
        let b = Profile::from_counts(vec![5, 0, 4, 1], None).unwrap();
        let (left, right) = a.positive(&b).unwrap();
        assert_eq!(left.counts(), &[0, 0, 2, 3]);
        assert_eq!(right.counts(), &[0, 0, 4, 1]);
    }

    #[test]
    fn test_scale_factors() {
        assert_eq!(scale_factors(10.0, 40.0, false), (4.0, 1.0));
        assert_eq!(scale_factors(40.0, 10.0, false), (1.0, 4.0));
        assert_eq!(scale_factors(10.0, 40.0, true), (1.0, 0.25));
        assert_eq!(scale_factors(0.0, 40.0, false), (1.0, 1.0));
    }

    #[test]
    fn test_scale_equalises_totals() {
        let a = profile(b"ACGTACGTAC", 2);
        let b = profile(b"ACGTACGTACGGATTACAGATTACA", 2);
        let (left, right) = scale(&a, &b, false).unwrap();

        let left_total: f64 = left.iter().sum();
        let right_total: f64 = right.iter().sum();
        assert!((left_total - right_total).abs() < 1e-9);
        assert_eq!(right, b.to_f64());

        // Zeros stay zero
        for (scaled, &count) in left.iter().zip(a.counts()) {
            assert_eq!(*scaled == 0.0, count == 0);
        }
    }

    #[test]
    fn test_scale_down() {
        let a = profile(b"ACGTACGTAC", 2);
        let b = profile(b"ACGTACGTACGGATTACAGATTACA", 2);
        let (left, right) = scale(&a, &b, true).unwrap();

        let left_total: f64 = left.iter().sum();
        let right_total: f64 = right.iter().sum();
        assert!((left_total - right_total).abs() < 1e-9);
        assert_eq!(left, a.to_f64());
    }
}
