//! Two-bit nucleotide codec
//!
//! Bases map to A=00, C=01, G=10, T=11, so complementary bases are bitwise
//! complements and the packed value of a k-mer equals its lexicographic rank.

use crate::error::{ProfileError, Result};

/// Number of symbols in the DNA alphabet
pub const ALPHABET_SIZE: usize = 4;

/// Longest k-mer whose rank fits comfortably in a `u64`
pub const MAX_KMER_LENGTH: usize = 31;

/// Encode a single upper-case nucleotide to 2 bits
#[inline]
pub const fn encode_base(base: u8) -> Option<u64> {
    match base {
        b'A' => Some(0b00),
        b'C' => Some(0b01),
        b'G' => Some(0b10),
        b'T' => Some(0b11),
        _ => None,
    }
}

/// Decode a 2-bit value to its nucleotide
#[inline]
pub const fn decode_base(bits: u64) -> u8 {
    match bits & 0b11 {
        0b00 => b'A',
        0b01 => b'C',
        0b10 => b'G',
        _ => b'T',
    }
}

/// Check that `length` is a usable k-mer length
pub fn check_length(length: usize) -> Result<()> {
    if length == 0 || length > MAX_KMER_LENGTH {
        return Err(ProfileError::InvalidLength { length });
    }
    Ok(())
}

/// Number of distinct k-mers of the given length (4^k)
#[inline]
pub fn number_of_kmers(length: usize) -> usize {
    1usize << (2 * length)
}

/// Bitmask covering the low `2k` bits
#[inline]
pub(crate) fn kmer_mask(length: usize) -> u64 {
    (1u64 << (2 * length)) - 1
}

/// Encode a k-mer to its rank
///
/// Input must already be upper case.
///
/// # Errors
/// `InvalidBase` on any character outside {A,C,G,T}, `InvalidLength` when the
/// k-mer is empty or longer than [`MAX_KMER_LENGTH`].
pub fn encode(kmer: &[u8]) -> Result<u64> {
    check_length(kmer.len())?;

    kmer.iter().enumerate().try_fold(0u64, |binary, (position, &base)| -> Result<u64> {
        let code = encode_base(base).ok_or(ProfileError::InvalidBase {
            base: base as char,
            position,
        })?;
        Ok((binary << 2) | code)
    })
}

/// Decode a rank back to its k-mer string
///
/// # Errors
/// `InvalidLength` as for [`encode`], `IndexOutOfRange` when `index` is not
/// below 4^`length`.
pub fn decode(index: u64, length: usize) -> Result<String> {
    check_length(length)?;
    if index > kmer_mask(length) {
        return Err(ProfileError::IndexOutOfRange { index, length });
    }
    Ok(decode_unchecked(index, length))
}

/// Low `2 * length` bits of `index` as a k-mer string; callers check range
pub(crate) fn decode_unchecked(index: u64, length: usize) -> String {
    (0..length)
        .rev()
        .map(|i| decode_base(index >> (2 * i)) as char)
        .collect()
}

/// Rank of the reverse complement of the k-mer with rank `index`
///
/// Complements every base (bitwise NOT) and reverses the order of the 2-bit
/// groups.
pub fn reverse_complement_index(index: u64, length: usize) -> u64 {
    let mut number = !index;
    let mut result = 0u64;

    for _ in 0..length {
        result = (result << 2) | (number & 0b11);
        number >>= 2;
    }

    result
}

/// Whether the k-mer with rank `index` equals its own reverse complement
#[inline]
pub fn is_palindrome(index: u64, length: usize) -> bool {
    reverse_complement_index(index, length) == index
}

#[cfg(test)]
mod tests {
    use super::*;
    use bio::alphabets::dna::revcomp;

    fn all_kmers(length: usize) -> Vec<String> {
        (0..number_of_kmers(length) as u64)
            .map(|i| decode(i, length).unwrap())
            .collect()
    }

    #[test]
    fn test_encode_is_lexicographic_rank() {
        assert_eq!(encode(b"A").unwrap(), 0);
        assert_eq!(encode(b"T").unwrap(), 3);
        assert_eq!(encode(b"AC").unwrap(), 1);
        assert_eq!(encode(b"CA").unwrap(), 4);
        assert_eq!(encode(b"TTTT").unwrap(), 255);

        let kmers = all_kmers(3);
        let mut sorted = kmers.clone();
        sorted.sort();
        assert_eq!(kmers, sorted);
    }

    #[test]
    fn test_round_trip_lengths_1_to_8() {
        for length in 1..=8 {
            let step = (number_of_kmers(length) / 97).max(1);
            for index in (0..number_of_kmers(length)).step_by(step) {
                let kmer = decode(index as u64, length).unwrap();
                assert_eq!(kmer.len(), length);
                assert_eq!(encode(kmer.as_bytes()).unwrap(), index as u64);
            }
        }
    }

    #[test]
    fn test_encode_invalid_base() {
        assert_eq!(
            encode(b"ACNT"),
            Err(ProfileError::InvalidBase { base: 'N', position: 2 })
        );
        // Lower case is normalised by the caller, not here
        assert!(matches!(encode(b"acgt"), Err(ProfileError::InvalidBase { .. })));
    }

    #[test]
    fn test_invalid_lengths() {
        assert_eq!(encode(b""), Err(ProfileError::InvalidLength { length: 0 }));
        assert!(decode(0, 0).is_err());
        assert!(decode(0, MAX_KMER_LENGTH + 1).is_err());
        assert_eq!(decode(0, MAX_KMER_LENGTH).unwrap(), "A".repeat(MAX_KMER_LENGTH));
    }

    #[test]
    fn test_decode_rejects_index_out_of_range() {
        assert_eq!(decode(15, 2).unwrap(), "TT");
        assert_eq!(
            decode(16, 2),
            Err(ProfileError::IndexOutOfRange { index: 16, length: 2 })
        );
        assert_eq!(
            decode(u64::MAX, 1),
            Err(ProfileError::IndexOutOfRange { index: u64::MAX, length: 1 })
        );
        assert_eq!(
            decode(u64::MAX >> 2, MAX_KMER_LENGTH).unwrap(),
            "T".repeat(MAX_KMER_LENGTH)
        );
    }

    #[test]
    fn test_reverse_complement_matches_reference() {
        for length in 1..=5 {
            for kmer in all_kmers(length) {
                let index = encode(kmer.as_bytes()).unwrap();
                let expected = revcomp(kmer.as_bytes());
                let rc = reverse_complement_index(index, length);
                assert_eq!(decode(rc, length).unwrap().as_bytes(), expected.as_slice());
            }
        }
    }

    #[test]
    fn test_reverse_complement_is_involution() {
        for length in 1..=6 {
            for index in 0..number_of_kmers(length) as u64 {
                let rc = reverse_complement_index(index, length);
                assert_eq!(reverse_complement_index(rc, length), index);
            }
        }
    }

    #[test]
    fn test_palindromes() {
        // Odd lengths have no palindromes
        assert!((0..64).all(|i| !is_palindrome(i, 3)));

        let palindromes: Vec<String> = (0..16)
            .filter(|&i| is_palindrome(i, 2))
            .map(|i| decode(i, 2).unwrap())
            .collect();
        assert_eq!(palindromes, vec!["AT", "CG", "GC", "TA"]);

        assert!(is_palindrome(encode(b"ACGT").unwrap(), 4));
        assert!(!is_palindrome(encode(b"AACC").unwrap(), 4));
    }
}
