use std::fmt;
use std::str::FromStr;

use super::codec;
use crate::error::{ProfileError, Result};

/// A k-mer held as its rank together with its length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Kmer {
    index: u64,
    length: usize,
}

impl Kmer {
    /// Encode an upper-case nucleotide word
    pub fn new(sequence: &[u8]) -> Result<Self> {
        let index = codec::encode(sequence)?;
        Ok(Kmer {
            index,
            length: sequence.len(),
        })
    }

    /// Build a k-mer from a rank, which must be below 4^length
    pub fn from_index(index: u64, length: usize) -> Result<Self> {
        codec::check_length(length)?;
        if index > codec::kmer_mask(length) {
            return Err(ProfileError::IndexOutOfRange { index, length });
        }
        Ok(Kmer { index, length })
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn reverse_complement(&self) -> Self {
        Kmer {
            index: codec::reverse_complement_index(self.index, self.length),
            length: self.length,
        }
    }

    pub fn is_palindrome(&self) -> bool {
        codec::is_palindrome(self.index, self.length)
    }

    /// Decoded nucleotide string
    pub fn sequence(&self) -> String {
        codec::decode_unchecked(self.index, self.length)
    }
}

impl fmt::Display for Kmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sequence())
    }
}

impl FromStr for Kmer {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self> {
        Kmer::new(s.to_ascii_uppercase().as_bytes())
    }
}
