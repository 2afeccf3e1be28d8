use thiserror::Error;

/// Errors raised by the numeric profile engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// A character outside {A,C,G,T} where a full k-mer is required
    #[error("invalid base {base:?} at position {position}")]
    InvalidBase { base: char, position: usize },

    /// Two operands do not share the same k-mer length
    #[error("incompatible profiles: lengths {left} and {right} differ")]
    IncompatibleProfile { left: usize, right: usize },

    /// Shrinking by `levels` would leave no k-mer length
    #[error("cannot shrink a profile of length {length} by {levels} levels")]
    InvalidShrink { levels: usize, length: usize },

    /// Smoothing range is not a power of the alphabet size
    #[error("range of length {length} is not a power of 4")]
    InvalidRange { length: usize },

    /// K-mer length outside the supported range
    #[error("k-mer length {length} is not supported (expected 1..=31)")]
    InvalidLength { length: usize },

    /// Rank outside 0..4^k
    #[error("index {index} is out of range for k-mers of length {length}")]
    IndexOutOfRange { index: u64, length: usize },

    /// Raw count vector whose length is not 4^k
    #[error("count vector of length {len} does not describe a k-mer profile")]
    InvalidCounts { len: usize },
}

pub type Result<T> = std::result::Result<T, ProfileError>;
