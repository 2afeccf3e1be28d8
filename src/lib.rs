//! Build, store and compare k-mer frequency profiles.
//!
//! A profile holds one count per k-mer of a fixed length `k`, indexed by the
//! 2-bit encoding of the k-mer (`A=0, C=1, G=2, T=3`), so the index order is
//! lexicographic order. Profiles can be merged, balanced over reverse
//! complements, shrunk to a shorter `k`, scaled, smoothed pairwise, and
//! compared with a configurable distance.

pub mod db;
pub mod distance;
pub mod error;
pub mod io;
pub mod kmer;
pub mod profile;

pub use distance::{DistanceConfig, DistanceMatrix, ProfileDistance};
pub use error::{ProfileError, Result};
pub use kmer::{Kmer, KmerCounter};
pub use profile::{Merger, Profile};
