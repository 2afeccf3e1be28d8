pub(crate) mod codec;
pub(crate) mod counter;
pub(crate) mod types;

pub use codec::{
    check_length, decode, encode, is_palindrome, number_of_kmers, reverse_complement_index,
    ALPHABET_SIZE, MAX_KMER_LENGTH,
};
pub use counter::KmerCounter;
pub use types::Kmer;
