use log::debug;
use rayon::prelude::*;

use super::codec::{check_length, encode_base, kmer_mask, number_of_kmers};
use crate::error::Result;
use crate::profile::Profile;

/// Dense k-mer counter indexed by k-mer rank
pub struct KmerCounter {
    k: usize,
    counts: Vec<u64>,
}

impl KmerCounter {
    /// Create a new KmerCounter with specified k-mer size
    pub fn new(k: usize) -> Result<Self> {
        check_length(k)?;
        Ok(KmerCounter {
            k,
            counts: vec![0; number_of_kmers(k)],
        })
    }

    /// Count k-mers in a sequence
    ///
    /// Windows spanning a character outside {A,C,G,T} are skipped.
    pub fn count_sequence(&mut self, sequence: &[u8]) {
        count_into(&mut self.counts, self.k, sequence);
    }

    /// Process sequences in parallel using rayon
    pub fn count_sequences<I>(&mut self, sequences: I)
    where
        I: ParallelIterator<Item = Vec<u8>>,
    {
        let k = self.k;
        let size = self.counts.len();

        let partial = sequences
            .fold(
                || vec![0u64; size],
                |mut counts, sequence| {
                    count_into(&mut counts, k, &sequence);
                    counts
                },
            )
            .reduce(
                || vec![0u64; size],
                |mut left, right| {
                    left.iter_mut().zip(right).for_each(|(l, r)| *l += r);
                    left
                },
            );

        self.counts
            .iter_mut()
            .zip(partial)
            .for_each(|(count, extra)| *count += extra);
    }

    /// Get the k-mer size
    pub fn kmer_size(&self) -> usize {
        self.k
    }

    /// Get the number of distinct k-mers seen at least once
    pub fn unique_kmers(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Get the total number of k-mers (including duplicates)
    pub fn total_kmers(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Finish counting and produce a profile
    pub fn into_profile(self, name: Option<String>) -> Profile {
        debug!(
            "Counted {} k-mers ({} distinct) of length {}",
            self.total_kmers(),
            self.unique_kmers(),
            self.k
        );
        Profile::from_parts(self.k, self.counts, name)
    }
}

/// Rolling 2k-bit window over `sequence`, adding every complete k-mer to
/// `counts`. An invalid character resets the window.
pub(crate) fn count_into(counts: &mut [u64], k: usize, sequence: &[u8]) {
    let mask = kmer_mask(k);
    let mut binary = 0u64;
    let mut valid = 0usize;

    for &base in sequence {
        match encode_base(base) {
            Some(code) => {
                binary = ((binary << 2) | code) & mask;
                valid += 1;
                if valid >= k {
                    counts[binary as usize] += 1;
                }
            }
            None => {
                binary = 0;
                valid = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmer::codec::encode;

    fn count_of(counter: &KmerCounter, kmer: &str) -> u64 {
        counter.counts[encode(kmer.as_bytes()).unwrap() as usize]
    }

    #[test]
    fn test_basic_counting() {
        let mut counter = KmerCounter::new(3).unwrap();
        counter.count_sequence(b"ATGATG");

        assert_eq!(count_of(&counter, "ATG"), 2);
        assert_eq!(count_of(&counter, "TGA"), 1);
        assert_eq!(count_of(&counter, "GAT"), 1);
        assert_eq!(counter.total_kmers(), 4);
    }

    #[test]
    fn test_short_sequence() {
        let mut counter = KmerCounter::new(3).unwrap();
        counter.count_sequence(b"AT"); // shorter than k
        assert_eq!(counter.unique_kmers(), 0);
        assert_eq!(counter.total_kmers(), 0);
    }

    #[test]
    fn test_sequence_of_exactly_k() {
        let mut counter = KmerCounter::new(4).unwrap();
        counter.count_sequence(b"GATC");
        assert_eq!(counter.total_kmers(), 1);
        assert_eq!(count_of(&counter, "GATC"), 1);
    }

    #[test]
    fn test_invalid_characters_reset_window() {
        let mut counter = KmerCounter::new(3).unwrap();
        counter.count_sequence(b"ACGNACGTN");

        // ACG before the N, then ACG and CGT after it
        assert_eq!(counter.total_kmers(), 3);
        assert_eq!(count_of(&counter, "ACG"), 2);
        assert_eq!(count_of(&counter, "CGT"), 1);
        assert_eq!(count_of(&counter, "CGA"), 0);
        assert_eq!(count_of(&counter, "GAC"), 0);
    }

    #[test]
    fn test_total_is_windows() {
        let sequence = b"ACGTTGCAAGGCTTAACCGGTATATCG";
        for k in 1..=8 {
            let mut counter = KmerCounter::new(k).unwrap();
            counter.count_sequence(sequence);
            assert_eq!(counter.total_kmers(), (sequence.len() - k + 1) as u64);
        }
    }

    #[test]
    fn test_multiple_sequences() {
        let mut counter = KmerCounter::new(2).unwrap();
        counter.count_sequence(b"ATCG");
        counter.count_sequence(b"CGAT");

        assert_eq!(count_of(&counter, "AT"), 2);
        assert_eq!(count_of(&counter, "TC"), 1);
        assert_eq!(count_of(&counter, "CG"), 2);
        assert_eq!(count_of(&counter, "GA"), 1);
    }

    #[test]
    fn test_empty_sequence() {
        let mut counter = KmerCounter::new(3).unwrap();
        counter.count_sequence(b"");
        assert_eq!(counter.unique_kmers(), 0);
        assert_eq!(counter.total_kmers(), 0);
    }

    #[test]
    fn test_parallel_counting() {
        let mut counter = KmerCounter::new(2).unwrap();
        let sequences = vec![
            b"ATCG".to_vec(),
            b"CGAT".to_vec(),
        ];

        counter.count_sequences(sequences.into_par_iter());

        assert_eq!(count_of(&counter, "AT"), 2);
        assert_eq!(count_of(&counter, "TC"), 1);
        assert_eq!(count_of(&counter, "CG"), 2);
        assert_eq!(count_of(&counter, "GA"), 1);
    }

    #[test]
    fn test_invalid_kmer_size() {
        assert!(KmerCounter::new(0).is_err());
        assert!(KmerCounter::new(32).is_err());
    }
}
