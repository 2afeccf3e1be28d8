use std::path::{Path, PathBuf};
use anyhow::{Result, Context};
use needletail::{parse_fastx_file, Sequence};
use log::{info, warn};
use rayon::prelude::*;

use crate::kmer::KmerCounter;
use crate::profile::Profile;

/// Represents a FASTA/FASTQ sequence reader that can handle multiple files
pub struct FastxReader {
    files: Vec<PathBuf>
}

impl FastxReader {
    /// Create a new FastxReader from a list of input files
    pub fn new<P: AsRef<Path>>(files: Vec<P>) -> Self {
        let files = files.into_iter()
            .map(|p| p.as_ref().to_owned())
            .collect();

        FastxReader {
            files
        }
    }

    /// Process each sequence in all input files
    pub fn process_all<F>(&self, mut callback: F) -> Result<()>
    where
        F: FnMut(&[u8], &str) -> Result<()>
    {
        for file in &self.files {
            self.process_file(file, &mut callback)
                .with_context(|| format!("Failed to process file: {}", file.display()))?;
        }
        Ok(())
    }

    /// Count the k-mers of every record in all input files into one profile
    pub fn count_kmers(&self, kmer_size: usize) -> Result<Profile> {
        let mut counter = KmerCounter::new(kmer_size)?;

        let mut sequences = Vec::new();
        self.process_all(|sequence, _id| {
            sequences.push(sequence.to_vec());
            Ok(())
        })?;
        counter.count_sequences(sequences.into_par_iter());

        info!(
            "Found {} distinct {}-mers ({} in total)",
            counter.unique_kmers(),
            kmer_size,
            counter.total_kmers()
        );
        Ok(counter.into_profile(None))
    }

    /// Process a single FASTA/FASTQ file
    fn process_file<F>(&self, path: &Path, callback: &mut F) -> Result<()>
    where
        F: FnMut(&[u8], &str) -> Result<()>
    {
        info!("Processing file: {}", path.display());

        let mut reader = parse_fastx_file(path)
            .with_context(|| format!("Failed to open file: {}", path.display()))?;

        let mut num_sequences = 0;
        let mut num_ambiguous = 0;

        while let Some(record) = reader.next() {
            let record = record.with_context(|| "Failed to parse sequence record")?;

            // Upper case, anything outside ACGTN becomes N
            let sequence = record.normalize(false);
            let id = String::from_utf8_lossy(record.id());

            if sequence.iter().any(|&b| !matches!(b, b'A' | b'C' | b'G' | b'T')) {
                num_ambiguous += 1;
            }

            callback(&sequence, &id)?;
            num_sequences += 1;
        }

        info!("Processed {} sequences from {}", num_sequences, path.display());
        if num_ambiguous > 0 {
            warn!(
                "{} sequences contain ambiguous bases; k-mers spanning them are skipped",
                num_ambiguous
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_process_valid_fasta() -> Result<()> {
        // Create a temporary directory and fasta file
        let dir = tempdir()?;
        let file_path = dir.path().join("test.fasta");
        let mut file = File::create(&file_path)?;

        writeln!(file, ">seq1\nACGT\n>seq2\ngtca")?;

        let reader = FastxReader::new(vec![file_path]);
        let mut sequences = Vec::new();
        let mut ids = Vec::new();

        reader.process_all(|seq, id| {
            sequences.push(seq.to_vec());
            ids.push(id.to_string());
            Ok(())
        })?;

        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[0], b"ACGT");
        assert_eq!(sequences[1], b"GTCA");
        assert_eq!(ids, vec!["seq1", "seq2"]);

        Ok(())
    }

    #[test]
    fn test_ambiguous_sequences_are_kept() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("test.fasta");
        let mut file = File::create(&file_path)?;

        writeln!(file, ">seq1\nACGT\n>seq2\nNNNN\n>seq3\nGTNCA")?;

        let reader = FastxReader::new(vec![file_path]);
        let mut sequences = Vec::new();

        reader.process_all(|seq, _id| {
            sequences.push(seq.to_vec());
            Ok(())
        })?;

        assert_eq!(sequences.len(), 3);
        assert_eq!(sequences[2], b"GTNCA");

        Ok(())
    }

    #[test]
    fn test_count_kmers_across_files() -> Result<()> {
        let dir = tempdir()?;
        let first = dir.path().join("a.fasta");
        let second = dir.path().join("b.fastq");
        writeln!(File::create(&first)?, ">seq1\nACGTAC\n>seq2\nACNGT")?;
        writeln!(File::create(&second)?, "@read1\nTTTT\n+\nIIII")?;

        let profile = FastxReader::new(vec![first, second]).count_kmers(2)?;

        // 5 from ACGTAC, 2 from ACNGT, 3 from TTTT
        assert_eq!(profile.total(), 10);
        assert_eq!(profile.count_of(&"TT".parse()?)?, 3);
        assert_eq!(profile.count_of(&"AC".parse()?)?, 3);

        Ok(())
    }

    #[test]
    fn test_missing_file() {
        let reader = FastxReader::new(vec!["does/not/exist.fasta"]);
        assert!(reader.count_kmers(3).is_err());
    }
}
