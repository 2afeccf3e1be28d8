use std::io::Write;
use anyhow::Result;
use serde::Serialize;

use crate::db::{ProfileSummary, StoreInfo};
use crate::distance::{DistanceMatrix, SmoothedPair};

/// Write a distance matrix: the number of profiles, their names, then one
/// line per profile after the first with its distances to all earlier ones
pub fn write_distance_matrix<W: Write>(
    writer: &mut W,
    matrix: &DistanceMatrix,
    precision: usize,
) -> Result<()> {
    writeln!(writer, "{}", matrix.len())?;
    for name in matrix.names() {
        writeln!(writer, "{}", name)?;
    }
    for row in matrix.rows() {
        let line = row
            .iter()
            .map(|d| format!("{:.*}", precision, d))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{}", line)?;
    }
    Ok(())
}

/// `<left> <right> <distance>`
pub fn write_distance<W: Write>(
    writer: &mut W,
    left: &str,
    right: &str,
    distance: f64,
    precision: usize,
) -> Result<()> {
    writeln!(writer, "{} {} {:.*}", left, right, precision, distance)?;
    Ok(())
}

/// File attributes followed by the stored statistics of each profile
pub fn write_info<W: Write>(
    writer: &mut W,
    info: &StoreInfo,
    profiles: &[ProfileSummary],
) -> Result<()> {
    writeln!(writer, "File format version: {}", info.version)?;
    writeln!(writer, "Produced by: {}", info.producer)?;

    for profile in profiles {
        writeln!(writer)?;
        writeln!(writer, "Profile: {}", profile.name)?;
        writeln!(writer, "- k-mer length: {} ({} k-mers)", profile.length, profile.number())?;
        writeln!(writer, "- Zero counts: {}", profile.number() - profile.non_zero)?;
        writeln!(writer, "- Non-zero counts: {}", profile.non_zero)?;
        writeln!(writer, "- Sum of counts: {}", profile.total)?;
        writeln!(writer, "- Mean of counts: {:.3}", profile.mean)?;
        writeln!(writer, "- Median of counts: {:.3}", profile.median)?;
        writeln!(writer, "- Standard deviation of counts: {:.3}", profile.std)?;
    }
    Ok(())
}

/// `<name> <mean> <std>`
pub fn write_stats<W: Write>(writer: &mut W, summary: &ProfileSummary, precision: usize) -> Result<()> {
    writeln!(
        writer,
        "{} {:.*} {:.*}",
        summary.name, precision, summary.mean, precision, summary.std
    )?;
    Ok(())
}

/// `<name> <value> <number of k-mers with that value>` per distinct value
pub fn write_distribution<W: Write>(
    writer: &mut W,
    name: &str,
    distribution: &[(u64, usize)],
) -> Result<()> {
    for (value, count) in distribution {
        writeln!(writer, "{} {} {}", name, value, count)?;
    }
    Ok(())
}

/// `<name> <value>` with a fixed number of decimals
pub fn write_value<W: Write>(writer: &mut W, name: &str, value: f64, precision: usize) -> Result<()> {
    writeln!(writer, "{} {:.*}", name, precision, value)?;
    Ok(())
}

#[derive(Serialize)]
struct NamedPair<'a> {
    left: &'a str,
    right: &'a str,
    #[serde(flatten)]
    pair: &'a SmoothedPair,
}

/// Segment lists of smoothed pairs as a pretty-printed JSON array, each
/// entry labelled with the names of its two profiles
pub fn write_segments_json<W: Write>(
    writer: &mut W,
    pairs: &[(String, String, SmoothedPair)],
) -> Result<()> {
    let entries: Vec<NamedPair> = pairs
        .iter()
        .map(|(left, right, pair)| NamedPair { left, right, pair })
        .collect();
    serde_json::to_writer_pretty(&mut *writer, &entries)?;
    writeln!(writer)?;
    Ok(())
}
