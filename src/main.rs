mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{error, info, warn};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use kmer_profiler::db::Database;
use kmer_profiler::distance::{DistanceMatrix, ProfileDistance, Smoother};
use kmer_profiler::io::{
    write_distance, write_distance_matrix, write_distribution, write_info, write_segments_json,
    write_stats, write_value, FastxReader,
};
use kmer_profiler::kmer::Kmer;
use kmer_profiler::profile::{scale, Merger, Profile};

use crate::cli::{Cli, Commands, PairedInput, PairedOutput, ProfileInput, TextOutput};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let mut builder = env_logger::Builder::from_default_env();
    if let Some(log_file) = cli.log_file {
        let file = File::create(log_file)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    // Set up parallel processing
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to initialize thread pool")?;
    }

    match cli.command {
        Commands::Count { input_files, output, kmer_size, names } => {
            handle_count(input_files, &output, kmer_size, names)?
        }
        Commands::Merge { input, output, merger } => handle_merge(&input, &output, merger.into())?,
        Commands::Balance { input, output } => handle_balance(&input, &output)?,
        Commands::ShowBalance { input, output } => handle_show_balance(&input, &output)?,
        Commands::Stats { input, output } => handle_stats(&input, &output)?,
        Commands::Distribution { input, output } => handle_distribution(&input, output)?,
        Commands::Info { input } => handle_info(&input)?,
        Commands::GetCount { input, word } => handle_get_count(&input, &word)?,
        Commands::Positive { input, output } => handle_positive(&input, &output)?,
        Commands::Scale { input, output, down } => handle_scale(&input, &output, down)?,
        Commands::Shrink { input, output, factor } => handle_shrink(&input, &output, factor)?,
        Commands::Smooth { input, output, smoothing, json } => {
            let smoother = Smoother::new(smoothing.summary.into(), smoothing.threshold);
            handle_smooth(&input, &output, &smoother, json)?
        }
        Commands::Distance { input, distance, output } => {
            handle_distance(&input, &ProfileDistance::new(distance.config()), &output)?
        }
        Commands::Matrix { input, distance, output } => {
            handle_matrix(&input, &ProfileDistance::new(distance.config()), &output)?
        }
        Commands::Validate { input } => handle_validate(&input)?,
    }

    Ok(())
}

fn handle_count(
    input_files: Vec<PathBuf>,
    output: &Path,
    kmer_size: usize,
    names: Vec<String>,
) -> Result<()> {
    let names: Vec<Option<String>> = if names.is_empty() {
        input_files.iter().map(|path| file_stem(path)).collect()
    } else if names.len() == input_files.len() {
        names.into_iter().map(Some).collect()
    } else {
        bail!(
            "Got {} profile names for {} input files",
            names.len(),
            input_files.len()
        );
    };

    let mut db = Database::new(output)?;
    for (path, name) in input_files.iter().zip(names) {
        let profile = FastxReader::new(vec![path]).count_kmers(kmer_size)?;
        db.save(&profile, name.as_deref())?;
    }
    Ok(())
}

fn handle_merge(input: &PairedInput, output: &Path, merger: Merger) -> Result<()> {
    let mut out = Database::new(output)?;
    for (left, right) in load_pairs(input)? {
        let name = merged_name(&left, &right);
        let merged = left.merge_with(&right, &merger)?;
        out.save(&merged, Some(&name))?;
    }
    Ok(())
}

fn handle_balance(input: &ProfileInput, output: &Path) -> Result<()> {
    let (db, names) = open_input(input)?;
    let mut out = Database::new(output)?;
    for name in &names {
        out.save(&db.load(name)?.balance(), Some(name))?;
    }
    Ok(())
}

fn handle_show_balance(input: &ProfileInput, output: &TextOutput) -> Result<()> {
    let (db, names) = open_input(input)?;
    let mut writer = text_writer(output.output.as_deref())?;
    for name in &names {
        let balance = db.load(name)?.balance_distance()?;
        write_value(&mut writer, name, balance, output.precision)?;
    }
    writer.flush()?;
    Ok(())
}

fn handle_stats(input: &ProfileInput, output: &TextOutput) -> Result<()> {
    let (db, names) = open_input(input)?;
    let mut writer = text_writer(output.output.as_deref())?;
    for name in &names {
        let summary = db
            .summary(name)?
            .with_context(|| format!("Profile {} not found", name))?;
        write_stats(&mut writer, &summary, output.precision)?;
    }
    writer.flush()?;
    Ok(())
}

fn handle_distribution(input: &ProfileInput, output: Option<PathBuf>) -> Result<()> {
    let (db, names) = open_input(input)?;
    let mut writer = text_writer(output.as_deref())?;
    for name in &names {
        let profile = db.load(name)?;
        write_distribution(&mut writer, name, &profile.distribution())?;
    }
    writer.flush()?;
    Ok(())
}

fn handle_info(input: &ProfileInput) -> Result<()> {
    let (db, names) = open_input(input)?;
    let summaries = names
        .iter()
        .map(|name| -> Result<_> {
            db.summary(name)?
                .with_context(|| format!("Profile {} not found", name))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut writer = text_writer(None)?;
    write_info(&mut writer, &db.info()?, &summaries)?;
    writer.flush()?;
    Ok(())
}

fn handle_get_count(input: &ProfileInput, word: &str) -> Result<()> {
    let kmer: Kmer = word
        .parse()
        .with_context(|| format!("{} is not a valid DNA word", word))?;

    let (db, names) = open_input(input)?;
    let mut writer = text_writer(None)?;
    for name in &names {
        let count = db
            .load(name)?
            .count_of(&kmer)
            .context("The length of the word does not match the profile length")?;
        writeln!(writer, "{} {}", name, count)?;
    }
    writer.flush()?;
    Ok(())
}

fn handle_positive(input: &PairedInput, output: &PairedOutput) -> Result<()> {
    let (mut out_left, mut out_right) = open_outputs(output)?;
    for (left, right) in load_pairs(input)? {
        let (left, right) = left.positive(&right)?;
        out_left.save(&left, None)?;
        out_right.save(&right, None)?;
    }
    Ok(())
}

fn handle_scale(input: &PairedInput, output: &PairedOutput, down: bool) -> Result<()> {
    let (mut out_left, mut out_right) = open_outputs(output)?;
    for (left, right) in load_pairs(input)? {
        let (left_counts, right_counts) = scale(&left, &right, down)?;
        out_left.save(&Profile::from_scaled(&left_counts, left.name.clone())?, None)?;
        out_right.save(&Profile::from_scaled(&right_counts, right.name.clone())?, None)?;
    }
    Ok(())
}

fn handle_shrink(input: &ProfileInput, output: &Path, factor: usize) -> Result<()> {
    let (db, names) = open_input(input)?;
    let mut out = Database::new(output)?;
    for name in &names {
        let shrunk = db
            .load(name)?
            .shrink(factor)
            .with_context(|| format!("Cannot shrink profile {}", name))?;
        out.save(&shrunk, Some(name))?;
    }
    Ok(())
}

fn handle_smooth(
    input: &PairedInput,
    output: &PairedOutput,
    smoother: &Smoother,
    json: Option<PathBuf>,
) -> Result<()> {
    let (mut out_left, mut out_right) = open_outputs(output)?;
    let mut segments = Vec::new();

    for (left, right) in load_pairs(input)? {
        let smoothed = smoother.smooth(&left, &right)?;
        let (left_counts, right_counts) = smoothed.flatten();
        out_left.save(&Profile::from_counts(left_counts, left.name.clone())?, None)?;
        out_right.save(&Profile::from_counts(right_counts, right.name.clone())?, None)?;

        if json.is_some() {
            segments.push((display_name(&left), display_name(&right), smoothed));
        }
    }

    if let Some(path) = json {
        let mut writer = text_writer(Some(path.as_path()))?;
        write_segments_json(&mut writer, &segments)?;
        writer.flush()?;
        info!("Wrote segments to {}", path.display());
    }
    Ok(())
}

fn handle_distance(input: &PairedInput, distance: &ProfileDistance, output: &TextOutput) -> Result<()> {
    let mut writer = text_writer(output.output.as_deref())?;
    for (left, right) in load_pairs(input)? {
        let d = distance.distance(&left, &right)?;
        write_distance(
            &mut writer,
            &display_name(&left),
            &display_name(&right),
            d,
            output.precision,
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn handle_matrix(input: &ProfileInput, distance: &ProfileDistance, output: &TextOutput) -> Result<()> {
    let (db, names) = open_input(input)?;
    if names.len() < 2 {
        bail!("At least two profiles are needed for a distance matrix");
    }

    let profiles = db.load_all(&names)?;
    let matrix = DistanceMatrix::build(&profiles, distance)?;

    let mut writer = text_writer(output.output.as_deref())?;
    write_distance_matrix(&mut writer, &matrix, output.precision)?;
    writer.flush()?;
    Ok(())
}

fn handle_validate(input: &Path) -> Result<()> {
    let db = Database::open(input)?;
    info!("Validating profile file {}", input.display());

    let report = db.validate()?;
    for warning in report.warnings() {
        warn!("{}", warning);
    }
    for error in report.errors() {
        error!("{}", error);
    }
    if report.has_errors() {
        bail!("Profile file {} failed validation", input.display());
    }

    if report.has_warnings() {
        info!("Profile file validation complete with {} warnings", report.warnings().len());
    } else {
        info!("Profile file validation complete");
    }
    Ok(())
}

/// Open a profile file and resolve the profiles to consider
fn open_input(input: &ProfileInput) -> Result<(Database, Vec<String>)> {
    let db = Database::open(&input.input)?;
    let names = if input.names.is_empty() {
        db.names()?
    } else {
        input.names.clone()
    };
    Ok((db, names))
}

fn open_outputs(output: &PairedOutput) -> Result<(Database, Database)> {
    Ok((
        Database::new(&output.output_left)?,
        Database::new(&output.output_right)?,
    ))
}

/// Load profiles from two files, linked by position in their name lists
fn load_pairs(input: &PairedInput) -> Result<Vec<(Profile, Profile)>> {
    let left_db = Database::open(&input.left)?;
    let right_db = Database::open(&input.right)?;

    let names_left = if input.names_left.is_empty() {
        left_db.names()?
    } else {
        input.names_left.clone()
    };
    let names_right = if input.names_right.is_empty() {
        right_db.names()?
    } else {
        input.names_right.clone()
    };

    if names_left.len() != names_right.len() {
        bail!(
            "Cannot pair {} profiles with {} profiles",
            names_left.len(),
            names_right.len()
        );
    }

    names_left
        .iter()
        .zip(&names_right)
        .map(|(left, right)| -> Result<(Profile, Profile)> {
            let left = left_db.load(left)?;
            let right = right_db.load(right)?;
            if left.length() != right.length() {
                bail!(
                    "Profiles {} and {} have different k-mer lengths",
                    display_name(&left),
                    display_name(&right)
                );
            }
            Ok((left, right))
        })
        .collect()
}

fn merged_name(left: &Profile, right: &Profile) -> String {
    let (left, right) = (display_name(left), display_name(right));
    if left == right {
        left
    } else {
        format!("{}_{}", left, right)
    }
}

fn display_name(profile: &Profile) -> String {
    profile.name.clone().unwrap_or_default()
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem().map(|stem| stem.to_string_lossy().into_owned())
}

fn text_writer(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout())),
    })
}
