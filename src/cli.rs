use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use kmer_profiler::distance::{DistanceConfig, Metric, Pairwise, Summary};
use kmer_profiler::profile::Merger;

#[derive(Parser, Debug)]
#[command(author, version, about = "Build, store and compare k-mer profiles")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Number of threads to use
    #[arg(short, long, global = true)]
    pub threads: Option<usize>,

    /// Path to log file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Count k-mers in FASTA/FASTQ files, one profile per file
    Count {
        /// Input FASTA/FASTQ files
        #[arg(required = true)]
        input_files: Vec<PathBuf>,

        /// Output profile file
        #[arg(short, long)]
        output: PathBuf,

        /// K-mer size to use
        #[arg(short, long, default_value = "9")]
        kmer_size: usize,

        /// Names for the profiles, one per input file (default: file stems)
        #[arg(short = 'p', long = "profiles", num_args = 1..)]
        names: Vec<String>,
    },

    /// Merge profiles pairwise
    Merge {
        #[command(flatten)]
        input: PairedInput,

        /// Output profile file
        #[arg(short, long)]
        output: PathBuf,

        /// Merge function
        #[arg(short, long, value_enum, default_value = "sum")]
        merger: MergerArg,
    },

    /// Balance profiles over reverse complements
    Balance {
        #[command(flatten)]
        input: ProfileInput,

        /// Output profile file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show how strand balanced each profile is
    ShowBalance {
        #[command(flatten)]
        input: ProfileInput,

        #[command(flatten)]
        output: TextOutput,
    },

    /// Show mean and standard deviation of each profile
    Stats {
        #[command(flatten)]
        input: ProfileInput,

        #[command(flatten)]
        output: TextOutput,
    },

    /// Show how often each count value occurs in each profile
    Distribution {
        #[command(flatten)]
        input: ProfileInput,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show file attributes and profile statistics
    Info {
        #[command(flatten)]
        input: ProfileInput,
    },

    /// Show the count of one k-mer in each profile
    GetCount {
        #[command(flatten)]
        input: ProfileInput,

        /// The k-mer to look up; its length must match the profiles
        word: String,
    },

    /// Keep only counts that are non-zero in both profiles of each pair
    Positive {
        #[command(flatten)]
        input: PairedInput,

        #[command(flatten)]
        output: PairedOutput,
    },

    /// Scale each pair of profiles to equal totals
    Scale {
        #[command(flatten)]
        input: PairedInput,

        #[command(flatten)]
        output: PairedOutput,

        /// Scale the larger profile down instead of the smaller one up
        #[arg(short, long)]
        down: bool,
    },

    /// Reduce the k-mer length of profiles
    Shrink {
        #[command(flatten)]
        input: ProfileInput,

        /// Output profile file
        #[arg(short, long)]
        output: PathBuf,

        /// Number of bases to drop from the k-mer length
        #[arg(short, long, default_value = "1")]
        factor: usize,
    },

    /// Smooth each pair of profiles by collapsing poorly supported regions
    Smooth {
        #[command(flatten)]
        input: PairedInput,

        #[command(flatten)]
        output: PairedOutput,

        #[command(flatten)]
        smoothing: SmoothingArgs,

        /// Also write the segment lists as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Compute the distance between each pair of profiles
    Distance {
        #[command(flatten)]
        input: PairedInput,

        #[command(flatten)]
        distance: DistanceArgs,

        #[command(flatten)]
        output: TextOutput,
    },

    /// Compute a distance matrix between all profiles of a file
    Matrix {
        #[command(flatten)]
        input: ProfileInput,

        #[command(flatten)]
        distance: DistanceArgs,

        #[command(flatten)]
        output: TextOutput,
    },

    /// Validate profile file integrity
    Validate {
        /// Profile file
        input: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct ProfileInput {
    /// Input profile file
    pub input: PathBuf,

    /// Profiles to consider (default: all, in alphabetical order)
    #[arg(short = 'p', long = "profiles", num_args = 1..)]
    pub names: Vec<String>,
}

#[derive(Args, Debug)]
pub struct PairedInput {
    /// Input profile file (left)
    pub left: PathBuf,

    /// Input profile file (right)
    pub right: PathBuf,

    /// Profiles to consider from the left file (default: all, in alphabetical order)
    #[arg(short = 'l', long = "profiles-left", num_args = 1..)]
    pub names_left: Vec<String>,

    /// Profiles to consider from the right file (default: all, in alphabetical order)
    #[arg(short = 'r', long = "profiles-right", num_args = 1..)]
    pub names_right: Vec<String>,
}

#[derive(Args, Debug)]
pub struct PairedOutput {
    /// Output profile file (left)
    pub output_left: PathBuf,

    /// Output profile file (right)
    pub output_right: PathBuf,
}

#[derive(Args, Debug)]
pub struct TextOutput {
    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of decimals in the output
    #[arg(short = 'n', long, default_value = "3")]
    pub precision: usize,
}

#[derive(Args, Debug, Clone)]
pub struct SmoothingArgs {
    /// Summary function for smoothing
    #[arg(short, long, value_enum, default_value = "min")]
    pub summary: SummaryArg,

    /// Threshold for the summary function
    #[arg(long, default_value = "0")]
    pub threshold: f64,
}

#[derive(Args, Debug, Clone)]
pub struct DistanceArgs {
    /// Balance the profiles
    #[arg(short, long)]
    pub balance: bool,

    /// Use only counts that are non-zero in both profiles
    #[arg(long)]
    pub positive: bool,

    /// Smooth the profiles
    #[arg(short = 'm', long)]
    pub smooth: bool,

    #[command(flatten)]
    pub smoothing: SmoothingArgs,

    /// Scale the profiles to equal totals
    #[arg(short = 'S', long)]
    pub scale: bool,

    /// Scale down instead of up
    #[arg(short, long)]
    pub down: bool,

    /// Distance function
    #[arg(short = 'D', long, value_enum, default_value = "multiset")]
    pub metric: MetricArg,

    /// Pairwise function for the multiset distance
    #[arg(short = 'P', long, value_enum, default_value = "prod")]
    pub pairwise: PairwiseArg,
}

impl DistanceArgs {
    pub fn config(&self) -> DistanceConfig {
        let metric = match self.metric {
            MetricArg::Multiset => Metric::Multiset(self.pairwise.into()),
            MetricArg::Euclidean => Metric::Euclidean,
            MetricArg::Cosine => Metric::Cosine,
        };

        DistanceConfig {
            balance: self.balance,
            positive: self.positive,
            smooth: self.smooth,
            summary: self.smoothing.summary.into(),
            threshold: self.smoothing.threshold,
            scale: self.scale,
            down: self.down,
            metric,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum MergerArg {
    Sum,
    Xor,
    Int,
    Nint,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum SummaryArg {
    Min,
    Mean,
    Median,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum PairwiseArg {
    Prod,
    Sum,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub enum MetricArg {
    Multiset,
    Euclidean,
    Cosine,
}

impl From<MergerArg> for Merger {
    fn from(merger: MergerArg) -> Self {
        match merger {
            MergerArg::Sum => Self::Sum,
            MergerArg::Xor => Self::Xor,
            MergerArg::Int => Self::Intersect,
            MergerArg::Nint => Self::NotIntersect,
        }
    }
}

impl From<SummaryArg> for Summary {
    fn from(summary: SummaryArg) -> Self {
        match summary {
            SummaryArg::Min => Self::Min,
            SummaryArg::Mean => Self::Mean,
            SummaryArg::Median => Self::Median,
        }
    }
}

impl From<PairwiseArg> for Pairwise {
    fn from(pairwise: PairwiseArg) -> Self {
        match pairwise {
            PairwiseArg::Prod => Self::Prod,
            PairwiseArg::Sum => Self::Sum,
        }
    }
}
