use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// CLI arguments for text2geo
#[derive(Debug, Parser)]
#[command(
    name = "text2geo",
    version,
    about = "Offline fuzzy geocoder: resolve place names to coordinates"
)]
pub struct CliArgs {
    /// Load places from a prepared CSV instead of a named dataset
    #[arg(long, global = true, conflicts_with = "dataset")]
    pub csv: Option<PathBuf>,

    /// Prepared dataset to load (ru, cis, world)
    #[arg(short, long, global = true, default_value = "cis")]
    pub dataset: String,

    /// Directory holding prepared datasets (default: $TEXT2GEO_DATA_DIR or ~/.text2geo/data)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Download and prepare the dataset when it is missing
    #[arg(long, global = true)]
    pub auto_download: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Geocode a single place name
    Geocode {
        /// Place name, in any language or script
        query: String,

        #[command(flatten)]
        matching: MatchArgs,

        /// Maximum number of results
        #[arg(short = 'n', long, default_value_t = 1)]
        top_n: usize,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Geocode many place names, one result per name
    Batch {
        /// Place names (read from --file or stdin when omitted)
        queries: Vec<String>,

        /// File with one place name per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        #[command(flatten)]
        matching: MatchArgs,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// List datasets and whether they are prepared
    Info,

    /// Build a dataset from locally downloaded GeoNames dump files
    Prepare {
        /// Dataset to build (ru, cis, world)
        #[arg(value_name = "DATASET")]
        target: String,

        /// GeoNames dump files (e.g. RU.txt, cities1000.txt)
        #[arg(required = true)]
        dumps: Vec<PathBuf>,
    },

    /// Download GeoNames dumps for a dataset and prepare it
    Download {
        /// Dataset to download (ru, cis, world)
        #[arg(value_name = "DATASET", default_value = "cis")]
        target: String,
    },
}

#[derive(Debug, clap::Args)]
pub struct MatchArgs {
    /// Restrict results to a two-letter country code (e.g. RU)
    #[arg(short, long)]
    pub country: Option<String>,

    /// Minimum fuzzy score, 0-100
    #[arg(short, long, default_value_t = text2geo::DEFAULT_THRESHOLD, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub threshold: u8,
}
