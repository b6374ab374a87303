//! text2geo — command-line interface for the offline geocoder
//!
//! Usage examples
//! --------------
//!
//! - Fetch and prepare the CIS dataset from download.geonames.org
//!   $ text2geo download cis
//!
//! - Or build it from GeoNames dumps downloaded beforehand
//!   $ text2geo prepare cis RU.txt UA.txt BY.txt KZ.txt
//!
//! - Geocode a name (any script, typos tolerated)
//!   $ text2geo geocode "Масква"
//!   $ text2geo geocode moscow --country US --top-n 3 --json
//!   $ text2geo --dataset ru --auto-download geocode "Санкт-Петербург"
//!
//! - Geocode a list of names, one per line
//!   $ text2geo batch --file places.txt --json
//!   $ cat places.txt | text2geo batch
//!
//! - Show which datasets are prepared
//!   $ text2geo info
mod args;

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use text2geo::{
    BatchResult, Dataset, GeocodeParams, Geocoder,
    data_processing::{dataset_path, download_dataset, get_data_dir, is_prepared, prepare_dataset},
};
use tracing::Level;

use crate::args::{CliArgs, Commands, MatchArgs};

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn load_geocoder(
    csv: Option<&Path>,
    dataset: &str,
    data_dir: Option<&Path>,
    auto_download: bool,
) -> anyhow::Result<Geocoder> {
    let geocoder = match csv {
        Some(path) => Geocoder::from_csv(path)
            .with_context(|| format!("Failed to load places from {}", path.display()))?,
        None if auto_download => Geocoder::open_or_download(dataset.parse()?, data_dir)?,
        None => Geocoder::open(dataset.parse()?, data_dir)?,
    };
    eprintln!("Loaded {geocoder}");
    Ok(geocoder)
}

fn params(matching: MatchArgs, top_n: usize) -> anyhow::Result<GeocodeParams> {
    let mut builder = GeocodeParams::builder()
        .threshold(matching.threshold)
        .top_n(top_n);
    if let Some(country) = matching.country {
        builder = builder.country(country);
    }
    Ok(builder.try_build()?)
}

fn read_queries(queries: Vec<String>, file: Option<PathBuf>) -> anyhow::Result<Vec<String>> {
    if !queries.is_empty() {
        return Ok(queries);
    }
    let lines: Vec<String> = match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?
            .lines()
            .map(str::to_owned)
            .collect(),
        None => io::stdin().lock().lines().collect::<io::Result<_>>()?,
    };
    Ok(lines
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .collect())
}

fn print_batch_entry(entry: &BatchResult) {
    match entry.result() {
        Some(result) => println!(
            "{}\t{:.5}\t{:.5}\t{}\t{}\t{}",
            entry.query(),
            result.latitude,
            result.longitude,
            result.name,
            result.country_code.as_deref().unwrap_or(""),
            result.score
        ),
        None => println!("{}\t{}", entry.query(), entry.error().unwrap_or_default()),
    }
}

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    text2geo::init_logging(log_level(args.verbose))?;

    let data_dir = args.data_dir.as_deref();

    match args.command {
        Commands::Geocode {
            query,
            matching,
            top_n,
            json,
        } => {
            let geocoder = load_geocoder(
                args.csv.as_deref(),
                &args.dataset,
                data_dir,
                args.auto_download,
            )?;
            let results = geocoder.geocode_with(&query, &params(matching, top_n)?);
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.is_empty() {
                eprintln!("No match for: {query}");
            } else {
                for result in &results {
                    println!("{result}");
                }
            }
        }

        Commands::Batch {
            queries,
            file,
            matching,
            json,
        } => {
            let queries = read_queries(queries, file)?;
            let geocoder = load_geocoder(
                args.csv.as_deref(),
                &args.dataset,
                data_dir,
                args.auto_download,
            )?;
            let results = geocoder.geocode_batch(&queries, &params(matching, 1)?);
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                for entry in &results {
                    print_batch_entry(entry);
                }
            }
            let found = results.iter().filter(|r| r.is_found()).count();
            eprintln!("Resolved {found}/{} queries", results.len());
        }

        Commands::Info => {
            println!(
                "Data directory: {}",
                data_dir.unwrap_or(get_data_dir()).display()
            );
            for dataset in Dataset::ALL {
                let status = if is_prepared(dataset, data_dir) {
                    "prepared"
                } else {
                    "not prepared"
                };
                println!(
                    "  {:<6} {:<40} {:<13} {}",
                    dataset.name(),
                    dataset.description(),
                    status,
                    dataset_path(dataset, data_dir).display()
                );
            }
        }

        Commands::Prepare { target, dumps } => {
            let dataset: Dataset = target.parse()?;
            let path = prepare_dataset(&dumps, dataset, data_dir)?;
            println!("Dataset '{dataset}' ready at {}", path.display());
        }

        Commands::Download { target } => {
            let dataset: Dataset = target.parse()?;
            let path = download_dataset(dataset, data_dir)?;
            println!("Dataset '{dataset}' ready at {}", path.display());
        }
    }

    Ok(())
}
