//! Reading GeoNames data into polars frames.
//!
//! Two on-disk shapes are supported: the raw tab-separated GeoNames dump
//! (`RU.txt`, `cities1000.txt`, ...) and the flat, comma-separated "prepared"
//! file that [`prepare_dataset`] writes from one or more dumps.

use std::fs::File;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{info, instrument, warn};

use super::{Dataset, DataError, Result, dataset_path};

/// Columns kept in a prepared dataset, in file order.
pub const PLACE_COLUMNS: [&str; 10] = [
    "geonameid",
    "name",
    "asciiname",
    "alternatenames",
    "latitude",
    "longitude",
    "feature_code",
    "country_code",
    "population",
    "timezone",
];

const PLACES_SCHEMA: [(PlSmallStr, DataType); 10] = [
    (PlSmallStr::from_static("geonameid"), DataType::UInt64),
    (PlSmallStr::from_static("name"), DataType::String),
    (PlSmallStr::from_static("asciiname"), DataType::String),
    (PlSmallStr::from_static("alternatenames"), DataType::String),
    (PlSmallStr::from_static("latitude"), DataType::Float64),
    (PlSmallStr::from_static("longitude"), DataType::Float64),
    (PlSmallStr::from_static("feature_code"), DataType::String),
    (PlSmallStr::from_static("country_code"), DataType::String),
    (PlSmallStr::from_static("population"), DataType::Int64),
    (PlSmallStr::from_static("timezone"), DataType::String),
];

const GEONAMES_DUMP_SCHEMA: [(PlSmallStr, DataType); 19] = [
    (PlSmallStr::from_static("geonameid"), DataType::UInt64),
    (PlSmallStr::from_static("name"), DataType::String),
    (PlSmallStr::from_static("asciiname"), DataType::String),
    (PlSmallStr::from_static("alternatenames"), DataType::String),
    (PlSmallStr::from_static("latitude"), DataType::Float64),
    (PlSmallStr::from_static("longitude"), DataType::Float64),
    (PlSmallStr::from_static("feature_class"), DataType::String),
    (PlSmallStr::from_static("feature_code"), DataType::String),
    (PlSmallStr::from_static("country_code"), DataType::String),
    (PlSmallStr::from_static("cc2"), DataType::String),
    (PlSmallStr::from_static("admin1"), DataType::String),
    (PlSmallStr::from_static("admin2"), DataType::String),
    (PlSmallStr::from_static("admin3"), DataType::String),
    (PlSmallStr::from_static("admin4"), DataType::String),
    (PlSmallStr::from_static("population"), DataType::Int64),
    (PlSmallStr::from_static("elevation"), DataType::Int32),
    (PlSmallStr::from_static("dem"), DataType::Int32),
    (PlSmallStr::from_static("timezone"), DataType::String),
    (PlSmallStr::from_static("modification_date"), DataType::String),
];

/// Feature class of populated places (cities, towns, villages).
pub const POPULATED_PLACE_CLASS: &str = "P";

fn kept_columns() -> Vec<Expr> {
    PLACE_COLUMNS.iter().map(|c| col(*c)).collect()
}

/// Lazily read a prepared places CSV (header row, comma separated).
///
/// A null `alternatenames` cell becomes an empty string and a null
/// `population` becomes zero.
pub fn load_places_csv(path: impl AsRef<Path>) -> Result<LazyFrame> {
    Ok(LazyCsvReader::new(path)
        .with_has_header(true)
        .with_schema(Some(Schema::from_iter(PLACES_SCHEMA).into()))
        .finish()?
        .with_columns([
            col("alternatenames").fill_null(lit("")),
            col("population").fill_null(lit(0i64)),
        ]))
}

/// Lazily read a raw GeoNames dump, keeping populated places only.
pub fn load_geonames_dump(path: impl AsRef<Path>) -> Result<LazyFrame> {
    Ok(LazyCsvReader::new(path)
        .with_separator(b'\t')
        .with_has_header(false)
        .with_quote_char(None)
        .with_schema(Some(Schema::from_iter(GEONAMES_DUMP_SCHEMA).into()))
        .finish()?
        .filter(col("feature_class").eq(lit(POPULATED_PLACE_CLASS)))
        .select(kept_columns())
        .with_columns([
            col("alternatenames").fill_null(lit("")),
            col("population").fill_null(lit(0i64)),
        ]))
}

/// Build the prepared CSV for `dataset` from locally available dump files.
///
/// Returns the existing file untouched if the dataset was already prepared.
#[instrument(name = "Prepare dataset", skip(dumps), fields(num_dumps = dumps.len()), level = "info")]
pub fn prepare_dataset(
    dumps: &[PathBuf],
    dataset: Dataset,
    data_dir: Option<&Path>,
) -> Result<PathBuf> {
    let output_path = dataset_path(dataset, data_dir);
    if output_path.exists() {
        info!(path = ?output_path, "Dataset already prepared");
        return Ok(output_path);
    }
    if dumps.is_empty() {
        return Err(DataError::NoDumpFiles);
    }

    let expected = dataset.source_files();
    for dump in dumps {
        let stem = dump.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        if !expected.iter().any(|e| e.eq_ignore_ascii_case(stem)) {
            warn!(dump = ?dump, dataset = %dataset, "Dump file is not part of this dataset's usual sources");
        }
    }

    let t_prepare = std::time::Instant::now();
    let frames = dumps
        .iter()
        .map(load_geonames_dump)
        .collect::<Result<Vec<_>>>()?;
    let mut df = concat(frames, UnionArgs::default())?.collect()?;

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(&output_path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;

    info!(
        path = ?output_path,
        places = df.height(),
        elapsed_seconds = ?t_prepare.elapsed(),
        "Saved prepared dataset"
    );
    Ok(output_path)
}
