//! Dataset catalog and GeoNames loading for `text2geo`.
//!
//! The geocoder core consumes a finalized, in-memory set of populated places.
//! This crate is the collaborator that gets it there: it knows which datasets
//! exist, where a prepared dataset lives on disk, and how to read either a
//! prepared CSV or a raw GeoNames dump into a polars [`LazyFrame`].
//!
//! [`LazyFrame`]: polars::prelude::LazyFrame

use once_cell::sync::Lazy;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

mod error;
#[cfg(feature = "download")]
pub mod fetch;
pub mod places;
pub mod test_data;

pub use error::{DataError, Result};
#[cfg(feature = "download")]
pub use fetch::{download_dataset, extract_dump};
pub use places::{load_geonames_dump, load_places_csv, prepare_dataset};

pub const DATA_DIR_DEFAULT: &str = "./text2geo_data";
pub const DATA_DIR_ENV: &str = "TEXT2GEO_DATA_DIR";

/// Global data directory path, resolved once.
///
/// Resolution order: the `TEXT2GEO_DATA_DIR` environment variable, then
/// `~/.text2geo/data` (with the `system-dirs` feature), then [`DATA_DIR_DEFAULT`].
pub static DATA_DIR: Lazy<PathBuf> = Lazy::new(|| {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    #[cfg(feature = "system-dirs")]
    {
        if let Some(dirs) = directories::BaseDirs::new() {
            return dirs.home_dir().join(".text2geo").join("data");
        }
    }
    PathBuf::from(DATA_DIR_DEFAULT)
});

pub fn get_data_dir() -> &'static Path {
    DATA_DIR.as_path()
}

/// The prebuilt dataset flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dataset {
    /// Russia only
    Ru,
    /// CIS and former USSR countries
    #[default]
    Cis,
    /// All cities worldwide with population above 1000
    World,
}

impl Dataset {
    pub const ALL: [Self; 3] = [Self::Ru, Self::Cis, Self::World];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Ru => "ru",
            Self::Cis => "cis",
            Self::World => "world",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Ru => "Russia only",
            Self::Cis => "CIS + former USSR countries",
            Self::World => "All cities worldwide (population > 1000)",
        }
    }

    /// Country dump files making up this dataset. `World` is built from the
    /// single `cities1000` dump instead.
    pub const fn countries(self) -> &'static [&'static str] {
        match self {
            Self::Ru => &["RU"],
            Self::Cis => &[
                "RU", "UA", "BY", "KZ", "UZ", "TJ", "KG", "TM", "AZ", "AM", "GE", "MD",
            ],
            Self::World => &[],
        }
    }

    /// GeoNames dump file stems (without extension) this dataset is built from.
    pub fn source_files(self) -> Vec<&'static str> {
        match self {
            Self::World => vec!["cities1000"],
            other => other.countries().to_vec(),
        }
    }

    fn valid_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|d| d.name()).collect()
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dataset {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DataError::InvalidDataset {
                dataset: s.to_owned(),
                valid: Self::valid_names(),
            })
    }
}

/// Names and descriptions of every dataset, in catalog order.
pub fn available_datasets() -> Vec<(&'static str, &'static str)> {
    Dataset::ALL
        .iter()
        .map(|d| (d.name(), d.description()))
        .collect()
}

/// Expected location of the prepared CSV for `dataset`.
pub fn dataset_path(dataset: Dataset, data_dir: Option<&Path>) -> PathBuf {
    data_dir
        .unwrap_or(get_data_dir())
        .join(format!("{}.csv", dataset.name()))
}

/// Whether the prepared CSV for `dataset` exists on disk.
pub fn is_prepared(dataset: Dataset, data_dir: Option<&Path>) -> bool {
    let path = dataset_path(dataset, data_dir);
    let exists = path.exists();
    debug!(dataset = %dataset, path = ?path, exists, "Checked dataset");
    exists
}

/// Resolve the prepared CSV for `dataset`, failing if it has not been built yet.
pub fn require_prepared(dataset: Dataset, data_dir: Option<&Path>) -> Result<PathBuf> {
    let path = dataset_path(dataset, data_dir);
    if path.exists() {
        Ok(path)
    } else {
        Err(DataError::DatasetNotFound {
            dataset: dataset.name().to_owned(),
            data_dir: data_dir.unwrap_or(get_data_dir()).to_path_buf(),
        })
    }
}
