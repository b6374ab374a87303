//! The record store: an immutable, ordered set of populated places.
//!
//! A record's position in the store is its internal identity. Positions are
//! dense (`0..len`) and assigned from input order, so the name index can refer
//! to records by `usize` without owning any record data.

use std::sync::Arc;

use itertools::izip;
use polars::prelude::{DataFrame, DataType};
use tracing::{debug, instrument};

use crate::error::Result;

// Re-export data loading subcrate
pub use text2geo_data::*;

const COL_GEONAME_ID: &str = "geonameid";
const COL_NAME: &str = "name";
const COL_ASCII_NAME: &str = "asciiname";
const COL_ALTERNATE_NAMES: &str = "alternatenames";
const COL_LATITUDE: &str = "latitude";
const COL_LONGITUDE: &str = "longitude";
const COL_COUNTRY_CODE: &str = "country_code";
const COL_POPULATION: &str = "population";

/// One populated place from the gazetteer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaceRecord {
    /// External `GeoNames` identifier
    pub geoname_id: u64,
    pub name: String,
    pub ascii_name: Option<String>,
    pub alternate_names: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Two-letter ISO code, upper-case
    pub country_code: Option<String>,
    pub population: u64,
}

impl PlaceRecord {
    pub fn new(geoname_id: u64, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            geoname_id,
            name: name.into(),
            ascii_name: None,
            alternate_names: Vec::new(),
            latitude,
            longitude,
            country_code: None,
            population: 0,
        }
    }

    pub fn with_ascii_name(mut self, ascii_name: impl Into<String>) -> Self {
        self.ascii_name = Some(ascii_name.into());
        self
    }

    pub fn with_alternate_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternate_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_country_code(mut self, code: &str) -> Self {
        self.country_code = normalize_country_code(code);
        self
    }

    pub fn with_population(mut self, population: u64) -> Self {
        self.population = population;
        self
    }
}

pub(crate) fn normalize_country_code(code: &str) -> Option<String> {
    let code = code.trim();
    (!code.is_empty()).then(|| code.to_uppercase())
}

/// Split a comma-joined `alternatenames` cell into trimmed, non-empty names.
pub(crate) fn split_alternate_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Immutable, ordered collection of [`PlaceRecord`]s.
///
/// Cloning is cheap; the records are shared.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Arc<[PlaceRecord]>,
}

impl RecordStore {
    pub fn new(records: Vec<PlaceRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Build a store from a places `DataFrame`.
    ///
    /// Expects the columns `geonameid`, `name`, `asciiname`, `alternatenames`,
    /// `latitude`, `longitude`, `country_code` and `population`.
    /// `alternatenames` may be either a comma-joined string column or a list of
    /// strings. Rows without an id, a name or coordinates are skipped.
    #[instrument(name = "Load Record Store", skip_all, fields(rows = df.height()), level = "debug")]
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let geoname_ids = df.column(COL_GEONAME_ID)?.cast(&DataType::UInt64)?;
        let geoname_ids = geoname_ids.u64()?;
        let names = df.column(COL_NAME)?.str()?;
        let ascii_names = df.column(COL_ASCII_NAME)?.str()?;
        let alternate_names = alternate_names_column(df)?;
        let latitudes = df.column(COL_LATITUDE)?.cast(&DataType::Float64)?;
        let latitudes = latitudes.f64()?;
        let longitudes = df.column(COL_LONGITUDE)?.cast(&DataType::Float64)?;
        let longitudes = longitudes.f64()?;
        let country_codes = df.column(COL_COUNTRY_CODE)?.str()?;
        let populations = df.column(COL_POPULATION)?.cast(&DataType::Int64)?;
        let populations = populations.i64()?;

        let mut records = Vec::with_capacity(df.height());
        let mut skipped = 0usize;
        for (gid, name, ascii_name, alternates, lat, lon, country_code, population) in izip!(
            geoname_ids,
            names,
            ascii_names,
            alternate_names,
            latitudes,
            longitudes,
            country_codes,
            populations
        ) {
            let (Some(geoname_id), Some(name), Some(latitude), Some(longitude)) =
                (gid, name, lat, lon)
            else {
                skipped += 1;
                continue;
            };
            records.push(PlaceRecord {
                geoname_id,
                name: name.to_owned(),
                ascii_name: ascii_name.map(str::to_owned),
                alternate_names: alternates,
                latitude,
                longitude,
                country_code: country_code.and_then(normalize_country_code),
                population: population.unwrap_or(0).max(0) as u64,
            });
        }
        if skipped > 0 {
            debug!(skipped, "Skipped rows missing id, name or coordinates");
        }
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&PlaceRecord> {
        self.records.get(position)
    }

    pub fn records(&self) -> &[PlaceRecord] {
        &self.records
    }

    /// Records paired with their positions, in store order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &PlaceRecord)> {
        self.records.iter().enumerate()
    }
}

impl From<Vec<PlaceRecord>> for RecordStore {
    fn from(records: Vec<PlaceRecord>) -> Self {
        Self::new(records)
    }
}

impl FromIterator<PlaceRecord> for RecordStore {
    fn from_iter<T: IntoIterator<Item = PlaceRecord>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

fn alternate_names_column(df: &DataFrame) -> Result<Vec<Vec<String>>> {
    let column = df.column(COL_ALTERNATE_NAMES)?;
    if let DataType::List(_) = column.dtype() {
        return column
            .list()?
            .into_iter()
            .map(|names| -> Result<Vec<String>> {
                match names {
                    Some(series) => Ok(series
                        .str()?
                        .into_iter()
                        .flatten()
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_owned)
                        .collect()),
                    None => Ok(Vec::new()),
                }
            })
            .collect();
    }
    let column = column.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|raw| raw.map(split_alternate_names).unwrap_or_default())
        .collect())
}
