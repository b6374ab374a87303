//! The [`Geocoder`] facade.
//!
//! Owns a [`RecordStore`] and the [`NameIndex`] built over it, and exposes the
//! query operations. Construction is the only fallible step; queries never fail
//! and report "no match" as an empty result.
//!
//! ```rust
//! use text2geo::{GeocodeParams, Geocoder, PlaceRecord};
//!
//! let geocoder = Geocoder::from_records(vec![
//!     PlaceRecord::new(524_901, "Moscow", 55.75222, 37.61556)
//!         .with_alternate_names(["Москва"])
//!         .with_country_code("RU")
//!         .with_population(10_381_222),
//! ]);
//!
//! let result = geocoder.geocode("москва").expect("exact match");
//! assert_eq!(result.score, 100);
//!
//! let params = GeocodeParams::builder().country("US").build();
//! assert!(geocoder.geocode_with("Moscow", &params).is_empty());
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use polars::prelude::DataFrame;
use tracing::{info, instrument};

use crate::{
    data::{Dataset, PlaceRecord, RecordStore, load_places_csv, require_prepared},
    error::Result,
    index::NameIndex,
    search::{BatchResult, GeocodeParams, GeocodeResult, geocode_batch_inner, geocode_inner},
};

const CUSTOM_LABEL: &str = "custom";

/// Offline geocoder over an in-memory gazetteer.
///
/// Cloning is cheap: the store and index are shared and never mutated, so a
/// `Geocoder` can be queried from many threads at once.
#[derive(Debug, Clone)]
pub struct Geocoder {
    store: Arc<RecordStore>,
    index: Arc<NameIndex>,
    label: String,
}

impl Geocoder {
    /// Index an existing record store.
    #[instrument(name = "Initialize Geocoder", skip_all, fields(records = store.len()), level = "info")]
    pub fn new(store: RecordStore) -> Self {
        let t_init = std::time::Instant::now();
        let index = NameIndex::build(&store);
        info!(
            elapsed_seconds = ?t_init.elapsed(),
            "Geocoder initialization complete"
        );
        Self {
            store: Arc::new(store),
            index: Arc::new(index),
            label: CUSTOM_LABEL.to_string(),
        }
    }

    pub fn from_records(records: Vec<PlaceRecord>) -> Self {
        Self::new(RecordStore::new(records))
    }

    /// Build from a places `DataFrame`; see [`RecordStore::from_dataframe`]
    /// for the expected columns.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        Ok(Self::new(RecordStore::from_dataframe(df)?))
    }

    /// Load a prepared places CSV. The file stem becomes the label.
    #[instrument(name = "Load Geocoder from CSV", skip_all, fields(path = %path.as_ref().display()), level = "info")]
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let df = load_places_csv(path)?.collect()?;
        info!(rows = df.height(), "Places CSV loaded");

        let label = path
            .file_stem()
            .map_or_else(|| CUSTOM_LABEL.to_string(), |s| s.to_string_lossy().into_owned());
        Ok(Self::from_dataframe(&df)?.with_label(label))
    }

    /// Open a prepared dataset from the data directory.
    ///
    /// Fails with [`DataError::DatasetNotFound`](crate::data::DataError::DatasetNotFound)
    /// when the dataset has not been prepared yet.
    pub fn open(dataset: Dataset, data_dir: Option<&Path>) -> Result<Self> {
        let path = require_prepared(dataset, data_dir)?;
        Ok(Self::from_csv(path)?.with_label(dataset.name()))
    }

    /// Open a dataset, downloading and preparing it first when it is missing.
    #[cfg(feature = "download")]
    pub fn open_or_download(dataset: Dataset, data_dir: Option<&Path>) -> Result<Self> {
        let path = crate::data::download_dataset(dataset, data_dir)?;
        Ok(Self::from_csv(path)?.with_label(dataset.name()))
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Best match for `query` with default parameters.
    pub fn geocode(&self, query: &str) -> Option<GeocodeResult> {
        self.geocode_with(query, &GeocodeParams::default())
            .into_iter()
            .next()
    }

    /// Up to `params.top_n` matches for `query`, best first. Empty means no match.
    pub fn geocode_with(&self, query: &str, params: &GeocodeParams) -> Vec<GeocodeResult> {
        geocode_inner(&self.store, &self.index, query, params)
    }

    /// One [`BatchResult`] per query, in input order.
    ///
    /// Each query returns at most one result; `params.top_n` is ignored.
    pub fn geocode_batch<S: AsRef<str> + Sync>(
        &self,
        queries: &[S],
        params: &GeocodeParams,
    ) -> Vec<BatchResult> {
        geocode_batch_inner(&self.store, &self.index, queries, params)
    }

    /// Number of places.
    pub fn size(&self) -> usize {
        self.store.len()
    }

    /// Number of distinct indexed name variants.
    pub fn vocabulary_size(&self) -> usize {
        self.index.len()
    }

    /// Name of the dataset this geocoder was loaded from.
    pub fn dataset(&self) -> &str {
        &self.label
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn index(&self) -> &NameIndex {
        &self.index
    }
}

impl fmt::Display for Geocoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Geocoder(dataset='{}', places={})",
            self.label,
            group_thousands(self.size())
        )
    }
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
