//! text2geo - Offline Fuzzy Geocoder
//!
//! Converts free-text place names, in any script and possibly misspelled, into
//! coordinates using an offline `GeoNames` gazetteer held entirely in memory.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use text2geo::{Dataset, GeocodeParams, Geocoder};
//!
//! // Open a dataset prepared with `text2geo prepare cis <dumps...>`
//! let geocoder = Geocoder::open(Dataset::Cis, None)?;
//!
//! if let Some(result) = geocoder.geocode("Moskow") {
//!     println!("{} -> {:?}", result.name, result.coordinates());
//! }
//!
//! // Restrict to one country and ask for several candidates
//! let params = GeocodeParams::builder().country("US").top_n(3).build();
//! for result in geocoder.geocode_with("Moscow", &params) {
//!     println!("{result}");
//! }
//!
//! // Batches keep one entry per query, in order
//! for entry in geocoder.geocode_batch(&["Kyiv", "Nowhereville"], &GeocodeParams::default()) {
//!     println!("{}: {:?}", entry.query(), entry.coordinates());
//! }
//! # Ok::<(), text2geo::error::Text2GeoError>(())
//! ```
//!
//! # Matching
//!
//! Every record is indexed under its primary name, ASCII name and alternate
//! names, lower-cased and trimmed. A query that equals one of those variants is
//! an exact match (score 100, most populous first). Otherwise the query is
//! scored against every variant with a weighted similarity ratio, the best 20
//! variants are kept, and those at or above the threshold (75 by default) are
//! resolved back to places and ranked by score, then population.
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod config;
mod core;
pub mod data;
pub mod error;
mod index;
mod search;

pub use core::Geocoder;

pub use config::GeocodeParamsBuilder;
pub use data::{Dataset, PlaceRecord, RecordStore};
pub use index::{NameIndex, normalize};
pub use polars;
pub use search::{
    BatchResult, DEFAULT_CANDIDATE_POOL, DEFAULT_THRESHOLD, DEFAULT_TOP_N, GeocodeParams,
    GeocodeResult, NOT_FOUND, weighted_ratio,
};
pub use text2geo_data as data_processing;

/// String similarity scorers used by the fuzzy path, all in `0.0..=100.0`.
pub mod fuzzy {
    pub use crate::search::{
        extract_top, partial_ratio, partial_token_ratio, ratio, token_ratio, token_set_ratio,
        token_sort_ratio, weighted_ratio,
    };
}

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for the text2geo library.
///
/// Installs a `tracing` fmt subscriber. `RUST_LOG` takes precedence over
/// `level` when set. Only the first call has any effect.
///
/// # Examples
///
/// ```rust
/// use text2geo::init_logging;
/// use tracing::Level;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), text2geo::error::Text2GeoError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::Text2GeoError> {
    LOGGER_INIT.get_or_try_init(|| -> Result<(), error::Text2GeoError> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("polars=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_data::create_test_places_csv;

    fn setup_test_env() {
        let _ = init_logging(tracing::Level::WARN);
    }

    fn test_geocoder() -> Geocoder {
        let file = create_test_places_csv().expect("Failed to create test CSV");
        Geocoder::from_csv(file.path()).expect("Failed to load test CSV")
    }

    #[test]
    fn test_init_logging_is_idempotent() {
        setup_test_env();
        assert!(init_logging(tracing::Level::DEBUG).is_ok());
    }

    #[test]
    fn test_exact_search() {
        setup_test_env();
        let geocoder = test_geocoder();

        let result = geocoder.geocode("moscow").unwrap();
        assert_eq!(result.name, "Moscow");
        assert_eq!(result.score, 100);
        assert_eq!(result.country_code.as_deref(), Some("RU"));
    }

    #[test]
    fn test_fuzzy_search() {
        setup_test_env();
        let geocoder = test_geocoder();

        let result = geocoder.geocode("Масква").unwrap();
        assert_eq!(result.geoname_id, 524_901);
        assert!(result.score >= DEFAULT_THRESHOLD);
        assert_eq!(result.matched_as.as_deref(), Some("москва"));
    }

    #[test]
    fn test_country_filtered_search() {
        setup_test_env();
        let geocoder = test_geocoder();
        let params = GeocodeParams::builder().country("US").build();

        let results = geocoder.geocode_with("Moscow", &params);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].geoname_id, 5_601_538);
    }

    #[test]
    fn test_batch_search() {
        setup_test_env();
        let geocoder = test_geocoder();

        let results = geocoder.geocode_batch(&["Moscow", "Nowhereville"], &GeocodeParams::default());
        assert_eq!(results.len(), 2);
        assert!(results[0].is_found());
        assert_eq!(results[1].error(), Some(NOT_FOUND));
        assert_eq!(results[1].coordinates(), None);
    }
}
