use ahash::AHashSet as HashSet;
use rayon::prelude::*;
use tracing::{debug, instrument, trace};

use super::fuzzy::extract_top;
use super::results::{BatchResult, GeocodeResult};
use crate::data::{RecordStore, normalize_country_code};
use crate::error::{Result, Text2GeoError};
use crate::index::{NameIndex, normalize};

/// Minimum similarity for a fuzzy match to be returned.
pub const DEFAULT_THRESHOLD: u8 = 75;
pub const DEFAULT_TOP_N: usize = 1;
/// How many of the best-scoring variants are considered before thresholding.
pub const DEFAULT_CANDIDATE_POOL: usize = 20;

/// Per-call matching parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeocodeParams {
    /// Restrict results to one ISO country code. Blank means no restriction.
    pub country: Option<String>,
    /// Fuzzy matches scoring below this are dropped.
    pub threshold: u8,
    /// Maximum number of results.
    pub top_n: usize,
    /// Number of variants pulled from the fuzzy scorer before thresholding.
    pub candidate_pool: usize,
}

impl Default for GeocodeParams {
    fn default() -> Self {
        Self {
            country: None,
            threshold: DEFAULT_THRESHOLD,
            top_n: DEFAULT_TOP_N,
            candidate_pool: DEFAULT_CANDIDATE_POOL,
        }
    }
}

impl GeocodeParams {
    pub fn builder() -> crate::config::GeocodeParamsBuilder {
        crate::config::GeocodeParamsBuilder::new()
    }

    /// Upper-cased country filter, or `None` when absent or blank.
    pub fn country_filter(&self) -> Option<String> {
        self.country.as_deref().and_then(normalize_country_code)
    }

    /// Check that the parameters describe a meaningful query.
    pub fn validate(&self) -> Result<()> {
        if self.threshold > 100 {
            return Err(Text2GeoError::ConfigError(format!(
                "threshold must be within 0..=100, got {}",
                self.threshold
            )));
        }
        if self.candidate_pool == 0 {
            return Err(Text2GeoError::ConfigError(
                "candidate_pool must be at least 1".to_string(),
            ));
        }
        if let Some(code) = self.country_filter()
            && (code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()))
        {
            return Err(Text2GeoError::ConfigError(format!(
                "country must be a two-letter ISO code, got '{code}'"
            )));
        }
        Ok(())
    }
}

/// A record reached through a fuzzy-matched variant.
#[derive(Debug, Clone)]
struct MatchCandidate<'a> {
    position: usize,
    variant: &'a str,
    score: u8,
    population: u64,
}

fn passes_country(store: &RecordStore, position: usize, country: Option<&str>) -> bool {
    let Some(country) = country else {
        return true;
    };
    store
        .get(position)
        .and_then(|record| record.country_code.as_deref())
        .is_some_and(|code| code == country)
}

fn exact_matches(
    store: &RecordStore,
    positions: &[usize],
    country: Option<&str>,
    top_n: usize,
) -> Vec<GeocodeResult> {
    let mut records: Vec<_> = positions
        .iter()
        .filter(|&&position| passes_country(store, position, country))
        .filter_map(|&position| store.get(position))
        .collect();
    // stable: equal populations keep store order
    records.sort_by(|a, b| b.population.cmp(&a.population));
    records
        .into_iter()
        .take(top_n)
        .map(GeocodeResult::exact)
        .collect()
}

fn fuzzy_candidates<'a>(
    store: &RecordStore,
    index: &'a NameIndex,
    query: &str,
    country: Option<&str>,
    params: &GeocodeParams,
) -> Vec<MatchCandidate<'a>> {
    let pool = extract_top(query, index.vocabulary(), params.candidate_pool);
    let threshold = f64::from(params.threshold);

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for (key_id, score) in pool {
        if score < threshold {
            continue;
        }
        let Some(variant) = index.variant(key_id) else {
            continue;
        };
        for &position in index.positions(key_id) {
            // first (best-scoring) variant to reach a record claims it
            if !seen.insert(position) || !passes_country(store, position, country) {
                continue;
            }
            let Some(record) = store.get(position) else {
                continue;
            };
            candidates.push(MatchCandidate {
                position,
                variant,
                score: score.clamp(0.0, 100.0) as u8,
                population: record.population,
            });
        }
    }
    candidates
}

/// Resolve a free-text place name against the index.
///
/// Exact variant hits win outright (score 100, most populous first). When the
/// query has no exact hit, or every exact hit is excluded by the country
/// filter, the query is fuzzy-matched against the whole vocabulary. Results are
/// ordered by score then population and capped at `params.top_n`.
#[instrument(name = "Geocode", skip(store, index, params), level = "debug")]
pub fn geocode_inner(
    store: &RecordStore,
    index: &NameIndex,
    query: &str,
    params: &GeocodeParams,
) -> Vec<GeocodeResult> {
    let normalized = normalize(query);
    if normalized.is_empty() || params.top_n == 0 {
        return Vec::new();
    }
    let country = params.country_filter();
    let country = country.as_deref();

    if let Some(positions) = index.lookup(&normalized) {
        let results = exact_matches(store, positions, country, params.top_n);
        if !results.is_empty() {
            trace!(hits = positions.len(), "Exact match");
            return results;
        }
        debug!(
            hits = positions.len(),
            country, "Exact hits excluded by country filter, trying fuzzy match"
        );
    }

    let mut candidates = fuzzy_candidates(store, index, &normalized, country, params);
    candidates.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.population.cmp(&a.population))
    });
    trace!(candidates = candidates.len(), "Fuzzy candidates ranked");

    candidates
        .into_iter()
        .take(params.top_n)
        .filter_map(|candidate| {
            store.get(candidate.position).map(|record| {
                GeocodeResult::from_record(
                    record,
                    candidate.score,
                    Some(candidate.variant.to_owned()),
                )
            })
        })
        .collect()
}

/// Resolve many queries independently, one [`BatchResult`] per query in input
/// order. Each query yields at most one result.
#[instrument(name = "Geocode Batch", skip_all, fields(queries = queries.len()), level = "info")]
pub fn geocode_batch_inner<S: AsRef<str> + Sync>(
    store: &RecordStore,
    index: &NameIndex,
    queries: &[S],
    params: &GeocodeParams,
) -> Vec<BatchResult> {
    let t_batch = std::time::Instant::now();
    let params = GeocodeParams {
        top_n: 1,
        ..params.clone()
    };

    let results: Vec<BatchResult> = queries
        .par_iter()
        .map(|query| {
            let query = query.as_ref();
            match geocode_inner(store, index, query, &params).into_iter().next() {
                Some(result) => BatchResult::Found {
                    query: query.to_owned(),
                    result,
                },
                None => BatchResult::NotFound {
                    query: query.to_owned(),
                },
            }
        })
        .collect();

    debug!(
        found = results.iter().filter(|r| r.is_found()).count(),
        elapsed_seconds = ?t_batch.elapsed(),
        "Batch geocoded"
    );
    results
}
