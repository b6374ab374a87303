//! Query matching.
//!
//! Resolves free-text queries to places: exact variant lookup first, then
//! weighted fuzzy scoring over the variant vocabulary, country filtering and
//! ranking.

mod fuzzy;
mod geocode;
mod results;

pub use fuzzy::{
    extract_top, partial_ratio, partial_token_ratio, ratio, token_ratio, token_set_ratio,
    token_sort_ratio, weighted_ratio,
};
pub use geocode::{
    DEFAULT_CANDIDATE_POOL, DEFAULT_THRESHOLD, DEFAULT_TOP_N, GeocodeParams, geocode_batch_inner,
    geocode_inner,
};
pub use results::{BatchResult, GeocodeResult, NOT_FOUND};
