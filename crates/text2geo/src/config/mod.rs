use crate::{error::Result, search::GeocodeParams};

/// Builder for per-call matching parameters with ergonomic presets
#[derive(Debug, Clone, Default)]
pub struct GeocodeParamsBuilder {
    params: GeocodeParams,
}

impl GeocodeParamsBuilder {
    /// Create a new builder with the default parameters
    /// (threshold 75, one result, candidate pool of 20)
    pub fn new() -> Self {
        Self {
            params: GeocodeParams::default(),
        }
    }

    /// Only accept close fuzzy matches
    pub fn strict() -> Self {
        let mut builder = Self::new();
        builder.params.threshold = 90;
        builder.params.candidate_pool = 10;
        builder
    }

    /// Accept looser fuzzy matches, useful for heavily misspelled input
    pub fn lenient() -> Self {
        let mut builder = Self::new();
        builder.params.threshold = 60;
        builder.params.candidate_pool = 50;
        builder
    }

    /// Return many candidates from a deep pool, for inspection and debugging
    pub fn exhaustive() -> Self {
        let mut builder = Self::new();
        builder.params.threshold = 50;
        builder.params.top_n = 10;
        builder.params.candidate_pool = 200;
        builder
    }

    /// Restrict results to a two-letter country code (case-insensitive)
    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.params.country = Some(country.into());
        self
    }

    /// Remove any country restriction
    pub fn no_country(mut self) -> Self {
        self.params.country = None;
        self
    }

    /// Set the minimum fuzzy score (capped at 100)
    pub fn threshold(mut self, threshold: u8) -> Self {
        self.params.threshold = threshold.min(100);
        self
    }

    /// Set the maximum number of results (at least 1)
    pub fn top_n(mut self, top_n: usize) -> Self {
        self.params.top_n = top_n.max(1);
        self
    }

    /// Set how many best-scoring variants feed the fuzzy path (at least 1)
    pub fn candidate_pool(mut self, pool: usize) -> Self {
        self.params.candidate_pool = pool.max(1);
        self
    }

    /// Build the final parameters
    pub fn build(self) -> GeocodeParams {
        self.params
    }

    /// Build and validate, rejecting malformed country codes
    pub fn try_build(self) -> Result<GeocodeParams> {
        self.params.validate()?;
        Ok(self.params)
    }
}
