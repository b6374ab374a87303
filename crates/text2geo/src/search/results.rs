use std::fmt;

use crate::data::PlaceRecord;

/// Error indicator carried by unmatched batch entries.
pub const NOT_FOUND: &str = "not found";

/// A resolved place for a query.
///
/// `score` is 100 for exact matches and the truncated similarity score for
/// fuzzy ones. `matched_as` names the variant a fuzzy match came through.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeocodeResult {
    pub geoname_id: u64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country_code: Option<String>,
    pub population: u64,
    pub score: u8,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub matched_as: Option<String>,
}

impl GeocodeResult {
    pub(crate) fn exact(record: &PlaceRecord) -> Self {
        Self::from_record(record, 100, None)
    }

    pub(crate) fn from_record(record: &PlaceRecord, score: u8, matched_as: Option<String>) -> Self {
        Self {
            geoname_id: record.geoname_id,
            name: record.name.clone(),
            latitude: record.latitude,
            longitude: record.longitude,
            country_code: record.country_code.clone(),
            population: record.population,
            score,
            matched_as,
        }
    }

    /// Whether this result came from an exact variant lookup.
    pub fn is_exact(&self) -> bool {
        self.matched_as.is_none()
    }

    /// `(latitude, longitude)`
    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

impl fmt::Display for GeocodeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) [{:.5}, {:.5}] score={}",
            self.name,
            self.country_code.as_deref().unwrap_or("??"),
            self.latitude,
            self.longitude,
            self.score
        )?;
        if let Some(variant) = &self.matched_as {
            write!(f, " via '{variant}'")?;
        }
        Ok(())
    }
}

/// Outcome of one query in a batch. Unmatched queries are kept, never dropped.
///
/// With the `serde` feature both variants serialize to the same flat row:
/// place fields are `null` and `error` is `"not found"` for unmatched queries.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "BatchRow", try_from = "BatchRow"))]
pub enum BatchResult {
    Found { query: String, result: GeocodeResult },
    NotFound { query: String },
}

impl BatchResult {
    pub fn query(&self) -> &str {
        match self {
            Self::Found { query, .. } | Self::NotFound { query } => query,
        }
    }

    pub fn result(&self) -> Option<&GeocodeResult> {
        match self {
            Self::Found { result, .. } => Some(result),
            Self::NotFound { .. } => None,
        }
    }

    pub fn into_result(self) -> Option<GeocodeResult> {
        match self {
            Self::Found { result, .. } => Some(result),
            Self::NotFound { .. } => None,
        }
    }

    /// Coordinates of the match; `None` when the query was not found.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.result().map(GeocodeResult::coordinates)
    }

    /// `"not found"` for unmatched queries.
    pub fn error(&self) -> Option<&'static str> {
        match self {
            Self::Found { .. } => None,
            Self::NotFound { .. } => Some(NOT_FOUND),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

/// Flat serialized form of a [`BatchResult`].
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct BatchRow {
    query: String,
    geoname_id: Option<u64>,
    name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    country_code: Option<String>,
    population: Option<u64>,
    score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    matched_as: Option<String>,
    error: Option<String>,
}

#[cfg(feature = "serde")]
impl From<BatchResult> for BatchRow {
    fn from(entry: BatchResult) -> Self {
        match entry {
            BatchResult::Found { query, result } => Self {
                query,
                geoname_id: Some(result.geoname_id),
                name: Some(result.name),
                latitude: Some(result.latitude),
                longitude: Some(result.longitude),
                country_code: result.country_code,
                population: Some(result.population),
                score: Some(result.score),
                matched_as: result.matched_as,
                error: None,
            },
            BatchResult::NotFound { query } => Self {
                query,
                geoname_id: None,
                name: None,
                latitude: None,
                longitude: None,
                country_code: None,
                population: None,
                score: None,
                matched_as: None,
                error: Some(NOT_FOUND.to_owned()),
            },
        }
    }
}

#[cfg(feature = "serde")]
impl TryFrom<BatchRow> for BatchResult {
    type Error = String;

    fn try_from(row: BatchRow) -> Result<Self, Self::Error> {
        if row.error.is_some() {
            return Ok(Self::NotFound { query: row.query });
        }
        match (row.geoname_id, row.name, row.latitude, row.longitude, row.score) {
            (Some(geoname_id), Some(name), Some(latitude), Some(longitude), Some(score)) => {
                Ok(Self::Found {
                    query: row.query,
                    result: GeocodeResult {
                        geoname_id,
                        name,
                        latitude,
                        longitude,
                        country_code: row.country_code,
                        population: row.population.unwrap_or_default(),
                        score,
                        matched_as: row.matched_as,
                    },
                })
            }
            _ => Err(format!(
                "batch entry for '{}' has neither a place nor an error",
                row.query
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moscow() -> PlaceRecord {
        PlaceRecord::new(524_901, "Moscow", 55.75222, 37.61556)
            .with_country_code("RU")
            .with_population(10_381_222)
    }

    #[test]
    fn test_exact_result() {
        let result = GeocodeResult::exact(&moscow());
        assert_eq!(result.score, 100);
        assert!(result.is_exact());
        assert_eq!(result.coordinates(), (55.75222, 37.61556));
        assert_eq!(result.to_string(), "Moscow (RU) [55.75222, 37.61556] score=100");
    }

    #[test]
    fn test_fuzzy_result_display() {
        let result = GeocodeResult::from_record(&moscow(), 83, Some("москва".into()));
        assert!(!result.is_exact());
        assert!(result.to_string().ends_with("score=83 via 'москва'"));
    }

    #[test]
    fn test_batch_result_accessors() {
        let found = BatchResult::Found {
            query: "Moscow".into(),
            result: GeocodeResult::exact(&moscow()),
        };
        let missing = BatchResult::NotFound {
            query: "Nowhereville".into(),
        };

        assert!(found.is_found());
        assert_eq!(found.error(), None);
        assert_eq!(found.coordinates(), Some((55.75222, 37.61556)));

        assert!(!missing.is_found());
        assert_eq!(missing.query(), "Nowhereville");
        assert_eq!(missing.error(), Some("not found"));
        assert_eq!(missing.coordinates(), None);
        assert!(missing.into_result().is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_batch_result_json_rows() {
        let found = BatchResult::Found {
            query: "Moscow".into(),
            result: GeocodeResult::exact(&moscow()),
        };
        let missing = BatchResult::NotFound {
            query: "Nowhereville".into(),
        };

        let json = serde_json::to_value(&missing).unwrap();
        assert_eq!(json["query"], "Nowhereville");
        assert_eq!(json["error"], "not found");
        assert!(json["name"].is_null());
        assert!(json["latitude"].is_null());
        assert!(json["longitude"].is_null());

        let json = serde_json::to_value(&found).unwrap();
        assert_eq!(json["name"], "Moscow");
        assert_eq!(json["latitude"], 55.75222);
        assert_eq!(json["score"], 100);
        assert!(json["error"].is_null());

        let back: Vec<BatchResult> =
            serde_json::from_value(serde_json::json!([found.clone(), missing.clone()])).unwrap();
        assert_eq!(back, vec![found, missing]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_batch_row_without_place_or_error() {
        let err = serde_json::from_str::<BatchResult>(r#"{"query": "x", "name": null}"#)
            .unwrap_err();
        assert!(err.to_string().contains("neither a place nor an error"));
    }
}
