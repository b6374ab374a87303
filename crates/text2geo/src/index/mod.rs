//! In-memory name index over the record store.
//!
//! Every record is reachable under each of its normalized name variants: the
//! primary name, the ASCII name and every alternate name. The index maps a
//! variant to the positions of the records exposing it, and keeps the variant
//! vocabulary as a flat list that doubles as the fuzzy search space.

use std::sync::Arc;

use ahash::AHashMap as HashMap;
use itertools::Itertools;
use tracing::{info, instrument, trace};

use crate::data::{PlaceRecord, RecordStore};

/// Lower-case and trim a name or query.
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Distinct normalized variants of a record, primary name first, then the
/// ASCII name, then alternates in order. Alternate entries are split on commas.
pub fn record_variants(record: &PlaceRecord) -> Vec<String> {
    std::iter::once(record.name.as_str())
        .chain(record.ascii_name.as_deref())
        .chain(record.alternate_names.iter().flat_map(|alt| alt.split(',')))
        .map(normalize)
        .filter(|variant| !variant.is_empty())
        .unique()
        .collect()
}

/// Mapping from normalized name variant to the record positions using it.
///
/// Built once from a [`RecordStore`] and never mutated afterwards. Keys are
/// numbered in order of first appearance; positions under a key are in store
/// order.
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    vocabulary: Vec<Arc<str>>,
    postings: Vec<Vec<usize>>,
    key_ids: HashMap<Arc<str>, usize>,
}

impl NameIndex {
    #[instrument(name = "Build Name Index", skip_all, fields(records = store.len()), level = "info")]
    pub fn build(store: &RecordStore) -> Self {
        let t_build = std::time::Instant::now();
        let mut index = Self::default();

        for (position, record) in store.iter() {
            let variants = record_variants(record);
            if variants.is_empty() {
                trace!(position, geoname_id = record.geoname_id, "Record has no usable names");
            }
            for variant in variants {
                index.insert(variant, position);
            }
        }

        info!(
            records = store.len(),
            vocabulary = index.vocabulary.len(),
            links = index.total_links(),
            elapsed_seconds = ?t_build.elapsed(),
            "Name index built"
        );
        index
    }

    fn insert(&mut self, variant: String, position: usize) {
        if let Some(&key_id) = self.key_ids.get(variant.as_str()) {
            self.postings[key_id].push(position);
            return;
        }
        let key: Arc<str> = variant.into();
        let key_id = self.vocabulary.len();
        self.vocabulary.push(Arc::clone(&key));
        self.postings.push(vec![position]);
        self.key_ids.insert(key, key_id);
    }

    /// Id of an already-normalized variant, if indexed.
    pub fn key_id(&self, normalized: &str) -> Option<usize> {
        self.key_ids.get(normalized).copied()
    }

    /// Positions of records exposing an already-normalized variant.
    pub fn lookup(&self, normalized: &str) -> Option<&[usize]> {
        self.key_id(normalized).map(|key_id| self.positions(key_id))
    }

    /// Positions linked to a key id. Unknown ids yield an empty slice.
    pub fn positions(&self, key_id: usize) -> &[usize] {
        self.postings.get(key_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Variant text for a key id.
    pub fn variant(&self, key_id: usize) -> Option<&str> {
        self.vocabulary.get(key_id).map(AsRef::as_ref)
    }

    /// Every indexed variant, in order of first appearance.
    pub fn vocabulary(&self) -> &[Arc<str>] {
        &self.vocabulary
    }

    /// Number of distinct variants.
    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    /// Total number of (variant, position) links.
    pub fn total_links(&self) -> usize {
        self.postings.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> RecordStore {
        vec![
            PlaceRecord::new(524_901, "Moscow", 55.75, 37.61)
                .with_ascii_name("Moscow")
                .with_alternate_names(["Moskva", "Москва", " MOSCOW "])
                .with_country_code("RU"),
            PlaceRecord::new(5_601_538, "Moscow", 46.73, -117.0)
                .with_ascii_name("")
                .with_country_code("US"),
            PlaceRecord::new(703_448, "Kyiv", 50.45, 30.52)
                .with_alternate_names(["Kiev,Київ, ,Киев"]),
        ]
        .into()
    }

    #[test]
    fn test_record_variants_are_unique_and_ordered() {
        let store = store();
        let variants = record_variants(store.get(0).unwrap());
        assert_eq!(variants, vec!["moscow", "moskva", "москва"]);
    }

    #[test]
    fn test_alternates_split_on_commas() {
        let store = store();
        let variants = record_variants(store.get(2).unwrap());
        assert_eq!(variants, vec!["kyiv", "kiev", "київ", "киев"]);
    }

    #[test]
    fn test_shared_key_keeps_store_order() {
        let index = NameIndex::build(&store());
        assert_eq!(index.lookup("moscow"), Some(&[0, 1][..]));
        assert_eq!(index.lookup("москва"), Some(&[0][..]));
        assert_eq!(index.lookup("Moscow"), None, "lookups expect normalized input");
    }

    #[test]
    fn test_vocabulary_in_first_appearance_order() {
        let index = NameIndex::build(&store());
        let vocabulary: Vec<&str> = index.vocabulary().iter().map(AsRef::as_ref).collect();
        assert_eq!(
            vocabulary,
            vec!["moscow", "moskva", "москва", "kyiv", "kiev", "київ", "киев"]
        );
        assert_eq!(index.len(), 7);
        assert_eq!(index.total_links(), 8);
    }

    #[test]
    fn test_empty_names_are_skipped() {
        let store: RecordStore = vec![PlaceRecord::new(1, "   ", 0.0, 0.0)].into();
        let index = NameIndex::build(&store);
        assert!(index.is_empty());
        assert_eq!(index.lookup(""), None);
    }

    #[test]
    fn test_unknown_key_id() {
        let index = NameIndex::build(&store());
        assert!(index.positions(999).is_empty());
        assert_eq!(index.variant(0), Some("moscow"));
        assert_eq!(index.variant(999), None);
    }
}
