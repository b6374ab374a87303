//! Weighted string similarity over the variant vocabulary.
//!
//! The base metric is the normalized indel similarity from `rapidfuzz`. On top
//! of it sit the usual composite scorers: token sort/set ratios (word order and
//! duplicate insensitive), partial ratios (best-aligned substring) and
//! [`weighted_ratio`], which picks the best of them with length-dependent
//! penalties. All scores are in `0.0..=100.0`.

use std::collections::BTreeSet;
use std::sync::Arc;

use rapidfuzz::fuzz;
use rayon::prelude::*;
use tracing::{instrument, trace};

/// Penalty applied to token-based scores in [`weighted_ratio`].
const TOKEN_SCALE: f64 = 0.95;
/// Partial scores count less when the lengths differ this much or more.
const LONG_PARTIAL_LEN_RATIO: f64 = 8.0;
/// Below this length ratio, partial matching is not considered at all.
const PARTIAL_LEN_RATIO: f64 = 1.5;

fn slice_ratio(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    fuzz::ratio(a.iter().copied(), b.iter().copied()) * 100.0
}

/// Normalized indel similarity.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 100.0;
    }
    fuzz::ratio(a.chars(), b.chars()) * 100.0
}

/// Best [`ratio`] between the shorter string and any equally long window of
/// the longer one, including windows hanging off either end.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let best = best_window(short, long);
    if short.len() == long.len() && best < 100.0 {
        return best.max(best_window(long, short));
    }
    best
}

fn best_window(needle: &[char], haystack: &[char]) -> f64 {
    let n = needle.len();
    let h = haystack.len();
    let mut best = 0.0_f64;

    for start in 0..=h - n {
        let score = slice_ratio(needle, &haystack[start..start + n]);
        if score >= 100.0 {
            return 100.0;
        }
        best = best.max(score);
    }
    for end in 1..n {
        best = best.max(slice_ratio(needle, &haystack[..end]));
    }
    for start in (h - n + 1)..h {
        best = best.max(slice_ratio(needle, &haystack[start..]));
    }
    best
}

fn sorted_tokens(s: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens
}

/// Intersection and both differences of two token sets, each sorted.
struct TokenSets<'a> {
    intersection: Vec<&'a str>,
    only_a: Vec<&'a str>,
    only_b: Vec<&'a str>,
}

impl<'a> TokenSets<'a> {
    fn new(a: &'a str, b: &'a str) -> Option<Self> {
        let set_a: BTreeSet<&str> = a.split_whitespace().collect();
        let set_b: BTreeSet<&str> = b.split_whitespace().collect();
        if set_a.is_empty() || set_b.is_empty() {
            return None;
        }
        Some(Self {
            intersection: set_a.intersection(&set_b).copied().collect(),
            only_a: set_a.difference(&set_b).copied().collect(),
            only_b: set_b.difference(&set_a).copied().collect(),
        })
    }
}

fn join_tokens(head: &str, tail: &[&str]) -> String {
    let tail = tail.join(" ");
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail,
        (false, true) => head.to_owned(),
        (false, false) => format!("{head} {tail}"),
    }
}

/// [`ratio`] of both strings after sorting their whitespace tokens.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a).join(" "), &sorted_tokens(b).join(" "))
}

/// Set-based token similarity; one token set contained in the other scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let Some(sets) = TokenSets::new(a, b) else {
        return 0.0;
    };
    if !sets.intersection.is_empty() && (sets.only_a.is_empty() || sets.only_b.is_empty()) {
        return 100.0;
    }

    let common = sets.intersection.join(" ");
    let combined_a = join_tokens(&common, &sets.only_a);
    let combined_b = join_tokens(&common, &sets.only_b);

    let mut best = ratio(&combined_a, &combined_b);
    if !common.is_empty() {
        best = best
            .max(ratio(&common, &combined_a))
            .max(ratio(&common, &combined_b));
    }
    best
}

/// Best of [`token_sort_ratio`] and [`token_set_ratio`].
pub fn token_ratio(a: &str, b: &str) -> f64 {
    token_sort_ratio(a, b).max(token_set_ratio(a, b))
}

/// [`partial_ratio`] on sorted tokens; any shared token scores 100.
pub fn partial_token_ratio(a: &str, b: &str) -> f64 {
    let Some(sets) = TokenSets::new(a, b) else {
        return 0.0;
    };
    if !sets.intersection.is_empty() {
        return 100.0;
    }
    let sorted = partial_ratio(&sorted_tokens(a).join(" "), &sorted_tokens(b).join(" "));
    sorted.max(partial_ratio(&sets.only_a.join(" "), &sets.only_b.join(" ")))
}

/// Weighted combination of the scorers above, robust to token reordering,
/// substring containment and small edits.
///
/// Strings of similar length are compared whole (plain and token ratios).
/// When one is at least 1.5 times longer, partial scores are also considered,
/// scaled by 0.9, or by 0.6 once the length ratio reaches 8.
pub fn weighted_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let len_a = a.chars().count() as f64;
    let len_b = b.chars().count() as f64;
    let len_ratio = len_a.max(len_b) / len_a.min(len_b);

    let best = ratio(a, b);
    if len_ratio < PARTIAL_LEN_RATIO {
        return best.max(token_ratio(a, b) * TOKEN_SCALE);
    }

    let partial_scale = if len_ratio < LONG_PARTIAL_LEN_RATIO {
        0.9
    } else {
        0.6
    };
    best.max(partial_ratio(a, b) * partial_scale)
        .max(partial_token_ratio(a, b) * TOKEN_SCALE * partial_scale)
}

/// Score `query` against every choice and keep the `limit` best.
///
/// Returns `(choice index, score)` pairs sorted by descending score; equal
/// scores keep choice order. Scoring runs in parallel.
#[instrument(name = "Score Vocabulary", skip(choices), fields(choices = choices.len()), level = "debug")]
pub fn extract_top(query: &str, choices: &[Arc<str>], limit: usize) -> Vec<(usize, f64)> {
    if limit == 0 || choices.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(usize, f64)> = choices
        .par_iter()
        .enumerate()
        .map(|(i, choice)| (i, weighted_ratio(query, choice)))
        .collect();

    let by_score = |a: &(usize, f64), b: &(usize, f64)| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0));
    if scored.len() > limit {
        scored.select_nth_unstable_by(limit - 1, by_score);
        scored.truncate(limit);
    }
    scored.sort_unstable_by(by_score);

    trace!(top = ?scored.first(), "Vocabulary scored");
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_ratio() {
        approx(ratio("moscow", "moscow"), 100.0);
        // one substitution is two indel operations over 12 characters
        approx(ratio("масква", "москва"), 100.0 * (1.0 - 2.0 / 12.0));
        approx(ratio("abc", "xyz"), 0.0);
        approx(ratio("", ""), 100.0);
        approx(ratio("", "abc"), 0.0);
    }

    #[test]
    fn test_partial_ratio() {
        approx(partial_ratio("york", "new york"), 100.0);
        approx(partial_ratio("new york", "york"), 100.0);
        approx(partial_ratio("", ""), 100.0);
        approx(partial_ratio("", "york"), 0.0);
        assert!(partial_ratio("yorx", "new york") < 100.0);
    }

    #[test]
    fn test_token_ratios() {
        approx(token_sort_ratio("new york", "york new"), 100.0);
        approx(token_set_ratio("saint petersburg", "petersburg"), 100.0);
        approx(token_set_ratio("", "petersburg"), 0.0);
        approx(partial_token_ratio("nizhny novgorod", "novgorod"), 100.0);
        assert!(token_set_ratio("saint petersburg", "saint louis") < 100.0);
    }

    #[test]
    fn test_weighted_ratio_identity_and_empty() {
        approx(weighted_ratio("kyiv", "kyiv"), 100.0);
        approx(weighted_ratio("", "kyiv"), 0.0);
        approx(weighted_ratio("kyiv", ""), 0.0);
    }

    #[test]
    fn test_weighted_ratio_reordering() {
        // same length, tokens swapped: token score scaled by 0.95
        approx(weighted_ratio("york new", "new york"), 95.0);
    }

    #[test]
    fn test_weighted_ratio_containment() {
        // length ratio above 1.5 -> partial scale 0.9
        approx(weighted_ratio("moscow", "moscow oblast"), 90.0);
        // length ratio >= 8 -> partial scale 0.6
        let long = "a very long administrative name with minsk in it";
        approx(weighted_ratio("minsk", long), 60.0);
    }

    #[test]
    fn test_weighted_ratio_typo() {
        let score = weighted_ratio("масква", "москва");
        assert!(score >= 75.0, "typo should score above default threshold: {score}");
        assert!(score < 100.0);
    }

    #[test]
    fn test_extract_top_orders_and_limits() {
        let choices: Vec<Arc<str>> = ["kiev", "moscow", "moskva", "moscow", "minsk"]
            .into_iter()
            .map(Arc::from)
            .collect();

        let top = extract_top("moscow", &choices, 3);
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].0, 1);
        assert_eq!(top[1].0, 3, "equal scores keep choice order");
        approx(top[0].1, 100.0);
        assert!(top[1].1 >= top[2].1);
        assert_eq!(top[2].0, 2);

        assert!(extract_top("moscow", &choices, 0).is_empty());
        assert_eq!(extract_top("moscow", &choices, 50).len(), choices.len());
    }
}
