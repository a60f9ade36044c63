//! Filter predicates for the view cache.
//!
//! A filter is a boxed predicate over node names. The built-in constructors
//! cover the two matching styles the UI offers: plain case-insensitive
//! substring (inline filter) and fuzzy matching (finder overlay).

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

/// Boxed name predicate consumed by the view cache.
pub type FilterFn = Box<dyn Fn(&str) -> bool>;

/// Case-insensitive substring filter. An empty query matches everything.
pub fn substring(query: &str) -> FilterFn {
    let query = query.to_lowercase();
    Box::new(move |name| query.is_empty() || name.to_lowercase().contains(&query))
}

/// Fuzzy filter backed by the skim matching algorithm.
/// An empty query matches everything.
pub fn fuzzy(query: &str) -> FilterFn {
    let matcher = SkimMatcherV2::default();
    let query = query.to_string();
    Box::new(move |name| query.is_empty() || matcher.fuzzy_match(name, &query).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_is_case_insensitive() {
        let f = substring("REQ");
        assert!(f("my_request"));
        assert!(f("Requests"));
        assert!(!f("aliases"));
    }

    #[test]
    fn substring_empty_query_matches_all() {
        let f = substring("");
        assert!(f("anything"));
        assert!(f(""));
    }

    #[test]
    fn fuzzy_matches_subsequences() {
        let f = fuzzy("rqs");
        assert!(f("requests"));
        assert!(!f("aliases"));
    }

    #[test]
    fn fuzzy_empty_query_matches_all() {
        let f = fuzzy("");
        assert!(f("anything"));
    }
}
