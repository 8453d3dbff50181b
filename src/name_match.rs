//! Matching two free-text name lists against each other.
//!
//! Both lists are run through the country patterns. An entry of the
//! first list is paired with the entries of the second list that are
//! recognised as the same country; among several, the longest one wins
//! and ties go to the earlier entry.

use indexmap::IndexMap;
use tracing::debug;

use crate::converter::{CountryConverter, Names};

/// Placeholder for entries without a counterpart.
pub const MATCH_NOT_FOUND: &str = "not_found";

impl CountryConverter {
    /// All entries of `list_b` naming the same country as each entry of `list_a`.
    pub fn match_candidates(
        &self,
        list_a: impl Into<Names>,
        list_b: impl Into<Names>,
    ) -> IndexMap<String, Vec<String>> {
        let list_b = list_b.into().into_vec();
        let rows_b: Vec<Vec<usize>> = list_b
            .iter()
            .map(|b| self.matcher().matching_rows(&normalize(b)))
            .collect();

        let mut out = IndexMap::new();
        for a in list_a.into().into_vec() {
            let rows_a = self.matcher().matching_rows(&normalize(&a));
            let mut candidates: Vec<String> = Vec::new();
            for (b, rows) in list_b.iter().zip(&rows_b) {
                if rows.iter().any(|r| rows_a.contains(r)) && !candidates.contains(b) {
                    candidates.push(b.clone());
                }
            }
            debug!(name = %a, candidates = candidates.len(), "matched name against list");
            out.insert(a, candidates);
        }
        out
    }

    /// Best counterpart in `list_b` for each entry of `list_a`, or
    /// [`MATCH_NOT_FOUND`].
    pub fn match_names(
        &self,
        list_a: impl Into<Names>,
        list_b: impl Into<Names>,
    ) -> IndexMap<String, String> {
        self.match_names_with(list_a, list_b, MATCH_NOT_FOUND)
    }

    /// Like [`CountryConverter::match_names`] with a custom placeholder.
    pub fn match_names_with(
        &self,
        list_a: impl Into<Names>,
        list_b: impl Into<Names>,
        not_found: &str,
    ) -> IndexMap<String, String> {
        self.match_candidates(list_a, list_b)
            .into_iter()
            .map(|(a, candidates)| {
                let best = longest_first(&candidates).unwrap_or(not_found).to_string();
                (a, best)
            })
            .collect()
    }
}

fn normalize(s: &str) -> String {
    s.replace('_', " ").trim().to_string()
}

/// Longest candidate; the earliest wins a tie.
fn longest_first(candidates: &[String]) -> Option<&str> {
    let mut best: Option<&String> = None;
    for c in candidates {
        if best.map_or(true, |b| c.chars().count() > b.chars().count()) {
            best = Some(c);
        }
    }
    best.map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableBuilder;

    fn converter() -> CountryConverter {
        let table = TableBuilder::new(["name_short", "regex"])
            .row(["United States", r"^united\W*states$|^usa?$"])
            .row(["Norway", "norway"])
            .build()
            .unwrap();
        CountryConverter::builder().base_table(table).build().unwrap()
    }

    #[test]
    fn test_longest_first_tie_breaks_on_order() {
        let c = vec!["ab".to_string(), "cd".to_string(), "e".to_string()];
        assert_eq!(longest_first(&c), Some("ab"));
        assert_eq!(longest_first(&[]), None);
    }

    #[test]
    fn test_underscores_become_spaces() {
        let cc = converter();
        let m = cc.match_names(["united_states"], ["USA", "Norway"]);
        assert_eq!(m["united_states"], "USA");
    }

    #[test]
    fn test_candidates_and_not_found() {
        let cc = converter();
        let m = cc.match_candidates(["norway", "abc"], ["Norway", "norway is nice", "Sweden"]);
        assert_eq!(m["norway"], vec!["Norway", "norway is nice"]);
        assert!(m["abc"].is_empty());

        let best = cc.match_names_with(["norway", "abc"], ["Norway", "norway is nice"], "XXX");
        assert_eq!(best["norway"], "norway is nice");
        assert_eq!(best["abc"], "XXX");
    }
}
