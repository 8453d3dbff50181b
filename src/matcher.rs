//! Free-text resolution against the per-record patterns.
//!
//! Every record's `regex` cell is compiled once, case-insensitive, when
//! the matcher is built. A query is searched (not anchored) against all
//! patterns; exactly one hit resolves the query, zero hits is a miss and
//! several hits are reported as ambiguous rather than guessed.

use regex::{Regex, RegexBuilder};

use crate::error::{ConfigurationError, ConvertResult};
use crate::scheme;
use crate::table::ReferenceTable;
use crate::value::Value;

/// Result of matching one query.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    Unique(usize),
    NotFound,
    Ambiguous(Vec<usize>),
}

impl MatchOutcome {
    /// The matched row, if unique.
    #[must_use]
    pub const fn row(&self) -> Option<usize> {
        match self {
            Self::Unique(row) => Some(*row),
            _ => None,
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn is_unique(&self) -> bool {
        matches!(self, Self::Unique(_))
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous(_))
    }
}

/// Row-aligned compiled patterns of a reference table.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    patterns: Vec<Regex>,
}

impl RegexMatcher {
    /// Compiles the `regex` column of `table`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a missing or invalid pattern.
    pub fn compile(table: &ReferenceTable) -> ConvertResult<Self> {
        let mut patterns = Vec::with_capacity(table.len());
        for record in table.records() {
            let name = record.name_short().to_string();
            let source = match record.get(scheme::REGEX) {
                Some(Value::Text(p)) if !p.trim().is_empty() => p.trim(),
                _ => return Err(ConfigurationError::MissingPattern { name }.into()),
            };
            let regex = RegexBuilder::new(source)
                .case_insensitive(true)
                .build()
                .map_err(|e| ConfigurationError::InvalidPattern {
                    row: record.index(),
                    name,
                    reason: e.to_string(),
                })?;
            patterns.push(regex);
        }
        Ok(Self { patterns })
    }

    /// Number of compiled patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if no patterns were compiled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The compiled pattern of a row.
    #[must_use]
    pub fn pattern(&self, row: usize) -> Option<&Regex> {
        self.patterns.get(row)
    }

    /// All rows whose pattern matches `query`, in table order.
    #[must_use]
    pub fn matching_rows(&self, query: &str) -> Vec<usize> {
        self.patterns
            .iter()
            .enumerate()
            .filter(|(_, re)| re.is_match(query))
            .map(|(row, _)| row)
            .collect()
    }

    /// Resolves `query` to a single row.
    #[must_use]
    pub fn find(&self, query: &str) -> MatchOutcome {
        let mut rows = self.matching_rows(query.trim());
        match rows.len() {
            0 => MatchOutcome::NotFound,
            1 => MatchOutcome::Unique(rows.remove(0)),
            _ => MatchOutcome::Ambiguous(rows),
        }
    }

    /// Checks that every record's own names resolve to that record only.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InconsistentPattern`] for the first
    /// name that is unmatched or matched by other records.
    pub fn check_consistency(&self, table: &ReferenceTable) -> ConvertResult<()> {
        for record in table.records() {
            for field in [scheme::NAME_SHORT, scheme::NAME_OFFICIAL] {
                let Some(Value::Text(name)) = record.get(field) else {
                    continue;
                };
                let rows = self.matching_rows(name);
                if rows != [record.index()] {
                    let matched = rows
                        .iter()
                        .filter_map(|r| table.record(*r))
                        .map(|r| r.name_short().to_string())
                        .collect();
                    return Err(ConfigurationError::InconsistentPattern {
                        name: record.name_short().to_string(),
                        field: field.to_string(),
                        matched,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}
