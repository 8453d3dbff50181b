//! Classification scheme names.
//!
//! A scheme is a column of the reference table. Callers may use a handful
//! of aliases and any capitalisation; everything is resolved to the
//! column name the table actually carries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Column holding the short English name.
pub const NAME_SHORT: &str = "name_short";
/// Column holding the official name.
pub const NAME_OFFICIAL: &str = "name_official";
/// Column holding the per-record matching pattern.
pub const REGEX: &str = "regex";
/// Default target scheme for conversions.
pub const DEFAULT_TO: &str = "ISO3";

/// Columns carried as integers. Everything else is text.
pub const INTEGER_COLUMNS: &[&str] = &["ISOnumeric", "UNcode", "OECD", "EU", "UNmember"];

const ALIASES: &[(&str, &str)] = &[
    ("short", NAME_SHORT),
    ("short_name", NAME_SHORT),
    ("name", NAME_SHORT),
    ("names", NAME_SHORT),
    ("official", NAME_OFFICIAL),
    ("long_name", NAME_OFFICIAL),
    ("long", NAME_OFFICIAL),
    ("un", "UNcode"),
    ("unnumeric", "UNcode"),
    ("isocode", "ISOnumeric"),
    ("unmember", "UNmember"),
];

/// Storage type of a scheme column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Integer,
}

impl ColumnKind {
    /// Returns the kind a column of this name is stored as.
    #[must_use]
    pub fn for_column(name: &str) -> Self {
        if INTEGER_COLUMNS.contains(&name) {
            Self::Integer
        } else {
            Self::Text
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Integer => write!(f, "integer"),
        }
    }
}

/// How a source value is resolved to a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    /// Free text matched against the per-record patterns.
    Regex,
    /// Exact match against a scheme column.
    Column(String),
}

impl Source {
    /// Returns the scheme name used in logs and errors.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Regex => REGEX,
            Self::Column(name) => name,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Resolves a caller-supplied scheme name against the available columns.
///
/// Exact names win, then case-insensitive names, then aliases.
pub fn resolve_name<'a, I>(name: &str, columns: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    let wanted = name.trim();
    if let Some(found) = columns.clone().into_iter().find(|c| *c == wanted) {
        return Some(found.to_string());
    }
    if let Some(found) = columns
        .clone()
        .into_iter()
        .find(|c| c.eq_ignore_ascii_case(wanted))
    {
        return Some(found.to_string());
    }
    let lowered = wanted.to_ascii_lowercase();
    let target = ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, target)| *target)?;
    columns
        .into_iter()
        .find(|c| *c == target)
        .map(ToString::to_string)
}

/// Guesses the source scheme from the shape of a single value.
///
/// Integers are ISO numeric codes, two characters an ISO2 code, three
/// characters an ISO3 code, anything else free text.
#[must_use]
pub fn detect_source(value: &str) -> Source {
    let trimmed = value.trim();
    if trimmed.parse::<i64>().is_ok() {
        return Source::Column("ISOnumeric".to_string());
    }
    match trimmed.chars().count() {
        2 => Source::Column("ISO2".to_string()),
        3 => Source::Column("ISO3".to_string()),
        _ => Source::Regex,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[&str] = &["name_short", "name_official", "ISO2", "ISO3", "UNcode", "continent"];

    #[test]
    fn test_resolve_exact_and_case_insensitive() {
        let cols = COLUMNS.iter().copied();
        assert_eq!(resolve_name("ISO3", cols.clone()).as_deref(), Some("ISO3"));
        assert_eq!(resolve_name("iso3", cols.clone()).as_deref(), Some("ISO3"));
        assert_eq!(resolve_name(" Continent ", cols).as_deref(), Some("continent"));
    }

    #[test]
    fn test_resolve_aliases() {
        let cols = COLUMNS.iter().copied();
        assert_eq!(resolve_name("short", cols.clone()).as_deref(), Some("name_short"));
        assert_eq!(resolve_name("official", cols.clone()).as_deref(), Some("name_official"));
        assert_eq!(resolve_name("UN", cols).as_deref(), Some("UNcode"));
    }

    #[test]
    fn test_resolve_unknown() {
        assert!(resolve_name("abc", COLUMNS.iter().copied()).is_none());
        // alias target absent from this table
        assert!(resolve_name("isocode", COLUMNS.iter().copied()).is_none());
    }

    #[test]
    fn test_detect_source() {
        assert_eq!(detect_source("40"), Source::Column("ISOnumeric".to_string()));
        assert_eq!(detect_source("NA"), Source::Column("ISO2".to_string()));
        assert_eq!(detect_source("NAM"), Source::Column("ISO3".to_string()));
        assert_eq!(detect_source("Namibia"), Source::Regex);
    }

    #[test]
    fn test_column_kinds() {
        assert_eq!(ColumnKind::for_column("OECD"), ColumnKind::Integer);
        assert_eq!(ColumnKind::for_column("ISO2"), ColumnKind::Text);
        assert_eq!(ColumnKind::for_column("my_custom"), ColumnKind::Text);
    }
}
