//! The convert operation.
//!
//! [`ConvertBuilder`] collects the per-call options and resolves each
//! name independently: one unresolved value never aborts a batch unless
//! strict mode is requested.

use std::fmt;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::warn;

use super::CountryConverter;
use crate::error::{ConfigurationError, ConvertError, ConvertResult, LookupError};
use crate::matcher::MatchOutcome;
use crate::scheme::{self, Source};
use crate::value::Value;

/// Name fragments after which the rest of a free-text name is ignored.
pub const DEFAULT_EXCLUDE_PREFIXES: &[&str] = &[r"excl\w.*", "without", "w/o"];

static DEFAULT_EXCLUDES: Lazy<Vec<Regex>> = Lazy::new(|| {
    DEFAULT_EXCLUDE_PREFIXES
        .iter()
        .filter_map(|p| RegexBuilder::new(p).case_insensitive(true).build().ok())
        .collect()
});

/// One or several input names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Names {
    One(String),
    Many(Vec<String>),
}

impl Names {
    /// Flattens to a list.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(name) => vec![name],
            Self::Many(names) => names,
        }
    }
}

impl From<&str> for Names {
    fn from(v: &str) -> Self {
        Self::One(v.to_string())
    }
}

impl From<String> for Names {
    fn from(v: String) -> Self {
        Self::One(v)
    }
}

impl From<&String> for Names {
    fn from(v: &String) -> Self {
        Self::One(v.clone())
    }
}

impl From<Vec<String>> for Names {
    fn from(v: Vec<String>) -> Self {
        Self::Many(v)
    }
}

impl From<Vec<&str>> for Names {
    fn from(v: Vec<&str>) -> Self {
        Self::Many(v.into_iter().map(ToString::to_string).collect())
    }
}

impl From<&[&str]> for Names {
    fn from(v: &[&str]) -> Self {
        Self::Many(v.iter().map(ToString::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Names {
    fn from(v: [&str; N]) -> Self {
        Self::Many(v.iter().map(ToString::to_string).collect())
    }
}

/// What to return for a value that resolves to no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFound {
    /// A fixed placeholder string.
    Sentinel(String),
    /// A null value.
    Null,
    /// The input value unchanged.
    Input,
}

impl Default for NotFound {
    fn default() -> Self {
        Self::Sentinel("not found".to_string())
    }
}

impl From<&str> for NotFound {
    fn from(v: &str) -> Self {
        Self::Sentinel(v.to_string())
    }
}

impl From<String> for NotFound {
    fn from(v: String) -> Self {
        Self::Sentinel(v)
    }
}

impl NotFound {
    fn value_for(&self, input: &str) -> Value {
        match self {
            Self::Sentinel(s) => Value::Text(s.clone()),
            Self::Null => Value::Null,
            Self::Input => Value::Text(input.to_string()),
        }
    }
}

/// Conversion result for a single input value.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Converted {
    /// Exactly one target value.
    Found(Value),
    /// Several records share the source value (a grouping code).
    Multiple(Vec<Value>),
    /// No record matched; holds the not-found placeholder.
    NotFound(Value),
    /// Several patterns matched the free text; holds each record's target value.
    Ambiguous(Vec<Value>),
}

impl Converted {
    /// The scalar result, or the not-found placeholder.
    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        match self {
            Self::Found(v) | Self::NotFound(v) => Some(v),
            Self::Multiple(_) | Self::Ambiguous(_) => None,
        }
    }

    /// All values, one per matched record.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        match self {
            Self::Found(v) | Self::NotFound(v) => std::slice::from_ref(v),
            Self::Multiple(v) | Self::Ambiguous(v) => v,
        }
    }

    /// The scalar result as text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.value().and_then(Value::as_text)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_) | Self::Multiple(_))
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous(_))
    }
}

impl fmt::Display for Converted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(v) | Self::NotFound(v) => write!(f, "{v}"),
            Self::Multiple(vs) | Self::Ambiguous(vs) => {
                let parts: Vec<String> = vs.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}

/// Conversion output, shaped like the input.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Output {
    One(Converted),
    Many(Vec<Converted>),
}

impl Output {
    /// The single result, if the input was a single value.
    #[must_use]
    pub const fn as_one(&self) -> Option<&Converted> {
        match self {
            Self::One(c) => Some(c),
            Self::Many(_) => None,
        }
    }

    /// Text of a single scalar result.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_one().and_then(Converted::as_str)
    }

    /// All results in input order.
    #[must_use]
    pub fn into_vec(self) -> Vec<Converted> {
        match self {
            Self::One(c) => vec![c],
            Self::Many(cs) => cs,
        }
    }

    /// Number of converted values.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(cs) => cs.len(),
        }
    }

    /// Returns true for an empty batch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builder for a conversion call.
///
/// # Example
/// ```
/// use country_converter::{CountryConverter, NotFound};
///
/// let cc = CountryConverter::new()?;
/// let out = cc
///     .convert(["Germany excluding Berlin", "Atlantis"])
///     .src("regex")
///     .to("ISO2")
///     .not_found(NotFound::Input)
///     .run()?
///     .into_vec();
/// assert_eq!(out[0].as_str(), Some("DE"));
/// assert_eq!(out[1].as_str(), Some("Atlantis"));
/// # Ok::<(), country_converter::ConvertError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConvertBuilder<'c> {
    converter: &'c CountryConverter,
    names: Names,
    src: Option<String>,
    to: String,
    not_found: NotFound,
    enforce_list: bool,
    strict: bool,
    exclude_prefix: Option<Vec<String>>,
}

impl<'c> ConvertBuilder<'c> {
    pub(crate) fn new(converter: &'c CountryConverter, names: Names) -> Self {
        Self {
            converter,
            names,
            src: None,
            to: scheme::DEFAULT_TO.to_string(),
            not_found: NotFound::default(),
            enforce_list: false,
            strict: false,
            exclude_prefix: None,
        }
    }

    /// Source scheme; `"regex"` for free text. Detected per value if unset.
    #[must_use]
    pub fn src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }

    /// Target scheme (default `ISO3`).
    #[must_use]
    pub fn to(mut self, to: impl Into<String>) -> Self {
        self.to = to.into();
        self
    }

    /// Placeholder policy for unresolved values.
    #[must_use]
    pub fn not_found(mut self, policy: impl Into<NotFound>) -> Self {
        self.not_found = policy.into();
        self
    }

    /// Always return a list, even for a single input.
    #[must_use]
    pub fn enforce_list(mut self, enforce: bool) -> Self {
        self.enforce_list = enforce;
        self
    }

    /// Fail on unresolved or ambiguous values instead of substituting.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Patterns after which free text is cut before matching.
    #[must_use]
    pub fn exclude_prefix<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_prefix = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    /// Runs the conversion.
    ///
    /// # Errors
    ///
    /// Unknown `src`/`to` schemes and invalid exclude patterns are
    /// configuration errors. In strict mode, the first unresolved or
    /// ambiguous value is returned as a lookup error.
    pub fn run(self) -> ConvertResult<Output> {
        let to = self.converter.resolve_class(&self.to)?;
        let excludes = match &self.exclude_prefix {
            None => DEFAULT_EXCLUDES.clone(),
            Some(patterns) => compile_excludes(patterns)?,
        };

        let single = matches!(self.names, Names::One(_));
        let names = self.names.clone().into_vec();
        let mut results = Vec::with_capacity(names.len());
        for name in &names {
            let source = self.converter.source_for(self.src.as_deref(), name)?;
            results.push(self.convert_one(name, &source, &to, &excludes)?);
        }

        if single && !self.enforce_list {
            Ok(Output::One(results.remove(0)))
        } else {
            Ok(Output::Many(results))
        }
    }

    fn convert_one(
        &self,
        name: &str,
        source: &Source,
        to: &str,
        excludes: &[Regex],
    ) -> ConvertResult<Converted> {
        let table = self.converter.table();
        let rows = match source {
            Source::Regex => {
                let cleaned = strip_exclusions(name, excludes);
                match self.converter.matcher().find(cleaned) {
                    MatchOutcome::Unique(row) => vec![row],
                    MatchOutcome::NotFound => Vec::new(),
                    MatchOutcome::Ambiguous(rows) => {
                        let candidates: Vec<String> = rows
                            .iter()
                            .filter_map(|r| table.record(*r))
                            .map(|r| r.name_short().to_string())
                            .collect();
                        warn!(value = name, ?candidates, "name matched several patterns");
                        if self.strict {
                            return Err(LookupError::Ambiguous {
                                value: name.to_string(),
                                candidates,
                            }
                            .into());
                        }
                        let values = rows
                            .iter()
                            .map(|r| table.get(*r, to).cloned().unwrap_or_default())
                            .collect();
                        return Ok(Converted::Ambiguous(values));
                    }
                }
            }
            Source::Column(column) => match table.column_index(column) {
                Some(idx) => table.find_exact(idx, name),
                None => Vec::new(),
            },
        };

        if rows.is_empty() {
            warn!(value = name, scheme = %source, "not found");
            if self.strict {
                return Err(LookupError::NotFound {
                    value: name.to_string(),
                    scheme: source.name().to_string(),
                }
                .into());
            }
            return Ok(Converted::NotFound(self.not_found.value_for(name)));
        }

        let mut values: Vec<Value> = Vec::with_capacity(rows.len());
        for row in rows {
            let value = table.get(row, to).cloned().unwrap_or_default();
            if !values.contains(&value) {
                values.push(value);
            }
        }
        if values.len() == 1 {
            Ok(Converted::Found(values.remove(0)))
        } else {
            Ok(Converted::Multiple(values))
        }
    }
}

fn compile_excludes(patterns: &[String]) -> ConvertResult<Vec<Regex>> {
    patterns
        .iter()
        .enumerate()
        .map(|(i, p)| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    ConvertError::from(ConfigurationError::InvalidPattern {
                        row: i,
                        name: p.clone(),
                        reason: e.to_string(),
                    })
                })
        })
        .collect()
}

/// Cuts `name` at the earliest match of any exclusion pattern.
fn strip_exclusions<'a>(name: &'a str, excludes: &[Regex]) -> &'a str {
    let cut = excludes
        .iter()
        .filter_map(|re| re.find(name).map(|m| m.start()))
        .min()
        .unwrap_or(name.len());
    name[..cut].trim()
}
