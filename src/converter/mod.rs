//! The country converter.
//!
//! `CountryConverter` owns the reference table and its compiled
//! patterns. It routes free-text queries to the [`RegexMatcher`] and
//! code or name lookups to exact column matches, and exposes the
//! correspondence, grouping and concordance views built on top.

mod convert_op;
mod groups;

use std::path::PathBuf;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{ConvertError, ConvertResult};
use crate::matcher::RegexMatcher;
use crate::scheme::{self, ColumnKind};
use crate::table::ReferenceTable;
use crate::value::Value;

pub use convert_op::{ConvertBuilder, Converted, Names, NotFound, Output, DEFAULT_EXCLUDE_PREFIXES};
pub use groups::{Group, Projection};

use groups::Groups;

/// Source → destination value lists, keyed by the source value.
pub type Correspondence = IndexMap<String, Vec<Value>>;

#[derive(Debug, Clone)]
enum AdditionalData {
    Path(PathBuf),
    Table(ReferenceTable),
}

/// Builder for [`CountryConverter`].
///
/// # Example
/// ```rust,no_run
/// use country_converter::CountryConverter;
///
/// let cc = CountryConverter::builder()
///     .additional_data_file("my_countries.tsv")
///     .only_un_members(true)
///     .build()?;
/// # Ok::<(), country_converter::ConvertError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConverterBuilder {
    base: Option<ReferenceTable>,
    additional: Vec<AdditionalData>,
    only_un_members: bool,
    check_consistency: bool,
}

impl Default for ConverterBuilder {
    fn default() -> Self {
        Self {
            base: None,
            additional: Vec::new(),
            only_un_members: false,
            check_consistency: true,
        }
    }
}

impl ConverterBuilder {
    /// Creates a builder over the built-in dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the built-in dataset with another base table.
    #[must_use]
    pub fn base_table(mut self, table: ReferenceTable) -> Self {
        self.base = Some(table);
        self
    }

    /// Merge records and columns from a tab-separated file.
    #[must_use]
    pub fn additional_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.additional.push(AdditionalData::Path(path.into()));
        self
    }

    /// Merge records and columns from an in-memory table.
    #[must_use]
    pub fn additional_data(mut self, table: ReferenceTable) -> Self {
        self.additional.push(AdditionalData::Table(table));
        self
    }

    /// Keep only United Nations member states.
    #[must_use]
    pub fn only_un_members(mut self, only: bool) -> Self {
        self.only_un_members = only;
        self
    }

    /// Verify at build time that every record's names match only its own pattern.
    #[must_use]
    pub fn check_consistency(mut self, check: bool) -> Self {
        self.check_consistency = check;
        self
    }

    /// Assembles the table and compiles the patterns.
    ///
    /// # Errors
    ///
    /// Fails if a table cannot be loaded, a pattern does not compile, or
    /// (with consistency checking on) a record's name is ambiguous.
    pub fn build(self) -> ConvertResult<CountryConverter> {
        let mut table = match self.base {
            Some(table) => table,
            None => ReferenceTable::builtin()?,
        };

        for extra in self.additional {
            let extra = match extra {
                AdditionalData::Path(path) => ReferenceTable::from_path(path)?,
                AdditionalData::Table(table) => table,
            };
            table = table.merge(&extra)?;
        }

        if self.only_un_members {
            table = table.filtered(|r| r.get("UNmember").is_some_and(|v| !v.is_null()));
        }

        let matcher = RegexMatcher::compile(&table)?;
        if self.check_consistency {
            matcher.check_consistency(&table)?;
        }
        let groups = Groups::compute(&table);

        debug!(
            rows = table.len(),
            columns = table.columns().len(),
            only_un_members = self.only_un_members,
            "country converter ready"
        );

        Ok(CountryConverter {
            table,
            matcher,
            groups,
        })
    }
}

/// Converts country identifiers between classification schemes.
#[derive(Debug, Clone)]
pub struct CountryConverter {
    table: ReferenceTable,
    matcher: RegexMatcher,
    groups: Groups,
}

impl CountryConverter {
    /// Converter over the built-in dataset.
    ///
    /// # Errors
    ///
    /// See [`ConverterBuilder::build`].
    pub fn new() -> ConvertResult<Self> {
        ConverterBuilder::new().build()
    }

    /// Starts configuring a converter.
    #[must_use]
    pub fn builder() -> ConverterBuilder {
        ConverterBuilder::new()
    }

    /// The assembled reference table.
    #[must_use]
    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    /// The compiled patterns.
    #[must_use]
    pub fn matcher(&self) -> &RegexMatcher {
        &self.matcher
    }

    /// Scheme names usable as `src` or `to`.
    #[must_use]
    pub fn valid_classes(&self) -> Vec<&str> {
        self.table
            .column_names()
            .filter(|c| *c != scheme::REGEX)
            .collect()
    }

    /// Resolves a scheme name to a table column.
    ///
    /// # Errors
    ///
    /// Returns `UnknownClassification` if the name matches no column.
    pub fn resolve_class(&self, name: &str) -> ConvertResult<String> {
        self.table
            .resolve_scheme(name)
            .ok_or_else(|| ConvertError::unknown_classification(name))
    }

    /// Starts a conversion of one or more names.
    ///
    /// # Example
    /// ```
    /// use country_converter::CountryConverter;
    ///
    /// let cc = CountryConverter::new()?;
    /// let iso3 = cc.convert("Namibia").run()?;
    /// assert_eq!(iso3.as_str(), Some("NAM"));
    /// # Ok::<(), country_converter::ConvertError>(())
    /// ```
    pub fn convert(&self, names: impl Into<Names>) -> ConvertBuilder<'_> {
        ConvertBuilder::new(self, names.into())
    }

    /// Maps every value of `class_a` to the ordered, distinct values of
    /// `class_b` found on the same records.
    ///
    /// With `replace_numeric`, non-null values of an integer `class_b`
    /// are replaced by the scheme name itself (so membership years become
    /// a membership label).
    ///
    /// # Errors
    ///
    /// Returns `UnknownClassification` for an unknown scheme.
    pub fn get_correspondance_dict(
        &self,
        class_a: &str,
        class_b: &str,
        replace_numeric: bool,
    ) -> ConvertResult<Correspondence> {
        let col_a = self.resolve_class(class_a)?;
        let col_b = self.resolve_class(class_b)?;
        let idx_a = self
            .table
            .column_index(&col_a)
            .ok_or_else(|| ConvertError::unknown_classification(class_a))?;
        let idx_b = self
            .table
            .column_index(&col_b)
            .ok_or_else(|| ConvertError::unknown_classification(class_b))?;
        let numeric_b = self.table.kind(&col_b) == Some(ColumnKind::Integer);

        let mut out = Correspondence::new();
        for row in self.table.rows() {
            let Some(key) = row[idx_a].to_key() else {
                continue;
            };
            let value = match &row[idx_b] {
                Value::Null => Value::Null,
                _ if replace_numeric && numeric_b => Value::Text(col_b.clone()),
                v => v.clone(),
            };
            let entry = out.entry(key).or_default();
            if !entry.contains(&value) {
                entry.push(value);
            }
        }
        Ok(out)
    }

    pub(crate) fn source_for(&self, src: Option<&str>, value: &str) -> ConvertResult<scheme::Source> {
        match src {
            Some(s) if s.trim().eq_ignore_ascii_case(scheme::REGEX) => Ok(scheme::Source::Regex),
            Some(s) => self.resolve_class(s).map(scheme::Source::Column),
            None => match scheme::detect_source(value) {
                scheme::Source::Regex => Ok(scheme::Source::Regex),
                // a detected code scheme the table lacks falls back to the patterns
                scheme::Source::Column(c) => Ok(self.table.resolve_scheme(&c).map_or_else(
                    || {
                        debug!(value, scheme = %c, "detected scheme not in table, matching as free text");
                        scheme::Source::Regex
                    },
                    scheme::Source::Column,
                )),
            },
        }
    }

    pub(crate) fn groups(&self) -> &Groups {
        &self.groups
    }
}
