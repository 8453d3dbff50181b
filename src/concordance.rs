//! Aggregation concordances.
//!
//! Folds a list of original entities into aggregate labels by applying
//! an ordered list of rules. An entity takes the label of the first rule
//! that resolves it; entities no rule resolves are handled by the
//! missing policy. The result is an ordered map that can be rendered as
//! a two-column table or a dense indicator matrix.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use crate::converter::{Correspondence, CountryConverter};
use crate::error::ConvertResult;
use crate::scheme::{self, Source};
use crate::value::Value;

/// Default separator used to merge multiple labels.
pub const DEFAULT_MERGE_SEPARATOR: &str = "_&_";

/// The entities to aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Originals {
    /// Every distinct value of a classification scheme.
    Classification(String),
    /// An explicit list of identifiers.
    Entities(Vec<String>),
}

impl From<&str> for Originals {
    fn from(v: &str) -> Self {
        Self::Classification(v.to_string())
    }
}

impl From<String> for Originals {
    fn from(v: String) -> Self {
        Self::Classification(v)
    }
}

impl From<Vec<String>> for Originals {
    fn from(v: Vec<String>) -> Self {
        Self::Entities(v)
    }
}

impl From<Vec<&str>> for Originals {
    fn from(v: Vec<&str>) -> Self {
        Self::Entities(v.into_iter().map(ToString::to_string).collect())
    }
}

impl From<&[&str]> for Originals {
    fn from(v: &[&str]) -> Self {
        Self::Entities(v.iter().map(ToString::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Originals {
    fn from(v: [&str; N]) -> Self {
        Self::Entities(v.iter().map(ToString::to_string).collect())
    }
}

/// One aggregation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationRule {
    /// Membership in a scheme column; members get the column's label.
    Named(String),
    /// Explicit original → aggregate labels.
    Map(IndexMap<String, String>),
    /// Every remaining entity keeps its own identifier.
    Ungrouped,
}

impl AggregationRule {
    /// A named-group rule.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// An explicit mapping rule.
    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<&str> for AggregationRule {
    fn from(v: &str) -> Self {
        Self::Named(v.to_string())
    }
}

impl From<String> for AggregationRule {
    fn from(v: String) -> Self {
        Self::Named(v)
    }
}

impl From<IndexMap<String, String>> for AggregationRule {
    fn from(v: IndexMap<String, String>) -> Self {
        Self::Map(v)
    }
}

impl From<HashMap<String, String>> for AggregationRule {
    fn from(v: HashMap<String, String>) -> Self {
        Self::Map(v.into_iter().collect())
    }
}

/// Ordered list of rules. A bare rule is a one-element list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Rules(pub Vec<AggregationRule>);

impl From<AggregationRule> for Rules {
    fn from(v: AggregationRule) -> Self {
        Self(vec![v])
    }
}

impl From<&str> for Rules {
    fn from(v: &str) -> Self {
        Self(vec![AggregationRule::from(v)])
    }
}

impl From<String> for Rules {
    fn from(v: String) -> Self {
        Self(vec![AggregationRule::from(v)])
    }
}

impl From<IndexMap<String, String>> for Rules {
    fn from(v: IndexMap<String, String>) -> Self {
        Self(vec![AggregationRule::Map(v)])
    }
}

impl From<Vec<AggregationRule>> for Rules {
    fn from(v: Vec<AggregationRule>) -> Self {
        Self(v)
    }
}

impl From<Vec<&str>> for Rules {
    fn from(v: Vec<&str>) -> Self {
        Self(v.into_iter().map(AggregationRule::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Rules {
    fn from(v: [&str; N]) -> Self {
        Self(v.into_iter().map(AggregationRule::from).collect())
    }
}

/// What happens to entities no rule resolves.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MissingPolicy {
    /// Map the entity to itself.
    #[default]
    Keep,
    /// Map the entity to a fixed label.
    Replace(String),
    /// Leave the entity out of the result.
    Drop,
}

impl From<bool> for MissingPolicy {
    fn from(keep: bool) -> Self {
        if keep {
            Self::Keep
        } else {
            Self::Drop
        }
    }
}

impl From<&str> for MissingPolicy {
    fn from(v: &str) -> Self {
        Self::Replace(v.to_string())
    }
}

impl From<String> for MissingPolicy {
    fn from(v: String) -> Self {
        Self::Replace(v)
    }
}

/// Result shape of [`AggConcBuilder::run`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputShape {
    #[default]
    Map,
    Sparse,
    Full,
}

/// Ordered original → aggregate mapping.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Concordance(IndexMap<String, String>);

impl Concordance {
    /// Label of an original entity.
    #[must_use]
    pub fn get(&self, original: &str) -> Option<&str> {
        self.0.get(original).map(String::as_str)
    }

    /// Number of mapped entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing was mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates pairs in input order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The underlying map.
    #[must_use]
    pub fn as_map(&self) -> &IndexMap<String, String> {
        &self.0
    }

    /// Consumes into the underlying map.
    #[must_use]
    pub fn into_inner(self) -> IndexMap<String, String> {
        self.0
    }

    /// Two-column table, one row per entity.
    #[must_use]
    pub fn to_sparse(&self) -> SparseTable {
        SparseTable {
            columns: [SparseTable::ORIGINAL.to_string(), SparseTable::AGGREGATED.to_string()],
            rows: self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    /// Indicator matrix: rows are entities, columns distinct labels in
    /// first-seen order.
    #[must_use]
    pub fn to_matrix(&self) -> IndicatorMatrix {
        let mut columns: Vec<String> = Vec::new();
        for label in self.0.values() {
            if !columns.contains(label) {
                columns.push(label.clone());
            }
        }
        let data = self
            .0
            .values()
            .map(|label| {
                columns
                    .iter()
                    .map(|c| if c == label { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect();
        IndicatorMatrix {
            index_name: SparseTable::ORIGINAL.to_string(),
            columns_name: SparseTable::AGGREGATED.to_string(),
            index: self.0.keys().cloned().collect(),
            columns,
            data,
        }
    }
}

impl<'a> IntoIterator for &'a Concordance {
    type Item = (&'a String, &'a String);
    type IntoIter = indexmap::map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Long-form concordance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SparseTable {
    /// Always `["original", "aggregated"]`.
    pub columns: [String; 2],
    /// `(original, aggregated)` pairs in input order.
    pub rows: Vec<(String, String)>,
}

impl SparseTable {
    /// Name of the original-entity column and matrix axis.
    pub const ORIGINAL: &'static str = "original";
    /// Name of the aggregate column and matrix axis.
    pub const AGGREGATED: &'static str = "aggregated";
}

/// Dense 0/1 concordance matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorMatrix {
    /// Row axis name.
    pub index_name: String,
    /// Column axis name.
    pub columns_name: String,
    /// Row labels (original entities).
    pub index: Vec<String>,
    /// Column labels (aggregates).
    pub columns: Vec<String>,
    /// Row-major cells.
    pub data: Vec<Vec<f64>>,
}

impl IndicatorMatrix {
    /// `(rows, columns)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.index.len(), self.columns.len())
    }

    /// Cell by labels.
    #[must_use]
    pub fn get(&self, original: &str, aggregated: &str) -> Option<f64> {
        let r = self.index.iter().position(|i| i == original)?;
        let c = self.columns.iter().position(|i| i == aggregated)?;
        Some(self.data[r][c])
    }
}

/// Output of [`AggConcBuilder::run`].
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AggConcOutput {
    Map(Concordance),
    Sparse(SparseTable),
    Full(IndicatorMatrix),
}

impl AggConcOutput {
    #[allow(missing_docs)]
    #[must_use]
    pub const fn as_map(&self) -> Option<&Concordance> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn as_sparse(&self) -> Option<&SparseTable> {
        match self {
            Self::Sparse(s) => Some(s),
            _ => None,
        }
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn as_matrix(&self) -> Option<&IndicatorMatrix> {
        match self {
            Self::Full(m) => Some(m),
            _ => None,
        }
    }
}

type Callback<'c> = Box<dyn FnMut(&str) + 'c>;

/// Builder for an aggregation concordance.
///
/// # Example
/// ```
/// use country_converter::{AggregationRule, CountryConverter, MissingPolicy};
///
/// let cc = CountryConverter::new()?;
/// let conc = cc
///     .agg_conc(["TW", "XX", "AT", "US"], vec![
///         AggregationRule::named("EU"),
///         AggregationRule::named("OECD"),
///         AggregationRule::named("continent"),
///     ])
///     .first_match_only()
///     .missing("RoW")
///     .build()?;
/// assert_eq!(conc.get("AT"), Some("EU"));
/// assert_eq!(conc.get("US"), Some("OECD"));
/// assert_eq!(conc.get("TW"), Some("Asia"));
/// assert_eq!(conc.get("XX"), Some("RoW"));
/// # Ok::<(), country_converter::ConvertError>(())
/// ```
pub struct AggConcBuilder<'c> {
    converter: &'c CountryConverter,
    originals: Originals,
    rules: Rules,
    merge_multiple: Option<String>,
    missing: MissingPolicy,
    original_class: Option<String>,
    shape: OutputShape,
    on_missing: Option<Callback<'c>>,
    on_merge_multiple: Option<Callback<'c>>,
}

impl fmt::Debug for AggConcBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggConcBuilder")
            .field("originals", &self.originals)
            .field("rules", &self.rules)
            .field("merge_multiple", &self.merge_multiple)
            .field("missing", &self.missing)
            .field("original_class", &self.original_class)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

impl<'c> AggConcBuilder<'c> {
    pub(crate) fn new(converter: &'c CountryConverter, originals: Originals, rules: Rules) -> Self {
        Self {
            converter,
            originals,
            rules,
            merge_multiple: Some(DEFAULT_MERGE_SEPARATOR.to_string()),
            missing: MissingPolicy::default(),
            original_class: None,
            shape: OutputShape::default(),
            on_missing: None,
            on_merge_multiple: None,
        }
    }

    /// Join multiple labels from one lookup with `separator`.
    #[must_use]
    pub fn merge_multiple(mut self, separator: impl Into<String>) -> Self {
        self.merge_multiple = Some(separator.into());
        self
    }

    /// Leave entities with multiple labels unresolved by that rule.
    #[must_use]
    pub fn first_match_only(mut self) -> Self {
        self.merge_multiple = None;
        self
    }

    /// Policy for entities no rule resolves.
    #[must_use]
    pub fn missing(mut self, policy: impl Into<MissingPolicy>) -> Self {
        self.missing = policy.into();
        self
    }

    /// Scheme the original entities are expressed in.
    #[must_use]
    pub fn original_class(mut self, class: impl Into<String>) -> Self {
        self.original_class = Some(class.into());
        self
    }

    /// Output shape of [`AggConcBuilder::run`].
    #[must_use]
    pub fn shape(mut self, shape: OutputShape) -> Self {
        self.shape = shape;
        self
    }

    /// Called with every entity handled by the missing policy.
    #[must_use]
    pub fn on_missing(mut self, f: impl FnMut(&str) + 'c) -> Self {
        self.on_missing = Some(Box::new(f));
        self
    }

    /// Called with every entity whose lookup returned several labels.
    #[must_use]
    pub fn on_merge_multiple(mut self, f: impl FnMut(&str) + 'c) -> Self {
        self.on_merge_multiple = Some(Box::new(f));
        self
    }

    /// Builds the ordered mapping.
    ///
    /// # Errors
    ///
    /// Unknown classification names (originals, original class or named
    /// rules) are configuration errors.
    pub fn build(mut self) -> ConvertResult<Concordance> {
        let (entities, class_hint) = self.entities()?;
        let original_class = self.resolve_original_class(&entities, class_hint)?;

        let mut lookups: Vec<Option<Correspondence>> = Vec::with_capacity(self.rules.0.len());
        for rule in &self.rules.0 {
            lookups.push(match (rule, &original_class) {
                (AggregationRule::Named(name), Some(class)) => {
                    Some(self.converter.get_correspondance_dict(class, name, true)?)
                }
                _ => None,
            });
        }

        let mut labels: IndexMap<String, Option<String>> =
            entities.into_iter().map(|e| (e, None)).collect();

        for (rule, lookup) in self.rules.0.iter().zip(&lookups) {
            for (entity, label) in &mut labels {
                if label.is_some() {
                    continue;
                }
                *label = match rule {
                    AggregationRule::Named(_) => {
                        let Some(values) = lookup.as_ref().and_then(|l| l.get(entity)) else {
                            continue;
                        };
                        if values.len() == 1 {
                            values[0].to_key()
                        } else {
                            info!(entity = %entity, labels = values.len(), "entity maps to several labels");
                            if let Some(cb) = self.on_merge_multiple.as_mut() {
                                cb(entity);
                            }
                            self.merge_multiple.as_ref().and_then(|sep| {
                                let keys: Vec<String> =
                                    values.iter().filter_map(Value::to_key).collect();
                                (!keys.is_empty()).then(|| keys.join(sep))
                            })
                        }
                    }
                    AggregationRule::Map(map) => map.get(entity.as_str()).cloned(),
                    AggregationRule::Ungrouped => Some(entity.clone()),
                };
            }
        }

        let mut out = IndexMap::with_capacity(labels.len());
        for (entity, label) in labels {
            if let Some(label) = label {
                out.insert(entity, label);
                continue;
            }
            info!(entity = %entity, policy = ?self.missing, "entity not covered by any aggregation rule");
            if let Some(cb) = self.on_missing.as_mut() {
                cb(&entity);
            }
            match &self.missing {
                MissingPolicy::Keep => {
                    let label = entity.clone();
                    out.insert(entity, label);
                }
                MissingPolicy::Replace(label) => {
                    out.insert(entity, label.clone());
                }
                MissingPolicy::Drop => {}
            }
        }
        Ok(Concordance(out))
    }

    /// Builds the mapping and renders it in the configured shape.
    ///
    /// # Errors
    ///
    /// See [`AggConcBuilder::build`].
    pub fn run(self) -> ConvertResult<AggConcOutput> {
        let shape = self.shape;
        let conc = self.build()?;
        Ok(match shape {
            OutputShape::Map => AggConcOutput::Map(conc),
            OutputShape::Sparse => AggConcOutput::Sparse(conc.to_sparse()),
            OutputShape::Full => AggConcOutput::Full(conc.to_matrix()),
        })
    }

    /// Distinct entities in input order, plus the scheme they came from.
    fn entities(&self) -> ConvertResult<(Vec<String>, Option<String>)> {
        match &self.originals {
            Originals::Classification(name) => {
                let class = self.converter.resolve_class(name)?;
                let keys = self
                    .converter
                    .table()
                    .column(&class)
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(Value::to_key);
                Ok((dedup(keys), Some(class)))
            }
            Originals::Entities(list) => Ok((dedup(list.iter().cloned()), None)),
        }
    }

    /// Scheme used for named rules; only needed when one is present.
    fn resolve_original_class(
        &self,
        entities: &[String],
        hint: Option<String>,
    ) -> ConvertResult<Option<String>> {
        let needs_class = self
            .rules
            .0
            .iter()
            .any(|r| matches!(r, AggregationRule::Named(_)));
        if !needs_class {
            return Ok(None);
        }
        if let Some(class) = &self.original_class {
            return self.converter.resolve_class(class).map(Some);
        }
        if hint.is_some() {
            return Ok(hint);
        }
        let Some(first) = entities.first() else {
            return Ok(None);
        };
        let class = match scheme::detect_source(first) {
            Source::Column(c) => c,
            Source::Regex => scheme::NAME_SHORT.to_string(),
        };
        self.converter.resolve_class(&class).map(Some)
    }
}

fn dedup(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = indexmap::IndexSet::new();
    for item in items {
        seen.insert(item);
    }
    seen.into_iter().collect()
}

impl CountryConverter {
    /// Starts an aggregation concordance over this converter's table.
    pub fn agg_conc(
        &self,
        originals: impl Into<Originals>,
        aggregates: impl Into<Rules>,
    ) -> AggConcBuilder<'_> {
        AggConcBuilder::new(self, originals.into(), aggregates.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableBuilder;

    fn converter() -> CountryConverter {
        let table = TableBuilder::new(["name_short", "regex", "ISO2", "region", "OECD"])
            .row(["Austria", "austria", "AT", "Europe", "1961"])
            .row(["Japan", "japan", "JP", "Asia", "1964"])
            .row(["Taiwan", "taiwan", "TW", "Asia", ""])
            .row(["Anywhere", "anywhere", "AY", "", ""])
            .build()
            .unwrap();
        CountryConverter::builder().base_table(table).build().unwrap()
    }

    fn custom_rules() -> Rules {
        AggregationRule::map([("c1", "r1"), ("c2", "r1"), ("c3", "r2")]).into()
    }

    #[test]
    fn test_explicit_map_keep_missing() {
        let cc = converter();
        let conc = cc
            .agg_conc(["c1", "c2", "c3", "c4"], custom_rules())
            .missing(true)
            .build()
            .unwrap();
        let pairs: Vec<(&str, &str)> = conc.iter().collect();
        assert_eq!(pairs, vec![("c1", "r1"), ("c2", "r1"), ("c3", "r2"), ("c4", "c4")]);
    }

    #[test]
    fn test_explicit_map_replace_missing() {
        let cc = converter();
        let conc = cc
            .agg_conc(["c1", "c2", "c3", "c4"], custom_rules())
            .missing("RoW")
            .build()
            .unwrap();
        assert_eq!(conc.get("c4"), Some("RoW"));
        assert_eq!(conc.len(), 4);
    }

    #[test]
    fn test_sparse_and_full_shapes() {
        let cc = converter();
        let sparse = cc
            .agg_conc(["c1", "c2", "c3", "c4"], custom_rules())
            .missing(false)
            .shape(OutputShape::Sparse)
            .run()
            .unwrap();
        let sparse = sparse.as_sparse().unwrap();
        assert_eq!(sparse.columns, ["original".to_string(), "aggregated".to_string()]);
        assert_eq!(sparse.rows.len(), 3);
        assert_eq!(sparse.rows[2], ("c3".to_string(), "r2".to_string()));

        let full = cc
            .agg_conc(["c1", "c2", "c3", "c4"], custom_rules())
            .missing(false)
            .shape(OutputShape::Full)
            .run()
            .unwrap();
        let m = full.as_matrix().unwrap();
        assert_eq!(m.index, vec!["c1", "c2", "c3"]);
        assert_eq!(m.columns, vec!["r1", "r2"]);
        assert_eq!(m.data, vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert_eq!(m.index_name, "original");
        assert_eq!(m.columns_name, "aggregated");
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m.get("c2", "r1"), Some(1.0));
    }

    #[test]
    fn test_named_rules_first_wins() {
        let cc = converter();
        let conc = cc
            .agg_conc(["TW", "AT", "JP", "ZZ"], ["OECD", "region"])
            .missing("RoW")
            .build()
            .unwrap();
        assert_eq!(conc.get("TW"), Some("Asia"));
        assert_eq!(conc.get("AT"), Some("OECD"));
        assert_eq!(conc.get("JP"), Some("OECD"));
        assert_eq!(conc.get("ZZ"), Some("RoW"));
    }

    #[test]
    fn test_classification_originals_and_merge() {
        let cc = converter();
        let merged = cc.agg_conc("region", "OECD").missing("none").build().unwrap();
        // Asia holds an OECD member and a non-member
        assert_eq!(merged.get("Asia"), Some("OECD"));
        assert_eq!(merged.get("Europe"), Some("OECD"));
        assert_eq!(merged.len(), 2);

        let mut multiple = Vec::new();
        let first_only = cc
            .agg_conc("region", "OECD")
            .first_match_only()
            .missing("none")
            .on_merge_multiple(|e| multiple.push(e.to_string()))
            .build()
            .unwrap();
        assert_eq!(first_only.get("Asia"), Some("none"));
        assert_eq!(multiple, vec!["Asia"]);
    }

    #[test]
    fn test_missing_callback_and_drop() {
        let cc = converter();
        let mut missing = Vec::new();
        let conc = cc
            .agg_conc(["AT", "TW", "TW"], "OECD")
            .missing(false)
            .on_missing(|e| missing.push(e.to_string()))
            .build()
            .unwrap();
        assert_eq!(conc.len(), 1);
        assert_eq!(missing, vec!["TW"]);
    }

    #[test]
    fn test_ungrouped_rule_keeps_identity() {
        let cc = converter();
        let conc = cc
            .agg_conc(
                ["AT", "TW"],
                vec![AggregationRule::named("OECD"), AggregationRule::Ungrouped],
            )
            .missing("RoW")
            .build()
            .unwrap();
        assert_eq!(conc.get("TW"), Some("TW"));
    }

    #[test]
    fn test_original_class_override() {
        let cc = converter();
        let conc = cc
            .agg_conc(["Japan", "Taiwan"], "OECD")
            .original_class("name_short")
            .missing(true)
            .build()
            .unwrap();
        assert_eq!(conc.get("Japan"), Some("OECD"));
        assert_eq!(conc.get("Taiwan"), Some("Taiwan"));
    }

    #[test]
    fn test_unknown_rule_is_error() {
        let cc = converter();
        let err = cc.agg_conc(["AT"], "nope").build().unwrap_err();
        assert!(err.is_unknown_classification());
    }
}
