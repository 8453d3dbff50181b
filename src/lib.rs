//! # country-converter
//!
//! Converts country names and codes between classification schemes:
//! ISO 3166 alpha-2/alpha-3/numeric codes, UN codes, short and official
//! names, continents, UN regions, the EXIOBASE and WIOD regions, and
//! OECD/EU/UN membership.
//!
//! ## Core Concepts
//!
//! - **ReferenceTable**: one record per country, one typed column per scheme plus a `regex` column
//! - **RegexMatcher**: resolves free-text names through the per-record patterns
//! - **CountryConverter**: routes lookups from a source scheme to a target scheme
//! - **agg_conc**: folds countries into aggregate regions under ordered rules
//!
//! ## Usage
//!
//! ```
//! use country_converter::CountryConverter;
//!
//! let cc = CountryConverter::new()?;
//!
//! // free text to ISO3 (the default target)
//! assert_eq!(cc.convert("Republic of Austria").run()?.as_str(), Some("AUT"));
//!
//! // codes are detected from their shape
//! assert_eq!(cc.convert("NA").run()?.as_str(), Some("NAM"));
//! assert_eq!(cc.convert("NAM").to("ISO2").run()?.as_str(), Some("NA"));
//!
//! // batches keep their order; misses get a placeholder
//! let names = cc.convert(["Germany", "Atlantis"]).to("continent").run()?.into_vec();
//! assert_eq!(names[0].as_str(), Some("Europe"));
//! assert!(names[1].is_not_found());
//! # Ok::<(), country_converter::ConvertError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod concordance;
pub mod converter;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod name_match;
pub mod scheme;
pub mod table;
pub mod value;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

// Re-export primary types at crate root for convenience
pub use concordance::{
    AggConcBuilder, AggConcOutput, AggregationRule, Concordance, IndicatorMatrix, MissingPolicy,
    Originals, OutputShape, Rules, SparseTable,
};
pub use converter::{
    ConvertBuilder, Converted, ConverterBuilder, Correspondence, CountryConverter, Group, Names,
    NotFound, Output, Projection,
};
pub use error::{ConfigurationError, ConvertError, ConvertResult, LookupError, TableError};
pub use logging::{init_logging, LoggingConfig};
pub use matcher::{MatchOutcome, RegexMatcher};
pub use name_match::MATCH_NOT_FOUND;
pub use table::{ReferenceTable, TableBuilder};
pub use value::Value;

static DEFAULT_CONVERTER: OnceCell<CountryConverter> = OnceCell::new();

/// Shared converter over the built-in dataset, built on first use.
///
/// # Errors
///
/// Only fails if the embedded dataset is corrupt.
pub fn default_converter() -> ConvertResult<&'static CountryConverter> {
    DEFAULT_CONVERTER.get_or_try_init(CountryConverter::new)
}

/// Converts with the shared converter.
///
/// ```
/// let us = country_converter::convert("usa")?.src("regex").to("ISO2").run()?;
/// assert_eq!(us.as_str(), Some("US"));
/// # Ok::<(), country_converter::ConvertError>(())
/// ```
///
/// # Errors
///
/// See [`default_converter`].
pub fn convert(names: impl Into<Names>) -> ConvertResult<ConvertBuilder<'static>> {
    Ok(default_converter()?.convert(names))
}

/// Aggregation concordance over the shared converter.
///
/// # Errors
///
/// See [`default_converter`].
pub fn agg_conc(
    originals: impl Into<Originals>,
    aggregates: impl Into<Rules>,
) -> ConvertResult<AggConcBuilder<'static>> {
    Ok(default_converter()?.agg_conc(originals, aggregates))
}

/// Correspondence between two schemes of the shared converter.
///
/// # Errors
///
/// Unknown schemes, see [`CountryConverter::get_correspondance_dict`].
pub fn get_correspondance_dict(
    class_a: &str,
    class_b: &str,
    replace_numeric: bool,
) -> ConvertResult<Correspondence> {
    default_converter()?.get_correspondance_dict(class_a, class_b, replace_numeric)
}

/// Matches two name lists with the shared converter.
///
/// # Errors
///
/// See [`default_converter`].
pub fn match_names(
    list_a: impl Into<Names>,
    list_b: impl Into<Names>,
) -> ConvertResult<IndexMap<String, String>> {
    Ok(default_converter()?.match_names(list_a, list_b))
}
