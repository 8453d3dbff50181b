//! Reading reference tables from tab-separated text.
//!
//! The built-in dataset is compiled into the library. Additional data
//! uses the same format: a header row of scheme names, one record per
//! line, empty cells for missing values.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use super::ReferenceTable;
use crate::error::{ConvertResult, TableError};
use crate::scheme::ColumnKind;
use crate::value::Value;

static BUILTIN_DATA: &str = include_str!("../../data/country_data.tsv");

/// Parses one raw cell according to its column kind.
fn parse_cell(column: &str, raw: &str) -> Result<Value, TableError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    match ColumnKind::for_column(column) {
        ColumnKind::Text => Ok(Value::Text(trimmed.to_string())),
        ColumnKind::Integer => parse_integer(trimmed).map(Value::Int).ok_or_else(|| {
            TableError::InvalidInteger {
                column: column.to_string(),
                value: trimmed.to_string(),
            }
        }),
    }
}

/// Accepts plain integers and whole floats such as `1961.0`.
fn parse_integer(raw: &str) -> Option<i64> {
    if let Ok(v) = raw.parse::<i64>() {
        return Some(v);
    }
    let (whole, frac) = raw.split_once('.')?;
    if frac.chars().all(|c| c == '0') {
        whole.parse::<i64>().ok()
    } else {
        None
    }
}

fn typed_rows<I, R, S>(columns: &[String], rows: I) -> ConvertResult<Vec<Vec<Value>>>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = Vec::new();
    for (i, row) in rows.into_iter().enumerate() {
        let raw: Vec<S> = row.into_iter().collect();
        if raw.len() > columns.len() {
            return Err(TableError::RowLength {
                row: i,
                expected: columns.len(),
                actual: raw.len(),
            }
            .into());
        }
        let mut typed = Vec::with_capacity(columns.len());
        for (column, cell) in columns.iter().zip(raw.iter()) {
            typed.push(parse_cell(column, cell.as_ref())?);
        }
        // trailing empty cells are often dropped by editors
        typed.resize(columns.len(), Value::Null);
        out.push(typed);
    }
    Ok(out)
}

impl ReferenceTable {
    /// The dataset shipped with the library.
    ///
    /// # Errors
    ///
    /// Only fails if the embedded data is corrupt.
    pub fn builtin() -> ConvertResult<Self> {
        Self::from_tsv_str(BUILTIN_DATA)
    }

    /// Parses tab-separated data from a string.
    ///
    /// # Errors
    ///
    /// Fails on malformed rows, non-integer values in integer columns and
    /// missing required columns.
    pub fn from_tsv_str(data: &str) -> ConvertResult<Self> {
        Self::from_reader(data.as_bytes())
    }

    /// Parses tab-separated data from any reader.
    ///
    /// # Errors
    ///
    /// See [`ReferenceTable::from_tsv_str`].
    pub fn from_reader<R: Read>(reader: R) -> ConvertResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .quoting(false)
            .flexible(true)
            .has_headers(true)
            .from_reader(reader);

        let columns: Vec<String> = rdr
            .headers()
            .map_err(TableError::from)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut raw = Vec::new();
        for record in rdr.records() {
            let record = record.map_err(TableError::from)?;
            if record.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            raw.push(record.iter().map(ToString::to_string).collect::<Vec<_>>());
        }

        let rows = typed_rows(&columns, raw)?;
        Self::new(columns, rows)
    }

    /// Reads a tab-separated file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> ConvertResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_reader(file)?;
        debug!(path = %path.display(), rows = table.len(), "loaded reference table");
        Ok(table)
    }
}

/// Builds a reference table in code.
///
/// Cells are given as text and typed by column, exactly as when the
/// table is read from a file.
///
/// # Example
/// ```
/// use country_converter::TableBuilder;
///
/// let table = TableBuilder::new(["name_short", "name_official", "regex", "ISO3"])
///     .row(["xxx country", "longer xxx country name", "xxx country", "XXX"])
///     .build()
///     .unwrap();
/// assert_eq!(table.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableBuilder {
    /// Creates a builder with the given header.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a record. Empty strings are missing values.
    #[must_use]
    pub fn row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    /// Types the cells and validates the table.
    ///
    /// # Errors
    ///
    /// Same failure modes as reading a file.
    pub fn build(self) -> ConvertResult<ReferenceTable> {
        let rows = typed_rows(&self.columns, self.rows)?;
        ReferenceTable::new(self.columns, rows)
    }
}
