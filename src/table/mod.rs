//! The in-memory reference table.
//!
//! One row per known entity, one typed column per classification scheme
//! plus the `regex` column. The table is built once, optionally merged
//! with caller-supplied data, and never mutated afterwards.

mod loader;

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::error::{ConvertResult, TableError};
use crate::scheme::{self, ColumnKind};
use crate::value::Value;

pub use loader::TableBuilder;

/// Columns every table must carry.
pub const REQUIRED_COLUMNS: &[&str] = &[scheme::NAME_SHORT, scheme::REGEX];

pub(crate) fn normalize_key(s: &str) -> String {
    s.trim().to_ascii_lowercase()
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    name: String,
    kind: ColumnKind,
}

impl Column {
    fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = ColumnKind::for_column(&name);
        Self { name, kind }
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage type of the column.
    #[must_use]
    pub const fn kind(&self) -> ColumnKind {
        self.kind
    }
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    table: &'a ReferenceTable,
    row: usize,
}

impl<'a> Record<'a> {
    /// Position of the row in the table.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.row
    }

    /// Value of the named scheme, `None` if the table has no such column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.table.get(self.row, column)
    }

    /// The record's short name, empty if missing.
    #[must_use]
    pub fn name_short(&self) -> &'a str {
        self.get(scheme::NAME_SHORT)
            .and_then(Value::as_text)
            .unwrap_or_default()
    }
}

/// Ordered, immutable table of entity records.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl ReferenceTable {
    /// Builds a table from column names and typed rows.
    ///
    /// # Errors
    ///
    /// Fails on duplicate or missing required columns and on rows whose
    /// length differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> ConvertResult<Self> {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(TableError::DuplicateColumn {
                    column: name.clone(),
                }
                .into());
            }
        }
        for required in REQUIRED_COLUMNS {
            if !index.contains_key(*required) {
                return Err(TableError::MissingColumn {
                    column: (*required).to_string(),
                }
                .into());
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::RowLength {
                    row: i,
                    expected: columns.len(),
                    actual: row.len(),
                }
                .into());
            }
        }

        Ok(Self {
            columns: columns.into_iter().map(Column::new).collect(),
            index,
            rows,
        })
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All columns in table order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in table order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> + Clone {
        self.columns.iter().map(Column::name)
    }

    /// Position of the named column.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Storage type of the named column.
    #[must_use]
    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.column_index(name).map(|i| self.columns[i].kind)
    }

    /// Resolves a caller-facing scheme name (aliases, any case) to a column.
    #[must_use]
    pub fn resolve_scheme(&self, name: &str) -> Option<String> {
        scheme::resolve_name(name, self.column_names())
    }

    /// Raw row storage.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Borrowed view of a row.
    #[must_use]
    pub fn record(&self, row: usize) -> Option<Record<'_>> {
        (row < self.rows.len()).then_some(Record { table: self, row })
    }

    /// Iterates all rows as records.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        (0..self.rows.len()).map(move |row| Record { table: self, row })
    }

    /// Cell by row and column name.
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[col])
    }

    /// Cell by row and column position.
    #[must_use]
    pub fn value(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// All values of a column in row order.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let col = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[col]).collect())
    }

    /// Rows whose value in `column` equals `query`.
    ///
    /// Text columns compare trimmed and ASCII case-insensitive. Integer
    /// columns compare numerically; a non-numeric query matches nothing.
    #[must_use]
    pub fn find_exact(&self, column: usize, query: &str) -> Vec<usize> {
        match self.columns[column].kind {
            ColumnKind::Integer => {
                let Ok(wanted) = query.trim().parse::<i64>() else {
                    return Vec::new();
                };
                self.rows
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r[column].as_int() == Some(wanted))
                    .map(|(i, _)| i)
                    .collect()
            }
            ColumnKind::Text => {
                let wanted = normalize_key(query);
                self.rows
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| {
                        r[column]
                            .as_text()
                            .is_some_and(|v| normalize_key(v) == wanted)
                    })
                    .map(|(i, _)| i)
                    .collect()
            }
        }
    }

    /// Returns a copy holding only the records the predicate keeps.
    #[must_use]
    pub fn filtered<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(Record<'_>) -> bool,
    {
        let rows = self
            .records()
            .filter(|r| keep(*r))
            .map(|r| self.rows[r.row].clone())
            .collect();
        Self {
            columns: self.columns.clone(),
            index: self.index.clone(),
            rows,
        }
    }

    /// Merges additional data into this table.
    ///
    /// Columns are the union, base columns first. A record of
    /// `additional` replaces any record with the same `name_short`; the
    /// replacement is appended after the remaining rows. Cells absent from
    /// either side are null.
    ///
    /// # Errors
    ///
    /// Propagates table construction failures.
    pub fn merge(&self, additional: &Self) -> ConvertResult<Self> {
        let mut names: Vec<String> = self.column_names().map(ToString::to_string).collect();
        for name in additional.column_names() {
            if self.column_index(name).is_none() {
                names.push(name.to_string());
            }
        }

        let widen = |table: &Self, row: &[Value]| -> Vec<Value> {
            names
                .iter()
                .map(|name| {
                    table
                        .column_index(name)
                        .map_or(Value::Null, |i| row[i].clone())
                })
                .collect()
        };

        let key_col = names
            .iter()
            .position(|n| n == scheme::NAME_SHORT)
            .unwrap_or_default();
        let mut rows: Vec<Vec<Value>> = self.rows.iter().map(|r| widen(self, r)).collect();
        let mut replaced = 0usize;
        for extra in &additional.rows {
            let row = widen(additional, extra);
            let key = row[key_col].as_text().map(normalize_key);
            if let Some(key) = key {
                let before = rows.len();
                rows.retain(|r| r[key_col].as_text().map(normalize_key).as_ref() != Some(&key));
                replaced += before - rows.len();
            }
            rows.push(row);
        }

        debug!(
            base_rows = self.len(),
            additional_rows = additional.len(),
            replaced,
            columns = names.len(),
            "merged additional reference data"
        );

        Self::new(names, rows)
    }
}
