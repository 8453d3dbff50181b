//! Standard country groupings.
//!
//! Membership columns hold join years. EU28 is every member that joined
//! before 2015, EU27 the members before Croatia's 2013 accession; OECD
//! and UN are any non-null year.

use serde::Serialize;

use super::CountryConverter;
use crate::error::ConvertResult;
use crate::scheme;
use crate::table::{Record, ReferenceTable};
use crate::value::Value;

/// A membership grouping.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Eu28,
    Eu27,
    Oecd,
    Un,
}

impl Group {
    /// Every group, in display order.
    pub const ALL: [Self; 4] = [Self::Eu28, Self::Eu27, Self::Oecd, Self::Un];

    fn includes(self, record: Record<'_>) -> bool {
        let year = |column: &str| record.get(column).and_then(Value::as_int);
        match self {
            Self::Eu28 => year("EU").is_some_and(|y| y < 2015),
            Self::Eu27 => year("EU").is_some_and(|y| y < 2013),
            Self::Oecd => year("OECD").is_some(),
            Self::Un => year("UNmember").is_some(),
        }
    }

    const fn slot(self) -> usize {
        match self {
            Self::Eu28 => 0,
            Self::Eu27 => 1,
            Self::Oecd => 2,
            Self::Un => 3,
        }
    }
}

/// Selected columns for the members of a group, in table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Projection {
    /// Column names.
    pub columns: Vec<String>,
    /// One row per member.
    pub rows: Vec<Vec<Value>>,
}

impl Projection {
    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one projected column.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Returns true if any projected cell equals `value`.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.rows.iter().any(|r| r.contains(value))
    }
}

/// Member rows per group plus their cached short-name views.
#[derive(Debug, Clone)]
pub(crate) struct Groups {
    members: [Vec<usize>; 4],
    names: [Projection; 4],
}

impl Groups {
    pub(crate) fn compute(table: &ReferenceTable) -> Self {
        let members = Group::ALL.map(|g| {
            table
                .records()
                .filter(|r| g.includes(*r))
                .map(|r| r.index())
                .collect::<Vec<_>>()
        });
        let names = Group::ALL.map(|g| project(table, &members[g.slot()], &[scheme::NAME_SHORT]));
        Self { members, names }
    }
}

fn project(table: &ReferenceTable, rows: &[usize], columns: &[&str]) -> Projection {
    Projection {
        columns: columns.iter().map(ToString::to_string).collect(),
        rows: rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| table.get(*row, c).cloned().unwrap_or_default())
                    .collect()
            })
            .collect(),
    }
}

impl CountryConverter {
    /// Row indices of a group's members.
    #[must_use]
    pub fn group_members(&self, group: Group) -> &[usize] {
        &self.groups().members[group.slot()]
    }

    /// Short names of a group's members.
    #[must_use]
    pub fn group(&self, group: Group) -> &Projection {
        &self.groups().names[group.slot()]
    }

    /// A group's members expressed in other schemes.
    ///
    /// # Errors
    ///
    /// Returns `UnknownClassification` for an unknown scheme.
    pub fn group_as(&self, group: Group, to: &[&str]) -> ConvertResult<Projection> {
        let columns = to
            .iter()
            .map(|t| self.resolve_class(t))
            .collect::<ConvertResult<Vec<_>>>()?;
        let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
        Ok(project(self.table(), self.group_members(group), &columns))
    }

    /// EU members as of 2015, by short name.
    #[must_use]
    pub fn eu28(&self) -> &Projection {
        self.group(Group::Eu28)
    }

    /// EU members before the 2013 enlargement, by short name.
    #[must_use]
    pub fn eu27(&self) -> &Projection {
        self.group(Group::Eu27)
    }

    /// OECD members, by short name.
    #[must_use]
    pub fn oecd(&self) -> &Projection {
        self.group(Group::Oecd)
    }

    /// UN member states, by short name.
    #[must_use]
    pub fn un(&self) -> &Projection {
        self.group(Group::Un)
    }

    /// EU28 in other schemes.
    ///
    /// # Errors
    ///
    /// Returns `UnknownClassification` for an unknown scheme.
    pub fn eu28_as(&self, to: &[&str]) -> ConvertResult<Projection> {
        self.group_as(Group::Eu28, to)
    }

    /// EU27 in other schemes.
    ///
    /// # Errors
    ///
    /// Returns `UnknownClassification` for an unknown scheme.
    pub fn eu27_as(&self, to: &[&str]) -> ConvertResult<Projection> {
        self.group_as(Group::Eu27, to)
    }

    /// OECD in other schemes.
    ///
    /// # Errors
    ///
    /// Returns `UnknownClassification` for an unknown scheme.
    pub fn oecd_as(&self, to: &[&str]) -> ConvertResult<Projection> {
        self.group_as(Group::Oecd, to)
    }

    /// UN members in other schemes.
    ///
    /// # Errors
    ///
    /// Returns `UnknownClassification` for an unknown scheme.
    pub fn un_as(&self, to: &[&str]) -> ConvertResult<Projection> {
        self.group_as(Group::Un, to)
    }
}
