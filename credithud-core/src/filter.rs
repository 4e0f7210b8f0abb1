//! Filter engine: value domains and conjunctive membership filtering.
//!
//! A `Selection` maps roles to accepted cell sets. A row passes when, for
//! every selected role that is bound to a column, its cell is in the set.
//! Selecting on an absent role is a no-op. An empty set excludes every row.

use crate::data::{Cell, Table};
use crate::schema::{Bindings, Role};
use std::collections::{BTreeMap, BTreeSet};

/// Accepted values per filter role.
pub type Selection = BTreeMap<Role, BTreeSet<Cell>>;

/// Sorted distinct values of the column bound to `role`; empty if absent.
pub fn domain(table: &Table, bindings: &Bindings, role: Role) -> Vec<Cell> {
    match bindings.column(role) {
        Some(col) => table
            .column_values(col)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
        None => Vec::new(),
    }
}

/// Rows of `table` passing every bound role in `selection`.
pub fn apply<'a>(table: &'a Table, bindings: &Bindings, selection: &Selection) -> FilteredView<'a> {
    let predicates: Vec<(usize, &BTreeSet<Cell>)> = selection
        .iter()
        .filter_map(|(role, accepted)| bindings.column(*role).map(|col| (col, accepted)))
        .collect();

    let rows = table
        .rows()
        .enumerate()
        .filter(|(_, row)| {
            predicates
                .iter()
                .all(|(col, accepted)| row.get(*col).is_some_and(|cell| accepted.contains(cell)))
        })
        .map(|(i, _)| i)
        .collect();

    FilteredView { table, rows }
}

/// A row subset of a borrowed table.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    table: &'a Table,
    rows: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// View over every row.
    pub fn all(table: &'a Table) -> Self {
        Self {
            table,
            rows: (0..table.row_count()).collect(),
        }
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Source-table ordinals of the rows in view, ascending.
    pub fn row_indices(&self) -> &[usize] {
        &self.rows
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [Cell]> + '_ {
        let table = self.table;
        self.rows.iter().filter_map(move |&i| table.row(i))
    }

    /// Cells of one column for the rows in view.
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &'a Cell> + '_ {
        self.rows().filter_map(move |row| row.get(column))
    }
}

/// Filter engine bound to one loaded table.
#[derive(Debug, Clone)]
pub struct FilterEngine<'a> {
    table: &'a Table,
    bindings: &'a Bindings,
    filter_roles: Vec<Role>,
}

impl<'a> FilterEngine<'a> {
    pub fn new(table: &'a Table, bindings: &'a Bindings, filter_roles: &[Role]) -> Self {
        Self {
            table,
            bindings,
            filter_roles: filter_roles.to_vec(),
        }
    }

    /// Roles that carry a widget: configured filter roles bound to a column.
    pub fn active_roles(&self) -> Vec<Role> {
        self.filter_roles
            .iter()
            .copied()
            .filter(|r| self.bindings.is_resolved(*r))
            .collect()
    }

    pub fn domain(&self, role: Role) -> Vec<Cell> {
        domain(self.table, self.bindings, role)
    }

    /// Initial selection: every active filter role mapped to its full domain.
    pub fn full_selection(&self) -> Selection {
        self.active_roles()
            .into_iter()
            .map(|role| (role, self.domain(role).into_iter().collect()))
            .collect()
    }

    pub fn apply(&self, selection: &Selection) -> FilteredView<'a> {
        apply(self.table, self.bindings, selection)
    }
}
