//! Summary scalars and grouped aggregates over a filtered view.
//!
//! Aggregation is tolerant: a non-numeric or missing cell counts as zero in
//! sums and is skipped in means. Degenerate cases (no rows, no numeric
//! rates) resolve to sentinels rather than errors. Aggregates that depend on
//! an absent role are skipped: sums read 0, means are undefined and grouped
//! maps come back empty.

use crate::data::Cell;
use crate::filter::FilteredView;
use crate::schema::{Bindings, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sum of the numeric cells bound to `role`.
pub fn sum(view: &FilteredView<'_>, bindings: &Bindings, role: Role) -> f64 {
    let Some(col) = bindings.column(role) else {
        return 0.0;
    };
    let mut skipped = 0usize;
    let total = view
        .column_values(col)
        .fold(0.0, |acc, cell| match cell.as_number() {
            Some(v) => acc + v,
            None => {
                if !cell.is_missing() {
                    skipped += 1;
                }
                acc
            }
        });
    if skipped > 0 {
        tracing::warn!(%role, skipped, "non-numeric cells counted as zero");
    }
    total
}

pub fn count(view: &FilteredView<'_>) -> usize {
    view.len()
}

/// Arithmetic mean of the numeric cells bound to `role`; `None` when there
/// are none.
pub fn mean(view: &FilteredView<'_>, bindings: &Bindings, role: Role) -> Option<f64> {
    let col = bindings.column(role)?;
    let (total, n) = view
        .column_values(col)
        .filter_map(Cell::as_number)
        .fold((0.0, 0usize), |(t, n), v| (t + v, n + 1));
    (n > 0).then(|| total / n as f64)
}

/// Mean value per row, 0 when there are no rows.
pub fn ticket_average(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// Sum of `value` per distinct `key` cell in view. Rows with a blank key
/// belong to no group.
pub fn group_sum(
    view: &FilteredView<'_>,
    bindings: &Bindings,
    key: Role,
    value: Role,
) -> BTreeMap<Cell, f64> {
    let (Some(key_col), Some(value_col)) = (bindings.column(key), bindings.column(value)) else {
        return BTreeMap::new();
    };
    let mut groups = BTreeMap::new();
    for row in view.rows() {
        let (Some(k), Some(v)) = (row.get(key_col), row.get(value_col)) else {
            continue;
        };
        if k.is_missing() {
            continue;
        }
        *groups.entry(k.clone()).or_insert(0.0) += v.as_number().unwrap_or(0.0);
    }
    groups
}

/// Row count per distinct (`first`, `second`) pair in view. Pairs with no
/// rows are absent, so the keys need not form a contiguous axis; rows blank
/// in either key are not counted.
pub fn group_count(
    view: &FilteredView<'_>,
    bindings: &Bindings,
    first: Role,
    second: Role,
) -> BTreeMap<(Cell, Cell), usize> {
    let (Some(a), Some(b)) = (bindings.column(first), bindings.column(second)) else {
        return BTreeMap::new();
    };
    let mut groups = BTreeMap::new();
    for row in view.rows() {
        let (Some(x), Some(y)) = (row.get(a), row.get(b)) else {
            continue;
        };
        if x.is_missing() || y.is_missing() {
            continue;
        }
        *groups.entry((x.clone(), y.clone())).or_insert(0) += 1;
    }
    groups
}

/// Headline metrics for the KPI cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_credit: f64,
    pub count: usize,
    /// `None` when no row in view carries a numeric rate.
    pub mean_rate: Option<f64>,
    pub ticket_average: f64,
}

impl Summary {
    pub fn compute(view: &FilteredView<'_>, bindings: &Bindings) -> Self {
        let total_credit = sum(view, bindings, Role::CreditVolume);
        let count = count(view);
        Self {
            total_credit,
            count,
            mean_rate: mean(view, bindings, Role::Rate),
            ticket_average: ticket_average(total_credit, count),
        }
    }
}
