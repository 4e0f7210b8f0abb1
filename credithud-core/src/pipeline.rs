//! Fetch → normalize → resolve, and the per-session dashboard built on top.
//!
//! `load` runs the fatal stages and returns a `LoadedTable` or a single
//! `PipelineError`. A `Dashboard` owns one loaded table plus the user's
//! selection; every `snapshot` re-runs the filter engine and aggregator
//! against the immutable table.

use crate::aggregate::{self, Summary};
use crate::data::{Cell, SourceCache, SourceFetcher, Table};
use crate::error::PipelineError;
use crate::filter::{FilterEngine, FilteredView, Selection};
use crate::schema::{self, Bindings, Resolution, Role, RoleConfig};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A normalized table with its role bindings.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub location: String,
    pub table: Table,
    pub bindings: Bindings,
    pub fingerprint: String,
    pub loaded_at: DateTime<Utc>,
}

/// Fetch, normalize and resolve in one go.
pub fn load(
    fetcher: &dyn SourceFetcher,
    location: &str,
    roles: &RoleConfig,
) -> Result<LoadedTable, PipelineError> {
    let raw = fetcher.fetch(location)?;
    prepare(location, &raw, roles)
}

/// As `load`, but the fetch goes through a TTL cache.
pub fn load_cached(
    cache: &mut SourceCache,
    fetcher: &dyn SourceFetcher,
    location: &str,
    roles: &RoleConfig,
) -> Result<LoadedTable, PipelineError> {
    let raw = cache.get_or_fetch(fetcher, location)?;
    prepare(location, &raw, roles)
}

/// Normalize and resolve an already fetched table.
pub fn prepare(
    location: &str,
    raw: &Table,
    roles: &RoleConfig,
) -> Result<LoadedTable, PipelineError> {
    let table = schema::normalize(raw);
    let bindings = schema::resolve(&table, roles)?;
    let fingerprint = table.fingerprint();
    Ok(LoadedTable {
        location: location.to_string(),
        table,
        bindings,
        fingerprint,
        loaded_at: Utc::now(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleBinding {
    pub role: Role,
    #[serde(flatten)]
    pub resolution: Resolution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleDomain {
    pub role: Role,
    pub values: Vec<Cell>,
    pub selected: Vec<Cell>,
}

/// One bar of the plan-type chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanBar {
    pub plan: Cell,
    pub credit: f64,
}

/// One point of the year/month line chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    pub year: Cell,
    pub month: Cell,
    pub count: usize,
}

/// Everything the presentation layer draws for one render cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub location: String,
    pub fingerprint: String,
    pub loaded_at: DateTime<Utc>,
    pub columns: Vec<String>,
    pub bindings: Vec<RoleBinding>,
    pub filters: Vec<RoleDomain>,
    pub total_rows: usize,
    pub summary: Summary,
    pub plan_distribution: Vec<PlanBar>,
    pub monthly_counts: Vec<MonthlyPoint>,
}

/// One user session: a loaded table and a mutable selection.
#[derive(Debug, Clone)]
pub struct Dashboard {
    loaded: LoadedTable,
    filter_roles: Vec<Role>,
    selection: Selection,
}

impl Dashboard {
    /// Start a session with every filter role selecting its full domain.
    pub fn new(loaded: LoadedTable, filter_roles: &[Role]) -> Self {
        let selection =
            FilterEngine::new(&loaded.table, &loaded.bindings, filter_roles).full_selection();
        Self {
            loaded,
            filter_roles: filter_roles.to_vec(),
            selection,
        }
    }

    pub fn loaded(&self) -> &LoadedTable {
        &self.loaded
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    fn engine(&self) -> FilterEngine<'_> {
        FilterEngine::new(&self.loaded.table, &self.loaded.bindings, &self.filter_roles)
    }

    /// Filter roles that are bound to a column.
    pub fn active_filters(&self) -> Vec<Role> {
        self.engine().active_roles()
    }

    pub fn domain(&self, role: Role) -> Vec<Cell> {
        self.engine().domain(role)
    }

    /// Replace the accepted values for `role`.
    pub fn select(&mut self, role: Role, values: impl IntoIterator<Item = Cell>) {
        self.selection.insert(role, values.into_iter().collect());
    }

    /// Accept the whole domain of `role` again.
    pub fn select_all(&mut self, role: Role) {
        let domain: BTreeSet<Cell> = self.domain(role).into_iter().collect();
        self.selection.insert(role, domain);
    }

    /// Reset every filter to its full domain.
    pub fn reset(&mut self) {
        self.selection = self.engine().full_selection();
    }

    pub fn view(&self) -> FilteredView<'_> {
        self.engine().apply(&self.selection)
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let loaded = &self.loaded;
        let bindings = &loaded.bindings;
        let view = self.view();

        let filters = self
            .active_filters()
            .into_iter()
            .map(|role| RoleDomain {
                role,
                values: self.domain(role),
                selected: self
                    .selection
                    .get(&role)
                    .map(|s| s.iter().cloned().collect())
                    .unwrap_or_default(),
            })
            .collect();

        let plan_distribution =
            aggregate::group_sum(&view, bindings, Role::PlanType, Role::CreditVolume)
                .into_iter()
                .map(|(plan, credit)| PlanBar { plan, credit })
                .collect();

        let monthly_counts = aggregate::group_count(&view, bindings, Role::Year, Role::Month)
            .into_iter()
            .map(|((year, month), count)| MonthlyPoint { year, month, count })
            .collect();

        DashboardSnapshot {
            location: loaded.location.clone(),
            fingerprint: loaded.fingerprint.clone(),
            loaded_at: loaded.loaded_at,
            columns: loaded.table.columns().to_vec(),
            bindings: bindings
                .iter()
                .map(|(role, resolution)| RoleBinding {
                    role,
                    resolution: resolution.clone(),
                })
                .collect(),
            filters,
            total_rows: loaded.table.row_count(),
            summary: Summary::compute(&view, bindings),
            plan_distribution,
            monthly_counts,
        }
    }
}
