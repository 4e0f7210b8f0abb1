//! Column roles and schema resolution.
//!
//! Spreadsheet exports drift: columns get inserted, labels pick up stray
//! whitespace or accents. Each logical `Role` is therefore bound to a
//! physical column per load through a strategy chain:
//!
//! 1. fixed ordinal index, when the table is wide enough;
//! 2. ranked label fragments, matched case-insensitively left to right
//!    (the first fragment that matches anything wins);
//! 3. otherwise `Absent` for optional roles, or a fatal
//!    `RequiredColumnMissing` for required ones.

use crate::data::Table;
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A logical, semantically named column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    CreditVolume,
    Rate,
    PlanType,
    Year,
    Month,
    EconomicGroup,
    SalesPoint,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::CreditVolume,
        Role::Rate,
        Role::PlanType,
        Role::Year,
        Role::Month,
        Role::EconomicGroup,
        Role::SalesPoint,
    ];

    /// Roles that drive the filter sidebar by default.
    pub const DEFAULT_FILTERS: [Role; 3] = [Role::Year, Role::EconomicGroup, Role::SalesPoint];

    pub fn name(self) -> &'static str {
        match self {
            Role::CreditVolume => "credit_volume",
            Role::Rate => "rate",
            Role::PlanType => "plan_type",
            Role::Year => "year",
            Role::Month => "month",
            Role::EconomicGroup => "economic_group",
            Role::SalesPoint => "sales_point",
        }
    }

    /// Display caption for widgets.
    pub fn caption(self) -> &'static str {
        match self {
            Role::CreditVolume => "Credit volume",
            Role::Rate => "Rate",
            Role::PlanType => "Plan type",
            Role::Year => "Year",
            Role::Month => "Month",
            Role::EconomicGroup => "Economic group",
            Role::SalesPoint => "Sales point",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown role '{0}' (expected one of: credit_volume, rate, plan_type, year, month, economic_group, sales_point)")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        Role::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(key))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// How to find one role's column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSpec {
    /// 0-based ordinal tried first.
    #[serde(default)]
    pub index: Option<usize>,
    /// Label fragments tried in order after the index.
    #[serde(default)]
    pub fragments: Vec<String>,
    /// Whether failing to resolve aborts the load.
    #[serde(default)]
    pub required: bool,
}

impl RoleSpec {
    /// Optional role matched by label fragments only.
    pub fn matching<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            index: None,
            fragments: fragments.into_iter().map(Into::into).collect(),
            required: false,
        }
    }

    pub fn at_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Resolution strategy per role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleConfig {
    specs: BTreeMap<Role, RoleSpec>,
}

impl Default for RoleConfig {
    /// Layout of the credit-operations export: volume, rate and plan type
    /// sit at columns AA, AC and AD; everything else is found by label.
    fn default() -> Self {
        let specs = BTreeMap::from([
            (
                Role::CreditVolume,
                RoleSpec::matching(["Volume_Credito", "Volume Credito", "Volume"]).at_index(26),
            ),
            (Role::Rate, RoleSpec::matching(["Taxa", "Rate"]).at_index(28)),
            (
                Role::PlanType,
                RoleSpec::matching(["Tipo_Plano", "Tipo Plano", "Plano", "Plan"]).at_index(29),
            ),
            (Role::Year, RoleSpec::matching(["Ano", "Year"]).required()),
            (Role::Month, RoleSpec::matching(["Mes", "Mês", "Month"])),
            (
                Role::EconomicGroup,
                RoleSpec::matching(["Grupo Economico", "Grupo", "Econômico"]),
            ),
            (
                Role::SalesPoint,
                RoleSpec::matching(["Ponto de Venda", "Ponto", "Sales Point"]),
            ),
        ]);
        Self { specs }
    }
}

impl RoleConfig {
    /// A configuration with no roles at all.
    pub fn empty() -> Self {
        Self {
            specs: BTreeMap::new(),
        }
    }

    pub fn get(&self, role: Role) -> Option<&RoleSpec> {
        self.specs.get(&role)
    }

    pub fn set(&mut self, role: Role, spec: RoleSpec) {
        self.specs.insert(role, spec);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &RoleSpec)> {
        self.specs.iter().map(|(r, s)| (*r, s))
    }
}

/// Outcome of resolving one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Resolved { index: usize, label: String },
    Absent,
}

static ABSENT: Resolution = Resolution::Absent;

/// One resolution per role for a single load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    resolutions: BTreeMap<Role, Resolution>,
}

impl Bindings {
    pub fn insert(&mut self, role: Role, resolution: Resolution) {
        self.resolutions.insert(role, resolution);
    }

    /// Resolution for `role`; roles never configured read as `Absent`.
    pub fn get(&self, role: Role) -> &Resolution {
        self.resolutions.get(&role).unwrap_or(&ABSENT)
    }

    /// Bound column ordinal.
    pub fn column(&self, role: Role) -> Option<usize> {
        match self.get(role) {
            Resolution::Resolved { index, .. } => Some(*index),
            Resolution::Absent => None,
        }
    }

    pub fn label(&self, role: Role) -> Option<&str> {
        match self.get(role) {
            Resolution::Resolved { label, .. } => Some(label),
            Resolution::Absent => None,
        }
    }

    pub fn is_resolved(&self, role: Role) -> bool {
        self.column(role).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &Resolution)> {
        self.resolutions.iter().map(|(r, res)| (*r, res))
    }
}

/// Copy of `table` with labels trimmed of surrounding whitespace.
pub fn normalize(table: &Table) -> Table {
    let labels = table
        .columns()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    table.relabel(labels)
}

/// Run the strategy chain for one role. Returns the bound ordinal.
///
/// Whatever strategy picks the label, the binding points at that label's
/// first occurrence.
pub fn resolve_role(table: &Table, spec: &RoleSpec) -> Option<usize> {
    let columns = table.columns();

    if let Some(label) = spec.index.and_then(|i| columns.get(i)) {
        return table.column_index(label);
    }

    spec.fragments
        .iter()
        .map(|f| f.to_lowercase())
        .filter(|f| !f.is_empty())
        .find_map(|needle| {
            columns
                .iter()
                .position(|c| c.to_lowercase().contains(&needle))
        })
}

/// Bind every configured role against a normalized table.
pub fn resolve(table: &Table, config: &RoleConfig) -> Result<Bindings, PipelineError> {
    let mut bindings = Bindings::default();

    for (role, spec) in config.iter() {
        match resolve_role(table, spec) {
            Some(index) => {
                let label = table.columns()[index].clone();
                tracing::debug!(%role, index, %label, "resolved column role");
                bindings.insert(role, Resolution::Resolved { index, label });
            }
            None if spec.required => {
                return Err(PipelineError::RequiredColumnMissing {
                    role,
                    available: table.columns().to_vec(),
                });
            }
            None => {
                tracing::warn!(%role, "optional column not found; dependent widgets are skipped");
                bindings.insert(role, Resolution::Absent);
            }
        }
    }

    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Cell;

    fn table(labels: &[&str]) -> Table {
        Table::from_rows(labels.iter().map(|s| s.to_string()).collect(), vec![]).unwrap()
    }

    fn year_only() -> RoleConfig {
        let mut config = RoleConfig::empty();
        config.set(Role::Year, RoleSpec::matching(["Year"]).required());
        config
    }

    #[test]
    fn normalize_trims_labels_and_keeps_rows() {
        let raw = Table::from_rows(
            vec![" Ano ".into(), "Mes\t".into()],
            vec![vec![Cell::from(2024.0), Cell::from(1.0)]],
        )
        .unwrap();
        let normalized = normalize(&raw);
        assert_eq!(normalized.columns(), &["Ano", "Mes"]);
        assert_eq!(normalized.row(0), raw.row(0));
    }

    #[test]
    fn fragment_matches_trimmed_label_anywhere_in_row() {
        let t = normalize(&table(&["X", "Year ", "Y"]));
        let bindings = resolve(&t, &year_only()).unwrap();
        assert_eq!(
            bindings.get(Role::Year),
            &Resolution::Resolved {
                index: 1,
                label: "Year".into()
            }
        );
    }

    #[test]
    fn fixed_index_wins_over_fragments() {
        let t = table(&["Volume", "b", "c"]);
        let spec = RoleSpec::matching(["Volume"]).at_index(2);
        assert_eq!(resolve_role(&t, &spec), Some(2));
    }

    #[test]
    fn out_of_range_index_falls_back_to_fragments() {
        let t = table(&["a", "Taxa Media"]);
        let spec = RoleSpec::matching(["Taxa"]).at_index(28);
        assert_eq!(resolve_role(&t, &spec), Some(1));
    }

    #[test]
    fn out_of_range_index_without_match_is_absent() {
        let t = table(&["a", "b"]);
        let spec = RoleSpec::matching(["Taxa"]).at_index(28);
        assert_eq!(resolve_role(&t, &spec), None);
    }

    #[test]
    fn fragments_are_tried_in_rank_order_not_best_match() {
        // "Grupo" appears earlier in the row than "Grupo Economico", but the
        // higher-ranked fragment is tried across the whole row first.
        let t = table(&["Grupo Vendedor", "Grupo Economico"]);
        let spec = RoleSpec::matching(["Grupo Economico", "Grupo"]);
        assert_eq!(resolve_role(&t, &spec), Some(1));

        let spec = RoleSpec::matching(["Grupo", "Grupo Economico"]);
        assert_eq!(resolve_role(&t, &spec), Some(0));
    }

    #[test]
    fn matching_is_case_insensitive_including_accents() {
        let t = table(&["GRUPO ECONÔMICO"]);
        let spec = RoleSpec::matching(["econômico"]);
        assert_eq!(resolve_role(&t, &spec), Some(0));
    }

    #[test]
    fn duplicate_labels_bind_first_occurrence() {
        let t = table(&["Ano", "x", "Ano"]);
        assert_eq!(resolve_role(&t, &RoleSpec::matching(["Ano"])), Some(0));
        assert_eq!(resolve_role(&t, &RoleSpec::matching(["zzz"]).at_index(2)), Some(0));
    }

    #[test]
    fn empty_fragments_never_match() {
        let t = table(&["a"]);
        assert_eq!(resolve_role(&t, &RoleSpec::matching([""])), None);
    }

    #[test]
    fn missing_required_role_reports_available_columns() {
        let t = table(&["Mes", "Volume", "Taxa"]);
        let err = resolve(&t, &RoleConfig::default()).unwrap_err();
        match err {
            PipelineError::RequiredColumnMissing { role, available } => {
                assert_eq!(role, Role::Year);
                assert_eq!(available, vec!["Mes", "Volume", "Taxa"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_optional_roles_resolve_absent() {
        let t = table(&["Ano", "Volume"]);
        let bindings = resolve(&t, &RoleConfig::default()).unwrap();
        assert_eq!(bindings.column(Role::Year), Some(0));
        assert_eq!(bindings.column(Role::CreditVolume), Some(1));
        assert_eq!(bindings.get(Role::EconomicGroup), &Resolution::Absent);
        assert_eq!(bindings.get(Role::SalesPoint), &Resolution::Absent);
        assert!(!bindings.is_resolved(Role::Rate));
    }

    #[test]
    fn unconfigured_roles_read_absent() {
        let t = table(&["Year"]);
        let bindings = resolve(&t, &year_only()).unwrap();
        assert_eq!(bindings.get(Role::Month), &Resolution::Absent);
    }

    #[test]
    fn role_names_round_trip_through_from_str() {
        for role in Role::ALL {
            assert_eq!(role.name().parse::<Role>().unwrap(), role);
        }
        assert_eq!("YEAR".parse::<Role>().unwrap(), Role::Year);
        assert!("volume".parse::<Role>().is_err());
    }
}
