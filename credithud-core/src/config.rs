//! Dashboard configuration, stored as TOML.
//!
//! ```toml
//! [source]
//! url = "https://docs.google.com/spreadsheets/d/<id>/edit?gid=0"
//! ttl_secs = 600
//!
//! [filters]
//! roles = ["year", "economic_group", "sales_point"]
//!
//! [roles.sales_point]
//! fragments = ["Ponto de Vendas", "PDV"]
//! required = true
//!
//! [roles.credit_volume]
//! by_index = false
//! ```
//!
//! Role tables override the built-in defaults field by field; roles not
//! mentioned keep their defaults.

use crate::data::DEFAULT_TTL;
use crate::schema::{Role, RoleConfig, RoleSpec, UnknownRole};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    UnknownRole(#[from] UnknownRole),

    #[error("role '{role}': `index` cannot be combined with `by_index = false`")]
    ConflictingOverride { role: Role },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: Option<String>,
    pub ttl_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: None,
            ttl_secs: DEFAULT_TTL.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub roles: Vec<Role>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            roles: Role::DEFAULT_FILTERS.to_vec(),
        }
    }
}

/// Per-role override; unset fields keep the default `RoleSpec` values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// `false` drops the fixed index so the role is found by label only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_index: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragments: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

/// Complete dashboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub source: SourceConfig,
    pub filters: FilterConfig,
    /// Keyed by role name (`year`, `sales_point`, ...).
    pub roles: BTreeMap<String, RoleOverride>,
}

impl DashboardConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        // Surface typos in role names at load time, not at first use.
        config.role_config()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.source.ttl_secs)
    }

    /// Default role specs with this config's overrides applied.
    pub fn role_config(&self) -> Result<RoleConfig, ConfigError> {
        let mut config = RoleConfig::default();
        for (name, over) in &self.roles {
            let role: Role = name.parse()?;
            let mut spec = config
                .get(role)
                .cloned()
                .unwrap_or_else(|| RoleSpec::matching(Vec::<String>::new()));
            match (over.index, over.by_index) {
                (Some(_), Some(false)) => return Err(ConfigError::ConflictingOverride { role }),
                (Some(index), _) => spec.index = Some(index),
                (None, Some(false)) => spec.index = None,
                (None, _) => {}
            }
            if let Some(fragments) = &over.fragments {
                spec.fragments = fragments.clone();
            }
            if let Some(required) = over.required {
                spec.required = required;
            }
            config.set(role, spec);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config = DashboardConfig::from_toml("").unwrap();
        assert_eq!(config.source.url, None);
        assert_eq!(config.ttl(), Duration::from_secs(600));
        assert_eq!(config.filters.roles, Role::DEFAULT_FILTERS.to_vec());
        assert_eq!(config.role_config().unwrap(), RoleConfig::default());
    }

    #[test]
    fn overrides_merge_into_default_specs() {
        let config = DashboardConfig::from_toml(
            r#"
            [source]
            url = "data/ops.csv"
            ttl_secs = 60

            [filters]
            roles = ["year", "plan_type"]

            [roles.sales_point]
            fragments = ["PDV"]
            required = true

            [roles.credit_volume]
            index = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.source.url.as_deref(), Some("data/ops.csv"));
        assert_eq!(config.ttl(), Duration::from_secs(60));
        assert_eq!(config.filters.roles, vec![Role::Year, Role::PlanType]);

        let roles = config.role_config().unwrap();
        let sales = roles.get(Role::SalesPoint).unwrap();
        assert_eq!(sales.fragments, vec!["PDV"]);
        assert!(sales.required);

        let credit = roles.get(Role::CreditVolume).unwrap();
        assert_eq!(credit.index, Some(3));
        assert!(credit.fragments.contains(&"Volume".to_string()));
        assert!(!credit.required);
    }

    #[test]
    fn by_index_false_drops_the_default_ordinal() {
        let config = DashboardConfig::from_toml(
            r#"
            [roles.credit_volume]
            by_index = false

            [roles.rate]
            by_index = true
            "#,
        )
        .unwrap();
        let roles = config.role_config().unwrap();

        let credit = roles.get(Role::CreditVolume).unwrap();
        assert_eq!(credit.index, None);
        assert!(credit.fragments.contains(&"Volume".to_string()));
        assert_eq!(roles.get(Role::Rate).unwrap().index, Some(28));
    }

    #[test]
    fn index_with_by_index_false_is_rejected() {
        let err = DashboardConfig::from_toml("[roles.plan_type]\nindex = 4\nby_index = false\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ConflictingOverride {
                role: Role::PlanType
            }
        ));
    }

    #[test]
    fn unknown_role_name_is_rejected() {
        let err = DashboardConfig::from_toml("[roles.volume]\nrequired = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRole(_)));
    }

    #[test]
    fn unknown_filter_role_is_a_parse_error() {
        let err = DashboardConfig::from_toml("[filters]\nroles = [\"volume\"]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_round_trip_through_file() {
        let mut config = DashboardConfig::default();
        config.source.url = Some("https://example.com/ops.csv".into());
        config.roles.insert(
            "year".into(),
            RoleOverride {
                fragments: Some(vec!["Ano Ref".into()]),
                ..RoleOverride::default()
            },
        );

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", config.to_toml().unwrap()).unwrap();

        let loaded = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = DashboardConfig::from_file(Path::new("/no/such/credithud.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
