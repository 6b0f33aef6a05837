//! Deployment configuration for component lifetimes.
//!
//! Lets a deployment retune component lifetimes without code changes, e.g.
//! turning a cached client into a transient one while debugging connection
//! reuse. Overrides are kept as raw tags and validated when the root
//! container is created.

use std::collections::BTreeMap;
use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DiError, DiResult};

/// Environment variable infix used by [`ContainerConfig::from_env`].
const LIFETIME_INFIX: &str = "_LIFETIME_";

/// Lifetime overrides keyed by component name.
///
/// # Examples
///
/// ```
/// use ferrous_invoke::{ComponentSpec, ContainerConfig, Lifetime};
///
/// let config = ContainerConfig::from_json_str(r#"{ "lifetimes": { "db": "transient" } }"#).unwrap();
///
/// let mut spec = ComponentSpec::new();
/// spec.add_singleton("db", |_| async { Ok(String::from("connection")) });
/// spec.apply_config(&config).unwrap();
///
/// let root = spec.build(()).unwrap();
/// assert_eq!(root.lifetime_of("db"), Some(Lifetime::Transient));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerConfig {
    /// Component name to lifetime tag (`singleton`, `scoped`, `transient`)
    pub lifetimes: BTreeMap<String, String>,
}

impl ContainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one override.
    pub fn with_lifetime(mut self, name: impl Into<String>, tag: impl Into<String>) -> Self {
        self.lifetimes.insert(name.into(), tag.into());
        self
    }

    /// Parses a JSON document of the form `{"lifetimes": {"name": "tag"}}`.
    pub fn from_json_str(json: &str) -> DiResult<Self> {
        serde_json::from_str(json).map_err(|e| DiError::Config(e.to_string()))
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> DiResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DiError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    /// Collects overrides from `<PREFIX>_LIFETIME_<NAME>=<tag>` variables.
    ///
    /// The component name is the lower-cased `<NAME>` part, so
    /// `APP_LIFETIME_DB=transient` overrides component `db`.
    pub fn from_env(prefix: &str) -> Self {
        Self::from_vars(prefix, env::vars())
    }

    pub(crate) fn from_vars(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let needle = format!("{}{}", prefix.to_uppercase(), LIFETIME_INFIX);
        let lifetimes = vars
            .into_iter()
            .filter_map(|(key, value)| {
                let name = key.strip_prefix(&needle)?;
                (!name.is_empty()).then(|| (name.to_lowercase(), value))
            })
            .collect();
        Self { lifetimes }
    }

    /// Merges `other` into `self`; entries in `other` win.
    pub fn merge(mut self, other: ContainerConfig) -> Self {
        self.lifetimes.extend(other.lifetimes);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.lifetimes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json() {
        let config =
            ContainerConfig::from_json_str(r#"{"lifetimes": {"db": "scoped", "cache": "transient"}}"#)
                .unwrap();
        assert_eq!(config.lifetimes.get("db").map(String::as_str), Some("scoped"));
        assert_eq!(config.lifetimes.len(), 2);
    }

    #[test]
    fn empty_document_is_default() {
        assert!(ContainerConfig::from_json_str("{}").unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = ContainerConfig::from_json_str(r#"{"lifetime": {}}"#).unwrap_err();
        assert!(matches!(err, DiError::Config(_)));
    }

    #[test]
    fn reads_prefixed_vars() {
        let vars = vec![
            ("APP_LIFETIME_DB".to_string(), "transient".to_string()),
            ("APP_LIFETIME_".to_string(), "scoped".to_string()),
            ("OTHER_LIFETIME_CACHE".to_string(), "scoped".to_string()),
            ("APP_REGION".to_string(), "eu".to_string()),
        ];
        let config = ContainerConfig::from_vars("app", vars);
        assert_eq!(config, ContainerConfig::new().with_lifetime("db", "transient"));
    }

    #[test]
    fn merge_prefers_later_entries() {
        let base = ContainerConfig::new()
            .with_lifetime("db", "singleton")
            .with_lifetime("cache", "scoped");
        let merged = base.merge(ContainerConfig::new().with_lifetime("db", "transient"));
        assert_eq!(merged.lifetimes["db"], "transient");
        assert_eq!(merged.lifetimes["cache"], "scoped");
    }
}
