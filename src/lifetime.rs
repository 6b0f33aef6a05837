//! Component lifetime definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Component lifetimes controlling instance caching behavior.
///
/// Defines how many instances of a component exist and which container
/// level owns them.
///
/// # Examples
///
/// ```rust
/// use ferrous_invoke::{ComponentSpec, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct RequestModel { id: u32 }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ferrous_invoke::DiResult<()> {
/// let mut spec = ComponentSpec::new();
///
/// // Singleton: one instance for the whole root container
/// spec.add_singleton("db", |_| async {
///     Ok(Database { url: "postgres://localhost".to_string() })
/// });
///
/// // Scoped: one instance per invocation scope
/// spec.add_scoped("request_id", |_| async { Ok("req-1".to_string()) });
///
/// // Transient: new instance every time
/// spec.add_transient("model", |_| async { Ok(RequestModel { id: 12345 }) });
///
/// let root = spec.build(())?;
/// let scope1 = root.scope()?;
/// let scope2 = root.scope()?;
///
/// // Singleton: same instance across scopes
/// let db1 = root.resolve::<Database>("db").await?;
/// let db2 = scope1.resolve::<Database>("db").await?;
/// assert!(Arc::ptr_eq(&db1, &db2));
///
/// // Scoped: same within a scope, different across scopes
/// let a = scope1.resolve::<String>("request_id").await?;
/// let b = scope1.resolve::<String>("request_id").await?;
/// let c = scope2.resolve::<String>("request_id").await?;
/// assert!(Arc::ptr_eq(&a, &b));
/// assert!(!Arc::ptr_eq(&a, &c));
///
/// // Transient: always different
/// let m1 = scope1.resolve::<RequestModel>("model").await?;
/// let m2 = scope1.resolve::<RequestModel>("model").await?;
/// assert!(!Arc::ptr_eq(&m1, &m2));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifetime {
    /// Single instance per root container, shared by every scope derived from it.
    Singleton,
    /// Single instance per scope. Resolving it on the root is an error.
    Scoped,
    /// New instance per resolution, never cached.
    Transient,
}

impl Lifetime {
    /// Lower-case tag used in configuration files and environment variables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        }
    }
}

impl Default for Lifetime {
    fn default() -> Self {
        Lifetime::Singleton
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a lifetime tag is not one of the known lifetimes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown lifetime tag `{0}`")]
pub struct ParseLifetimeError(pub String);

impl FromStr for Lifetime {
    type Err = ParseLifetimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "singleton" => Ok(Lifetime::Singleton),
            "scoped" => Ok(Lifetime::Scoped),
            "transient" => Ok(Lifetime::Transient),
            _ => Err(ParseLifetimeError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tags_case_insensitively() {
        assert_eq!("Scoped".parse::<Lifetime>(), Ok(Lifetime::Scoped));
        assert_eq!(" transient ".parse::<Lifetime>(), Ok(Lifetime::Transient));
        assert_eq!("SINGLETON".parse::<Lifetime>(), Ok(Lifetime::Singleton));
    }

    #[test]
    fn rejects_unknown_tag() {
        let err = "per-request".parse::<Lifetime>().unwrap_err();
        assert_eq!(err.0, "per-request");
    }

    #[test]
    fn default_is_singleton() {
        assert_eq!(Lifetime::default(), Lifetime::Singleton);
    }

    #[test]
    fn serde_uses_lowercase_tags() {
        let json = serde_json::to_string(&Lifetime::Scoped).unwrap();
        assert_eq!(json, "\"scoped\"");
        let back: Lifetime = serde_json::from_str("\"transient\"").unwrap();
        assert_eq!(back, Lifetime::Transient);
    }
}
