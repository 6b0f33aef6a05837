//! Component descriptors for introspection and diagnostics.

use serde::Serialize;

use crate::lifetime::Lifetime;

/// Component descriptor for introspection and diagnostics
///
/// Lists what is registered and under which lifetime, e.g. for a health
/// endpoint or a startup log line.
///
/// # Examples
///
/// ```rust
/// use ferrous_invoke::{ComponentSpec, Lifetime};
///
/// let mut spec = ComponentSpec::new();
/// spec.add_value("config", 42u32);
/// spec.add_scoped("request", |_| async { Ok(String::from("req")) });
///
/// let descriptors = spec.descriptors();
/// assert_eq!(descriptors.len(), 2);
/// assert_eq!(descriptors[0].name, "config");
/// assert_eq!(descriptors[0].lifetime, Some(Lifetime::Singleton));
/// assert_eq!(descriptors[1].lifetime, Some(Lifetime::Scoped));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentDescriptor {
    /// Component name
    pub name: String,
    /// Component lifetime; `None` if the declared tag is not recognized
    pub lifetime: Option<Lifetime>,
}

impl ComponentDescriptor {
    pub(crate) fn new(name: String, lifetime: Lifetime) -> Self {
        Self {
            name,
            lifetime: Some(lifetime),
        }
    }

    pub(crate) fn unchecked(name: String, lifetime: Option<Lifetime>) -> Self {
        Self { name, lifetime }
    }

    pub fn is_singleton(&self) -> bool {
        self.lifetime == Some(Lifetime::Singleton)
    }

    pub fn is_scoped(&self) -> bool {
        self.lifetime == Some(Lifetime::Scoped)
    }

    pub fn is_transient(&self) -> bool {
        self.lifetime == Some(Lifetime::Transient)
    }
}
