//! Component module system for modular registration.
//!
//! Groups related recipes (e.g. everything a storage integration needs) behind
//! one type that can be added to a [`ComponentSpec`] in a single call.

use crate::{ComponentSpec, DiResult};

/// A module that registers components with a [`ComponentSpec`].
///
/// # Example
///
/// ```rust
/// use ferrous_invoke::{ComponentModule, ComponentSpec, DiResult};
///
/// struct StorageModule {
///     bucket: String,
/// }
///
/// impl ComponentModule for StorageModule {
///     fn register_components(self, spec: &mut ComponentSpec) -> DiResult<()> {
///         spec.add_value("bucket", self.bucket);
///         spec.add_scoped("upload_id", |_| async { Ok(String::from("upload-1")) });
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let mut spec = ComponentSpec::new();
/// spec.add_module(StorageModule { bucket: "assets".to_string() })?;
/// assert!(spec.contains("bucket"));
/// # Ok(())
/// # }
/// ```
pub trait ComponentModule {
    /// Register this module's components with the specification.
    fn register_components(self, spec: &mut ComponentSpec) -> DiResult<()>;
}

impl ComponentSpec {
    /// Adds a module's components in place.
    pub fn add_module<M: ComponentModule>(&mut self, module: M) -> DiResult<&mut Self> {
        module.register_components(self)?;
        Ok(self)
    }
}

/// Extension trait for consuming, chainable module registration.
pub trait ComponentSpecExt {
    /// Adds a module and returns the specification.
    ///
    /// ```rust
    /// use ferrous_invoke::{ComponentModule, ComponentSpec, ComponentSpecExt, DiResult};
    ///
    /// struct Clock;
    /// impl ComponentModule for Clock {
    ///     fn register_components(self, spec: &mut ComponentSpec) -> DiResult<()> {
    ///         spec.add_value("epoch", 0u64);
    ///         Ok(())
    ///     }
    /// }
    ///
    /// # fn main() -> DiResult<()> {
    /// let root = ComponentSpec::new().with_module(Clock)?.build(())?;
    /// assert_eq!(root.names().collect::<Vec<_>>(), vec!["epoch"]);
    /// # Ok(())
    /// # }
    /// ```
    fn with_module<M: ComponentModule>(self, module: M) -> DiResult<Self>
    where
        Self: Sized;
}

impl ComponentSpecExt for ComponentSpec {
    fn with_module<M: ComponentModule>(mut self, module: M) -> DiResult<Self> {
        module.register_components(&mut self)?;
        Ok(self)
    }
}
