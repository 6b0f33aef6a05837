//! Component specification module.
//!
//! This module contains the [`ComponentSpec`] type used to declare named
//! components with their lifetimes and build functions, and to create the
//! root [`Container`] from them.

use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use crate::config::ContainerConfig;
use crate::descriptors::ComponentDescriptor;
use crate::error::{BoxError, DiError, DiResult};
use crate::lifetime::Lifetime;
use crate::observer::{DiObserver, Observers};
use crate::provider::{BuildContext, Container};
use crate::registration::{Recipe, Registry};

pub mod module_system;
pub use module_system::*;

/// Mapping from component names to construction recipes.
///
/// Registering a name twice replaces the earlier recipe.
///
/// # Examples
///
/// ```
/// use ferrous_invoke::{ComponentSpec, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Repository { db: Arc<Database> }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ferrous_invoke::DiResult<()> {
/// let mut spec = ComponentSpec::new();
/// spec.add_singleton("db", |_| async {
///     Ok(Database { url: "postgres://localhost".to_string() })
/// });
/// spec.add_scoped("repo", |ctx| async move {
///     Ok(Repository { db: ctx.resolve::<Database>("db").await? })
/// });
///
/// let root = spec.build(())?;
/// let scope = root.scope()?;
/// let repo = scope.resolve::<Repository>("repo").await?;
/// assert_eq!(repo.db.url, "postgres://localhost");
/// # Ok(())
/// # }
/// ```
pub struct ComponentSpec {
    recipes: BTreeMap<String, Recipe>,
    observers: Observers,
    prewarm: Vec<String>,
}

impl ComponentSpec {
    /// Creates a new empty specification.
    pub fn new() -> Self {
        Self {
            recipes: BTreeMap::new(),
            observers: Observers::new(),
            prewarm: Vec::new(),
        }
    }

    /// Registers a recipe under `name`.
    pub fn insert(&mut self, name: impl Into<String>, recipe: Recipe) -> &mut Self {
        self.recipes.insert(name.into(), recipe);
        self
    }

    /// Registers a build function with an explicit lifetime.
    pub fn add<T, F, Fut>(&mut self, name: impl Into<String>, lifetime: Lifetime, build: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(BuildContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        self.insert(name, Recipe::new(lifetime, build))
    }

    /// Registers a build function whose lifetime is given as a textual tag.
    ///
    /// Unknown tags fail [`build`](Self::build) with [`DiError::UnknownLifetime`].
    pub fn add_tagged<T, F, Fut>(&mut self, name: impl Into<String>, tag: impl Into<String>, build: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(BuildContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        self.insert(name, Recipe::tagged(tag, build))
    }

    /// Registers a singleton built on first resolution and shared by the root
    /// and every scope.
    pub fn add_singleton<T, F, Fut>(&mut self, name: impl Into<String>, build: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(BuildContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        self.add(name, Lifetime::Singleton, build)
    }

    /// Registers a component built once per scope.
    pub fn add_scoped<T, F, Fut>(&mut self, name: impl Into<String>, build: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(BuildContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        self.add(name, Lifetime::Scoped, build)
    }

    /// Registers a component built on every resolution.
    pub fn add_transient<T, F, Fut>(&mut self, name: impl Into<String>, build: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(BuildContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, BoxError>> + Send + 'static,
    {
        self.add(name, Lifetime::Transient, build)
    }

    /// Registers an already-built singleton value.
    pub fn add_value<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) -> &mut Self {
        self.insert(name, Recipe::value(value))
    }

    /// Registers an observer notified of every resolution.
    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    /// Marks a singleton to be built by [`Container::prewarm`].
    pub fn prewarm(&mut self, name: impl Into<String>) -> &mut Self {
        let name = name.into();
        if !self.prewarm.contains(&name) {
            self.prewarm.push(name);
        }
        self
    }

    /// Applies lifetime overrides from configuration.
    ///
    /// Every override is checked before any is applied, so on error the
    /// specification is left unchanged. An override naming an unregistered
    /// component fails with [`DiError::NotFound`]; moving a
    /// [`value`](Self::add_value) component off Singleton fails with
    /// [`DiError::WrongLifetime`]. Unknown tags are reported by
    /// [`build`](Self::build).
    pub fn apply_config(&mut self, config: &ContainerConfig) -> DiResult<&mut Self> {
        for (name, tag) in &config.lifetimes {
            let recipe = self
                .recipes
                .get(name)
                .ok_or_else(|| DiError::NotFound(name.clone()))?;
            if let Ok(lifetime) = tag.parse::<Lifetime>() {
                recipe.check_lifetime(name, lifetime)?;
            }
        }

        for (name, tag) in &config.lifetimes {
            if let Some(recipe) = self.recipes.remove(name) {
                tracing::debug!(component = %name, lifetime = %tag, "lifetime overridden by configuration");
                self.recipes.insert(name.clone(), recipe.with_tag(tag.clone()));
            }
        }
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.recipes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// True if any recipe declares the Scoped lifetime.
    pub fn has_scoped(&self) -> bool {
        self.recipes
            .values()
            .any(|r| r.lifetime() == Some(Lifetime::Scoped))
    }

    /// Name and declared lifetime of every recipe, sorted by name.
    pub fn descriptors(&self) -> Vec<ComponentDescriptor> {
        self.recipes
            .iter()
            .map(|(name, recipe)| ComponentDescriptor::unchecked(name.clone(), recipe.lifetime()))
            .collect()
    }

    /// Creates the root container.
    ///
    /// `options` is an opaque value handed to every build function through
    /// [`BuildContext::options`]. Fails with [`DiError::UnknownLifetime`] if a
    /// recipe declares an unrecognized lifetime tag.
    pub fn build<O: Any + Send + Sync>(self, options: O) -> DiResult<Container> {
        let registry = Registry::finalize(self.recipes)?;
        Ok(Container::new_root(registry, Arc::new(options), self.observers, self.prewarm))
    }
}

impl Default for ComponentSpec {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ComponentSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentSpec")
            .field("components", &self.descriptors())
            .field("prewarm", &self.prewarm)
            .finish()
    }
}

/// Creates the root container from a specification and options.
///
/// Equivalent to [`ComponentSpec::build`].
pub fn create_container<O: Any + Send + Sync>(spec: ComponentSpec, options: O) -> DiResult<Container> {
    spec.build(options)
}
