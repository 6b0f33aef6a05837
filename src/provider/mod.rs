//! Container module for resolving components.
//!
//! A [`Container`] is either the root (created once per process from a
//! [`ComponentSpec`](crate::ComponentSpec)) or a scope derived from the root
//! once per invocation. Both kinds share one type; they differ only in whether
//! a parent is set.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::descriptors::ComponentDescriptor;
use crate::error::{DiError, DiResult};
use crate::internal::{DisposeBag, ResolutionPath};
use crate::observer::Observers;
use crate::prewarm::PrewarmReport;
use crate::registration::{AnyArc, Registration, Registry};
use crate::traits::ResolverCore;
use crate::Lifetime;

pub mod context;
pub mod scope;

pub use context::BuildContext;

/// Component container for resolving named components.
///
/// The container resolves components according to their registered lifetimes
/// (Singleton, Scoped, Transient). Cloning a `Container` is cheap and yields a
/// handle to the same container level.
///
/// # Lifetime Behavior
///
/// - **Singleton**: built at most once per root, shared by the root and every scope
/// - **Scoped**: built at most once per scope; resolving it on the root fails
/// - **Transient**: built on every resolution
///
/// # Thread Safety
///
/// Singleton construction is memoized while in flight: concurrent first
/// resolutions of the same singleton wait for one build instead of starting
/// their own. A failed build is not cached; the next resolution retries.
///
/// # Examples
///
/// ```
/// use ferrous_invoke::{ComponentSpec, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ferrous_invoke::DiResult<()> {
/// let mut spec = ComponentSpec::new();
/// spec.add_value("db", Database { url: "postgres://localhost".to_string() });
/// spec.add_transient("users", |ctx| async move {
///     Ok(UserService { db: ctx.resolve::<Database>("db").await? })
/// });
///
/// let root = spec.build(())?;
/// let users = root.resolve::<UserService>("users").await?;
/// assert_eq!(users.db.url, "postgres://localhost");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    pub(crate) registry: Arc<Registry>,
    pub(crate) options: AnyArc,
    pub(crate) observers: Arc<Observers>,
    pub(crate) prewarm: Arc<[String]>,
    /// Unset only for the root
    pub(crate) parent: Option<Container>,
    /// Slot-based scoped storage, empty on the root
    pub(crate) scoped_cells: Box<[OnceCell<AnyArc>]>,
    pub(crate) disposers: Mutex<DisposeBag>,
}

impl Container {
    pub(crate) fn new_root(
        registry: Registry,
        options: AnyArc,
        observers: Observers,
        prewarm: Vec<String>,
    ) -> Self {
        tracing::info!(
            components = registry.iter().count(),
            scoped = registry.scoped_count,
            "component container created"
        );
        Self {
            inner: Arc::new(ContainerInner {
                registry: Arc::new(registry),
                options,
                observers: Arc::new(observers),
                prewarm: prewarm.into(),
                parent: None,
                scoped_cells: Box::new([]),
                disposers: Mutex::new(DisposeBag::default()),
            }),
        }
    }

    #[inline]
    pub(crate) fn inner(&self) -> &ContainerInner {
        &self.inner
    }

    /// Returns true for the root container.
    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    /// Returns the root container (itself when called on the root).
    pub fn root(&self) -> &Container {
        self.inner.parent.as_ref().unwrap_or(self)
    }

    /// Returns true if both handles refer to the same container level.
    pub fn ptr_eq(a: &Container, b: &Container) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// The opaque options value fixed at root-container creation.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_invoke::ComponentSpec;
    ///
    /// let root = ComponentSpec::new().build(String::from("eu-west-1")).unwrap();
    /// assert_eq!(*root.options::<String>().unwrap(), "eu-west-1");
    /// assert!(root.options::<u32>().is_err());
    /// ```
    pub fn options<O: Any + Send + Sync>(&self) -> DiResult<Arc<O>> {
        self.inner
            .options
            .clone()
            .downcast::<O>()
            .map_err(|_| context::options_type_error::<O>())
    }

    /// Names of every registered component, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.registry.names()
    }

    /// Name and lifetime of every registered component, sorted by name.
    pub fn descriptors(&self) -> Vec<ComponentDescriptor> {
        self.inner
            .registry
            .iter()
            .map(|(name, reg)| ComponentDescriptor::new(name.clone(), reg.lifetime))
            .collect()
    }

    /// Lifetime of a registered component.
    pub fn lifetime_of(&self, name: &str) -> Option<Lifetime> {
        self.inner.registry.get(name).map(|reg| reg.lifetime)
    }

    /// Builds every singleton marked with [`ComponentSpec::prewarm`](crate::ComponentSpec::prewarm).
    ///
    /// Intended for cold start: the first invocation then finds the
    /// singletons already built. Failures are collected in the report, not
    /// cached; the next resolution of a failed component retries its build.
    pub async fn prewarm(&self) -> PrewarmReport {
        let mut report = PrewarmReport::default();
        for name in self.inner.prewarm.iter() {
            let started = Instant::now();
            let result = match self.lifetime_of(name) {
                Some(Lifetime::Singleton) => self.resolve_any(name).await.map(|_| ()),
                Some(other) => Err(DiError::WrongLifetime(format!(
                    "cannot prewarm {} component `{}`",
                    other, name
                ))),
                None => Err(DiError::NotFound(name.clone())),
            };
            report.record(name.clone(), result, started.elapsed());
        }
        report
    }

    /// Disposes all hooks registered on this container level in LIFO order.
    ///
    /// Async hooks run first (in reverse order), then sync hooks (in reverse
    /// order). Calling it on a scope leaves the root's singletons untouched.
    pub async fn dispose_all(&self) {
        let bag = self.inner.disposers.lock().take();
        if !bag.is_empty() {
            tracing::debug!(hooks = bag.len(), root = self.is_root(), "disposing container");
        }
        bag.run_all_reverse().await;
    }

    /// Resolution entry point shared by the container and build contexts.
    pub(crate) async fn resolve_on_path(&self, name: &str, path: &ResolutionPath) -> DiResult<AnyArc> {
        let reg = self
            .inner
            .registry
            .get(name)
            .ok_or_else(|| DiError::NotFound(name.to_string()))?;
        let path = path.enter(name)?;

        let observers = &self.inner.observers;
        let started = observers.has_observers().then(Instant::now);
        if started.is_some() {
            observers.resolving(name, reg.lifetime);
        }

        let result = match reg.lifetime {
            Lifetime::Singleton => self.resolve_singleton(reg, name, path).await,
            Lifetime::Scoped => self.resolve_scoped(reg, name, path).await,
            Lifetime::Transient => self.build(reg, name, path, self.clone()).await,
        };

        if let Some(started) = started {
            match &result {
                Ok(_) => observers.resolved(name, reg.lifetime, started.elapsed()),
                Err(e) => observers.resolution_failed(name, e),
            }
        }
        result
    }

    async fn resolve_singleton(&self, reg: &Registration, name: &str, path: ResolutionPath) -> DiResult<AnyArc> {
        let Some(cell) = &reg.singleton else {
            return Err(DiError::WrongLifetime(format!(
                "component `{}` has no singleton cache",
                name
            )));
        };

        // Fast path: already built
        if let Some(value) = cell.get() {
            return Ok(value.clone());
        }

        // The cell lives in the registry shared by root and scopes, so
        // the first writer wins for every container level.
        let owner = self.root().clone();
        let value = cell
            .get_or_try_init(|| async {
                tracing::debug!(component = name, "building singleton");
                self.build(reg, name, path, owner).await
            })
            .await?;
        Ok(value.clone())
    }

    async fn build(
        &self,
        reg: &Registration,
        name: &str,
        path: ResolutionPath,
        owner: Container,
    ) -> DiResult<AnyArc> {
        let hooks = Arc::new(Mutex::new(DisposeBag::default()));
        let ctx = BuildContext {
            container: self.clone(),
            hooks: hooks.clone(),
            path,
        };
        let result = (reg.build)(ctx).await;
        let pending = hooks.lock().take();

        match result {
            Ok(value) => {
                if !pending.is_empty() {
                    owner.inner.disposers.lock().append(pending);
                }
                Ok(value)
            }
            Err(err) => {
                if !pending.is_empty() {
                    tracing::debug!(component = name, hooks = pending.len(), "disposing hooks of failed build");
                    pending.run_all_reverse().await;
                }
                Err(match err.downcast::<DiError>() {
                    // Errors from nested resolutions already name the failing component.
                    Ok(inner) => *inner,
                    Err(err) => {
                        tracing::warn!(component = name, error = %err, "component build failed");
                        DiError::build(name, err)
                    }
                })
            }
        }
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Container Debug ===\n");
        s.push_str(if self.is_root() { "Level: root\n" } else { "Level: scope\n" });
        for (name, reg) in self.inner.registry.iter() {
            let built = reg.singleton.as_ref().map(|c| c.initialized()).unwrap_or(false);
            s.push_str(&format!("  {}: {} (built: {})\n", name, reg.lifetime, built));
        }
        s
    }
}

#[async_trait::async_trait]
impl ResolverCore for Container {
    async fn resolve_any(&self, name: &str) -> DiResult<AnyArc> {
        self.resolve_on_path(name, &ResolutionPath::new()).await
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("is_root", &self.is_root())
            .field("components", &self.inner.registry.iter().count())
            .finish()
    }
}
