//! Build context handed to component recipes.

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{DiError, DiResult};
use crate::internal::{DisposeBag, ResolutionPath};
use crate::registration::AnyArc;
use crate::traits::{AsyncDispose, Dispose, ResolverCore};

use super::Container;

/// Context passed to build functions for resolving sibling components.
///
/// Carries the container level performing the resolution (root or scope), the
/// root options, and the chain of components currently under construction so
/// that dependency cycles are reported instead of awaited forever.
///
/// # Examples
///
/// ```
/// use ferrous_invoke::{ComponentSpec, Resolver};
/// use std::sync::Arc;
///
/// struct Settings { url: String }
/// struct Database { url: String }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ferrous_invoke::DiResult<()> {
/// let mut spec = ComponentSpec::new();
/// spec.add_singleton("db", |ctx| async move {
///     let settings = ctx.options::<Settings>()?;
///     Ok(Database { url: settings.url.clone() })
/// });
/// spec.add_scoped("db_url", |ctx| async move {
///     let db = ctx.resolve::<Database>("db").await?;
///     Ok(db.url.clone())
/// });
///
/// let root = spec.build(Settings { url: "postgres://localhost".to_string() })?;
/// let scope = root.scope()?;
/// assert_eq!(*scope.resolve::<String>("db_url").await?, "postgres://localhost");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BuildContext {
    pub(super) container: Container,
    /// Hooks of this build, handed to the owner only once the build succeeds
    pub(super) hooks: Arc<Mutex<DisposeBag>>,
    pub(super) path: ResolutionPath,
}

impl BuildContext {
    /// The container level performing this resolution.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// The opaque options value fixed at root-container creation.
    pub fn options<O: Any + Send + Sync>(&self) -> DiResult<Arc<O>> {
        self.container.options::<O>()
    }

    /// Registers a synchronous disposal hook for the instance being built.
    ///
    /// The hook joins the container that owns the instance (the root for
    /// singletons, the scope for scoped, the resolving container for
    /// transients) once the build returns successfully. If the build fails,
    /// its hooks run right away instead. Hooks registered after the build
    /// has returned are dropped.
    pub fn register_disposer<T: Dispose>(&self, service: Arc<T>) {
        self.hooks.lock().push_sync(Box::new(move || service.dispose()));
    }

    /// Registers an asynchronous disposal hook, see [`register_disposer`](Self::register_disposer).
    pub fn register_async_disposer<T: AsyncDispose>(&self, service: Arc<T>) {
        self.hooks.lock().push_async(move || async move { service.dispose().await });
    }

    /// Number of components currently under construction on this chain.
    pub fn depth(&self) -> usize {
        self.path.depth()
    }
}

#[async_trait::async_trait]
impl ResolverCore for BuildContext {
    async fn resolve_any(&self, name: &str) -> DiResult<AnyArc> {
        self.container.resolve_on_path(name, &self.path).await
    }
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("is_root", &self.container.is_root())
            .field("depth", &self.path.depth())
            .finish()
    }
}

pub(super) fn options_type_error<O>() -> DiError {
    DiError::OptionsType {
        expected: std::any::type_name::<O>(),
    }
}
