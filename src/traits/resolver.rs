//! Resolver traits for name-based component resolution.

use std::any::Any;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::{DiError, DiResult};
use crate::registration::AnyArc;

/// Core resolver trait for object-safe component resolution.
///
/// Implemented by [`Container`](crate::Container) (root or scope),
/// [`BuildContext`](crate::BuildContext) and [`Services`](crate::Services).
/// Most users should use the [`Resolver`] trait instead, which adds the typed
/// `resolve::<T>` on top of this trait.
#[async_trait::async_trait]
pub trait ResolverCore: Send + Sync {
    /// Resolves a component by name, honoring its lifetime.
    ///
    /// # Returns
    ///
    /// * `Ok(AnyArc)` - The component wrapped in `Arc<dyn Any>`
    /// * `Err(DiError)` - Resolution error (not found, wrong lifetime, circular, build failure)
    async fn resolve_any(&self, name: &str) -> DiResult<AnyArc>;
}

/// High-level resolver interface with typed resolution.
///
/// # Examples
///
/// ```
/// use ferrous_invoke::{ComponentSpec, Resolver};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ferrous_invoke::DiResult<()> {
/// let mut spec = ComponentSpec::new();
/// spec.add_value("port", 8080u16);
///
/// let root = spec.build(())?;
/// let port = root.resolve::<u16>("port").await?;
/// assert_eq!(*port, 8080);
/// # Ok(())
/// # }
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a component and downcasts it to `T`.
    ///
    /// Fails with [`DiError::TypeMismatch`] if the component is not a `T`.
    fn resolve<'a, T>(&'a self, name: &'a str) -> BoxFuture<'a, DiResult<Arc<T>>>
    where
        T: Any + Send + Sync,
    {
        Box::pin(async move { downcast(name, self.resolve_any(name).await?) })
    }

    /// Resolves a component, mapping "not registered" to `None`.
    fn try_resolve<'a, T>(&'a self, name: &'a str) -> BoxFuture<'a, DiResult<Option<Arc<T>>>>
    where
        T: Any + Send + Sync,
    {
        Box::pin(async move {
            match self.resolve_any(name).await {
                Ok(value) => downcast(name, value).map(Some),
                Err(DiError::NotFound(missing)) if missing == name => Ok(None),
                Err(e) => Err(e),
            }
        })
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}

pub(crate) fn downcast<T: Any + Send + Sync>(name: &str, value: AnyArc) -> DiResult<Arc<T>> {
    value.downcast::<T>().map_err(|_| DiError::TypeMismatch {
        name: name.to_string(),
        expected: std::any::type_name::<T>(),
    })
}
