//! Scope creation and scoped component resolution.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::error::{DiError, DiResult};
use crate::internal::{DisposeBag, ResolutionPath};
use crate::registration::{AnyArc, Registration};

use super::{Container, ContainerInner};

impl Container {
    /// Creates a new scope for resolving scoped components.
    ///
    /// Scoped components are cached per scope, while singletons stay shared
    /// with the root. A scope is meant to live for exactly one invocation.
    ///
    /// When no component is registered as Scoped, a scope would behave
    /// exactly like the root, so the root itself is returned
    /// (`Container::ptr_eq(&root.scope()?, &root)`). Scopes are not nested:
    /// calling `scope()` on a scope fails with [`DiError::WrongLifetime`].
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_invoke::{ComponentSpec, Resolver};
    /// use std::sync::atomic::{AtomicU32, Ordering};
    /// use std::sync::Arc;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> ferrous_invoke::DiResult<()> {
    /// let counter = Arc::new(AtomicU32::new(0));
    /// let mut spec = ComponentSpec::new();
    /// let c = counter.clone();
    /// spec.add_scoped("request_id", move |_| {
    ///     let n = c.fetch_add(1, Ordering::SeqCst) + 1;
    ///     async move { Ok(format!("req-{}", n)) }
    /// });
    ///
    /// let root = spec.build(())?;
    /// let scope1 = root.scope()?;
    /// let scope2 = root.scope()?;
    ///
    /// let a = scope1.resolve::<String>("request_id").await?;
    /// let b = scope1.resolve::<String>("request_id").await?;
    /// let c = scope2.resolve::<String>("request_id").await?;
    /// assert!(Arc::ptr_eq(&a, &b));
    /// assert!(!Arc::ptr_eq(&a, &c));
    /// # Ok(())
    /// # }
    /// ```
    pub fn scope(&self) -> DiResult<Container> {
        if !self.is_root() {
            return Err(DiError::WrongLifetime(
                "scopes cannot be nested; call scope() on the root container".to_string(),
            ));
        }

        if self.inner().registry.scoped_count == 0 {
            return Ok(self.clone());
        }
        Ok(self.new_scope())
    }

    /// Derives a fresh scope level from a container known to be the root.
    ///
    /// Unlike [`scope`](Self::scope) this never collapses: the new level owns
    /// its own disposal hooks even when it has no scoped slots.
    pub(crate) fn new_scope(&self) -> Container {
        let scoped_count = self.inner().registry.scoped_count;
        let scoped_cells: Box<[OnceCell<AnyArc>]> = (0..scoped_count)
            .map(|_| OnceCell::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();

        tracing::trace!(slots = scoped_count, "scope created");
        Container {
            inner: Arc::new(ContainerInner {
                registry: self.inner().registry.clone(),
                options: self.inner().options.clone(),
                observers: self.inner().observers.clone(),
                prewarm: self.inner().prewarm.clone(),
                parent: Some(self.clone()),
                scoped_cells,
                disposers: Mutex::new(DisposeBag::default()),
            }),
        }
    }

    /// Slot-based scoped resolution, at most one build per scope.
    pub(super) async fn resolve_scoped(
        &self,
        reg: &Registration,
        name: &str,
        path: ResolutionPath,
    ) -> DiResult<AnyArc> {
        if self.is_root() {
            return Err(DiError::ScopedOnRoot(name.to_string()));
        }

        let cell = reg
            .scoped_slot
            .and_then(|slot| self.inner().scoped_cells.get(slot))
            .ok_or_else(|| DiError::WrongLifetime(format!("component `{}` has no scoped slot", name)))?;

        if let Some(value) = cell.get() {
            return Ok(value.clone());
        }

        let value = cell
            .get_or_try_init(|| self.build(reg, name, path, self.clone()))
            .await?;
        Ok(value.clone())
    }
}
