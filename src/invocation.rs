//! Invocation glue between the container and the pipeline.
//!
//! Every triggering event gets a fresh scope, a [`Services`] surface bound to
//! that scope, and one run of the compiled pipeline over an
//! [`InvocationArg`].

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::Instrument;

use crate::error::{DiError, DiResult};
use crate::pipeline::CompiledPipeline;
use crate::provider::Container;
use crate::registration::AnyArc;
use crate::traits::ResolverCore;

/// Zero-argument resolver for one named component.
pub type ServiceResolver = Arc<dyn Fn() -> BoxFuture<'static, DiResult<AnyArc>> + Send + Sync>;

/// Per-invocation metadata supplied by the platform adapter.
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    pub request_id: String,
    pub function_name: String,
    /// Point in time after which the platform abandons the invocation
    pub deadline: Option<Instant>,
    /// Free-form values shared between middleware and handler
    pub values: HashMap<String, Value>,
}

impl InvocationContext {
    pub fn new(request_id: impl Into<String>, function_name: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            function_name: function_name.into(),
            ..Self::default()
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining_time(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

/// Resolver surface handed to middleware and handler as `services`.
///
/// Holds one zero-argument resolver per registered component, each bound to
/// the invocation's scope. Middleware may add or replace entries; the change
/// is visible to everything downstream in the same invocation only.
///
/// # Examples
///
/// ```
/// use ferrous_invoke::{ComponentSpec, Resolver, Services};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ferrous_invoke::DiResult<()> {
/// let mut spec = ComponentSpec::new();
/// spec.add_scoped("user", |_| async { Ok(String::from("anonymous")) });
///
/// let root = spec.build(())?;
/// let mut services = Services::from_container(&root.scope()?);
/// assert_eq!(*services.resolve::<String>("user").await?, "anonymous");
///
/// services.insert_value("user", String::from("alice"));
/// assert_eq!(*services.resolve::<String>("user").await?, "alice");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Services {
    container: Container,
    resolvers: BTreeMap<String, ServiceResolver>,
}

impl Services {
    /// Binds a resolver for every registered component to `container`.
    pub fn from_container(container: &Container) -> Self {
        let resolvers = container
            .names()
            .map(|name| (name.to_string(), bind(container.clone(), name.to_string())))
            .collect();
        Self {
            container: container.clone(),
            resolvers,
        }
    }

    /// The container level the resolvers were bound to.
    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn resolver(&self, name: &str) -> Option<ServiceResolver> {
        self.resolvers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolvers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resolvers.keys().map(String::as_str)
    }

    /// Adds or replaces a resolver returning a fixed value.
    pub fn insert_value<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) -> &mut Self {
        let value: AnyArc = Arc::new(value);
        let resolver: ServiceResolver = Arc::new(move || -> BoxFuture<'static, DiResult<AnyArc>> {
            let value = value.clone();
            Box::pin(async move { Ok(value) })
        });
        self.resolvers.insert(name.into(), resolver);
        self
    }

    /// Adds or replaces a resolver.
    pub fn insert_resolver(&mut self, name: impl Into<String>, resolver: ServiceResolver) -> &mut Self {
        self.resolvers.insert(name.into(), resolver);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<ServiceResolver> {
        self.resolvers.remove(name)
    }
}

fn bind(container: Container, name: String) -> ServiceResolver {
    Arc::new(move || -> BoxFuture<'static, DiResult<AnyArc>> {
        let container = container.clone();
        let name = name.clone();
        Box::pin(async move { container.resolve_any(&name).await })
    })
}

#[async_trait::async_trait]
impl ResolverCore for Services {
    async fn resolve_any(&self, name: &str) -> DiResult<AnyArc> {
        let resolver = self
            .resolvers
            .get(name)
            .ok_or_else(|| DiError::NotFound(name.to_string()))?;
        resolver().await
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("names", &self.resolvers.keys().collect::<Vec<_>>())
            .field("is_root", &self.container.is_root())
            .finish()
    }
}

/// The argument threaded through the pipeline for one invocation.
#[derive(Debug)]
pub struct InvocationArg<E> {
    pub event: E,
    pub context: InvocationContext,
    pub services: Services,
}

impl<E> InvocationArg<E> {
    pub fn new(event: E, context: InvocationContext, services: Services) -> Self {
        Self {
            event,
            context,
            services,
        }
    }
}

/// Owns the root container and one compiled pipeline for the process
/// lifetime, running the pipeline once per event.
///
/// # Examples
///
/// ```
/// use ferrous_invoke::{ComponentSpec, DiError, DiResult, InvocationArg, InvocationContext, Invoker, Pipeline, Resolver};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ferrous_invoke::DiResult<()> {
/// let mut spec = ComponentSpec::new();
/// spec.add_value("greeting", String::from("hello"));
/// let root = spec.build(())?;
///
/// let pipeline = Pipeline::<InvocationArg<String>, DiResult<String>>::new();
/// let compiled = pipeline.handler_fn(|arg| {
///     Box::pin(async move {
///         let greeting = arg.services.resolve::<String>("greeting").await?;
///         Ok::<_, DiError>(format!("{} {}", greeting, arg.event))
///     })
/// });
///
/// let invoker = Invoker::new(root, compiled)?;
/// let reply = invoker.invoke("world".to_string(), InvocationContext::new("req-1", "greet")).await?;
/// assert_eq!(reply, "hello world");
/// # Ok(())
/// # }
/// ```
pub struct Invoker<E, R> {
    root: Container,
    pipeline: CompiledPipeline<InvocationArg<E>, R>,
}

impl<E, R> Invoker<E, R>
where
    E: Send + 'static,
    R: Send + 'static,
{
    /// Fails with [`DiError::WrongLifetime`] unless `root` is a root container.
    pub fn new(root: Container, pipeline: CompiledPipeline<InvocationArg<E>, R>) -> DiResult<Self> {
        if !root.is_root() {
            return Err(DiError::WrongLifetime(
                "an invoker must own the root container, not a scope".to_string(),
            ));
        }
        Ok(Self { root, pipeline })
    }

    pub fn root(&self) -> &Container {
        &self.root
    }

    pub fn pipeline(&self) -> &CompiledPipeline<InvocationArg<E>, R> {
        &self.pipeline
    }

    /// Runs the pipeline once for `event` in a fresh scope.
    ///
    /// The invocation always gets its own scope level, even when no component
    /// is Scoped, so hooks registered by Transient builds belong to the
    /// invocation rather than the root. Those hooks run after the pipeline
    /// settles. If the invocation future is dropped before that, the scope is
    /// discarded without running them.
    pub async fn invoke(&self, event: E, context: InvocationContext) -> R {
        let span = tracing::debug_span!(
            "invocation",
            request_id = %context.request_id,
            function_name = %context.function_name,
        );

        async move {
            let scope = self.root.new_scope();
            let services = Services::from_container(&scope);
            let mut arg = InvocationArg::new(event, context, services);

            let result = self.pipeline.invoke(&mut arg).await;

            drop(arg);
            scope.dispose_all().await;
            tracing::trace!("invocation settled");
            result
        }
        .instrument(span)
        .await
    }
}

impl<E, R> Clone for Invoker<E, R> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            pipeline: self.pipeline.clone(),
        }
    }
}

impl<E, R> std::fmt::Debug for Invoker<E, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker")
            .field("root", &self.root)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::ComponentSpec;
    use crate::traits::Resolver;

    #[test]
    fn remaining_time_saturates() {
        let ctx = InvocationContext::new("r", "f").with_deadline(Instant::now() - Duration::from_secs(1));
        assert_eq!(ctx.remaining_time(), Some(Duration::ZERO));
        assert_eq!(InvocationContext::default().remaining_time(), None);
    }

    #[test]
    fn context_values() {
        let mut ctx = InvocationContext::new("r", "f");
        assert!(ctx.set("user", Value::from("alice")).is_none());
        assert_eq!(ctx.get("user"), Some(&Value::from("alice")));
    }

    #[tokio::test]
    async fn services_cover_every_component() {
        let mut spec = ComponentSpec::new();
        spec.add_value("a", 1u8);
        spec.add_scoped("b", |_| async { Ok(2u8) });
        let scope = spec.build(()).unwrap().scope().unwrap();

        let services = Services::from_container(&scope);
        assert_eq!(services.names().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(*services.resolve::<u8>("b").await.unwrap(), 2);
        assert!(matches!(
            services.resolve::<u8>("c").await,
            Err(DiError::NotFound(n)) if n == "c"
        ));
    }

    #[tokio::test]
    async fn services_share_the_scope_cache() {
        let mut spec = ComponentSpec::new();
        spec.add_scoped("b", |_| async { Ok(String::from("b")) });
        let scope = spec.build(()).unwrap().scope().unwrap();

        let services = Services::from_container(&scope);
        let via_services = services.resolve::<String>("b").await.unwrap();
        let via_scope = scope.resolve::<String>("b").await.unwrap();
        assert!(Arc::ptr_eq(&via_services, &via_scope));
    }

    #[tokio::test]
    async fn removed_resolver_is_not_found() {
        let root = ComponentSpec::new().build(()).unwrap();
        let mut services = Services::from_container(&root);
        services.insert_value("x", 5i32);
        assert!(services.contains("x"));
        services.remove("x");
        assert_eq!(services.try_resolve::<i32>("x").await.unwrap(), None);
    }
}
