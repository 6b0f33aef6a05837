//! Disposal traits for resource cleanup.

/// Trait for synchronous resource disposal.
///
/// Implement this trait for components that need structured teardown (flushing
/// buffers, releasing handles). Hooks are registered from a recipe through
/// [`BuildContext::register_disposer`](crate::BuildContext::register_disposer)
/// and run in LIFO order by [`Container::dispose_all`](crate::Container::dispose_all).
///
/// # Examples
///
/// ```
/// use ferrous_invoke::{ComponentSpec, Dispose};
/// use std::sync::Arc;
///
/// struct Cache {
///     name: String,
/// }
///
/// impl Dispose for Cache {
///     fn dispose(&self) {
///         println!("Flushing cache: {}", self.name);
///     }
/// }
///
/// let mut spec = ComponentSpec::new();
/// spec.add_scoped("cache", |ctx| async move {
///     let cache = Arc::new(Cache { name: "user_cache".to_string() });
///     ctx.register_disposer(cache.clone());
///     Ok(cache)
/// });
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}

/// Trait for asynchronous resource disposal.
///
/// Async hooks run before sync hooks, each group in LIFO order.
///
/// # Examples
///
/// ```
/// use ferrous_invoke::{AsyncDispose, ComponentSpec};
/// use async_trait::async_trait;
/// use std::sync::Arc;
///
/// struct DatabaseClient {
///     connection_id: String,
/// }
///
/// #[async_trait]
/// impl AsyncDispose for DatabaseClient {
///     async fn dispose(&self) {
///         println!("Closing database connection: {}", self.connection_id);
///     }
/// }
///
/// let mut spec = ComponentSpec::new();
/// spec.add_singleton("db", |ctx| async move {
///     let client = Arc::new(DatabaseClient { connection_id: "conn_123".to_string() });
///     ctx.register_async_disposer(client.clone());
///     Ok(client)
/// });
/// ```
#[async_trait::async_trait]
pub trait AsyncDispose: Send + Sync + 'static {
    /// Perform asynchronous cleanup of resources.
    async fn dispose(&self);
}
