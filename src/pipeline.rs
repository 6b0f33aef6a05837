//! Onion middleware pipeline.
//!
//! A [`Pipeline`] accumulates middleware in declaration order and compiles
//! them with a terminal [`Handler`] into one [`CompiledPipeline`]. The first
//! declared middleware is outermost: it runs first on the way in and last on
//! the way out.
//!
//! The pipeline is generic over the argument `A` threaded through the chain
//! (mutable in place) and the result `R`. The pipeline never inspects `R`;
//! failures are expressed by choosing `R = Result<T, E>` and are returned
//! exactly as the handler or a short-circuiting middleware produced them.

use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::BoxFuture;

type Step<A, R> = Arc<dyn for<'a> Fn(&'a mut A) -> BoxFuture<'a, R> + Send + Sync>;

fn step<A, R, F>(f: F) -> Step<A, R>
where
    F: for<'a> Fn(&'a mut A) -> BoxFuture<'a, R> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A cross-cutting behavior wrapped around the rest of the pipeline.
///
/// A middleware may mutate `arg` before calling `next` (visible downstream),
/// inspect or replace the result `next` produced, recover from a failed
/// result, or return without calling `next` at all to short-circuit.
///
/// # Examples
///
/// ```
/// use ferrous_invoke::{Middleware, Next};
/// use async_trait::async_trait;
///
/// struct Uppercase;
///
/// #[async_trait]
/// impl Middleware<String, String> for Uppercase {
///     async fn handle(&self, arg: &mut String, next: Next<String, String>) -> String {
///         next.run(arg).await.to_uppercase()
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait Middleware<A, R>: Send + Sync {
    async fn handle(&self, arg: &mut A, next: Next<A, R>) -> R;
}

/// Terminal handler at the center of the pipeline.
#[async_trait::async_trait]
pub trait Handler<A, R>: Send + Sync {
    async fn call(&self, arg: &mut A) -> R;
}

/// The rest of the pipeline as seen from one middleware.
///
/// `run` consumes `Next`, so the downstream chain runs at most once per
/// invocation.
pub struct Next<A, R> {
    step: Step<A, R>,
}

impl<A, R> Next<A, R>
where
    A: Send + 'static,
    R: Send + 'static,
{
    /// Runs every downstream middleware and the handler.
    pub async fn run(self, arg: &mut A) -> R {
        (self.step)(arg).await
    }
}

impl<A, R> std::fmt::Debug for Next<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Next")
    }
}

/// Middleware built from a closure, see [`middleware_fn`].
pub struct FnMiddleware<F, A, R> {
    f: F,
    _marker: PhantomData<fn(A) -> R>,
}

/// Wraps a closure as a [`Middleware`].
///
/// The closure returns a boxed future borrowing the argument:
///
/// ```
/// use ferrous_invoke::{middleware_fn, Pipeline};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut pipeline = Pipeline::<Vec<&'static str>, usize>::new();
/// pipeline.use_middleware(middleware_fn::<Vec<&'static str>, usize, _>(|arg, next| {
///     Box::pin(async move {
///         arg.push("outer");
///         next.run(arg).await + 1
///     })
/// }));
/// let compiled = pipeline.handler_fn(|arg| Box::pin(async move { arg.len() }));
///
/// let mut arg = Vec::new();
/// assert_eq!(compiled.invoke(&mut arg).await, 2);
/// # }
/// ```
pub fn middleware_fn<A, R, F>(f: F) -> FnMiddleware<F, A, R>
where
    F: for<'a> Fn(&'a mut A, Next<A, R>) -> BoxFuture<'a, R> + Send + Sync + 'static,
{
    FnMiddleware {
        f,
        _marker: PhantomData,
    }
}

#[async_trait::async_trait]
impl<A, R, F> Middleware<A, R> for FnMiddleware<F, A, R>
where
    A: Send + 'static,
    R: Send + 'static,
    F: for<'a> Fn(&'a mut A, Next<A, R>) -> BoxFuture<'a, R> + Send + Sync + 'static,
{
    async fn handle(&self, arg: &mut A, next: Next<A, R>) -> R {
        (self.f)(arg, next).await
    }
}

/// Handler built from a closure, see [`handler_fn`].
pub struct FnHandler<F, A, R> {
    f: F,
    _marker: PhantomData<fn(A) -> R>,
}

/// Wraps a closure as a [`Handler`].
pub fn handler_fn<A, R, F>(f: F) -> FnHandler<F, A, R>
where
    F: for<'a> Fn(&'a mut A) -> BoxFuture<'a, R> + Send + Sync + 'static,
{
    FnHandler {
        f,
        _marker: PhantomData,
    }
}

#[async_trait::async_trait]
impl<A, R, F> Handler<A, R> for FnHandler<F, A, R>
where
    A: Send + 'static,
    R: Send + 'static,
    F: for<'a> Fn(&'a mut A) -> BoxFuture<'a, R> + Send + Sync + 'static,
{
    async fn call(&self, arg: &mut A) -> R {
        (self.f)(arg).await
    }
}

/// Ordered list of middleware awaiting a terminal handler.
///
/// # Examples
///
/// ```
/// use ferrous_invoke::{Middleware, Next, Pipeline};
/// use async_trait::async_trait;
///
/// struct Marker(&'static str);
///
/// #[async_trait]
/// impl Middleware<Vec<String>, &'static str> for Marker {
///     async fn handle(&self, log: &mut Vec<String>, next: Next<Vec<String>, &'static str>) -> &'static str {
///         log.push(format!("{}-pre", self.0));
///         let result = next.run(log).await;
///         log.push(format!("{}-post", self.0));
///         result
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut pipeline = Pipeline::<Vec<String>, &'static str>::new();
/// pipeline.use_middleware(Marker("m1")).use_middleware(Marker("m2"));
/// let compiled = pipeline.handler_fn(|log| {
///     Box::pin(async move {
///         log.push("h".to_string());
///         "result"
///     })
/// });
///
/// let mut log = Vec::new();
/// assert_eq!(compiled.invoke(&mut log).await, "result");
/// assert_eq!(log, ["m1-pre", "m2-pre", "h", "m2-post", "m1-post"]);
/// # }
/// ```
pub struct Pipeline<A, R> {
    middleware: Vec<Arc<dyn Middleware<A, R>>>,
}

impl<A, R> Pipeline<A, R>
where
    A: Send + 'static,
    R: Send + 'static,
{
    pub fn new() -> Self {
        Self { middleware: Vec::new() }
    }

    /// Appends one middleware.
    pub fn use_middleware<M>(&mut self, middleware: M) -> &mut Self
    where
        M: Middleware<A, R> + 'static,
    {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Appends a closure middleware, see [`middleware_fn`].
    pub fn use_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut A, Next<A, R>) -> BoxFuture<'a, R> + Send + Sync + 'static,
    {
        self.use_middleware(middleware_fn(f))
    }

    /// Appends a shared middleware.
    pub fn use_shared(&mut self, middleware: Arc<dyn Middleware<A, R>>) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    /// Appends several middleware, preserving their order.
    pub fn use_all<I>(&mut self, middleware: I) -> &mut Self
    where
        I: IntoIterator<Item = Arc<dyn Middleware<A, R>>>,
    {
        self.middleware.extend(middleware);
        self
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Compiles the middleware and `handler` into one invocable pipeline.
    ///
    /// Compilation is a pure fold from the handler outwards; the builder stays
    /// usable and can compile again with another handler.
    pub fn handler<H>(&self, handler: H) -> CompiledPipeline<A, R>
    where
        H: Handler<A, R> + 'static,
    {
        compile(&self.middleware, Arc::new(handler))
    }

    /// Compiles with a closure handler, see [`handler_fn`].
    pub fn handler_fn<F>(&self, f: F) -> CompiledPipeline<A, R>
    where
        F: for<'a> Fn(&'a mut A) -> BoxFuture<'a, R> + Send + Sync + 'static,
    {
        self.handler(handler_fn(f))
    }
}

impl<A, R> Default for Pipeline<A, R>
where
    A: Send + 'static,
    R: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R> Clone for Pipeline<A, R> {
    fn clone(&self) -> Self {
        Self {
            middleware: self.middleware.clone(),
        }
    }
}

/// Compiles `middleware` around `handler` in one call.
pub fn build_pipeline<A, R, H>(middleware: Vec<Arc<dyn Middleware<A, R>>>, handler: H) -> CompiledPipeline<A, R>
where
    A: Send + 'static,
    R: Send + 'static,
    H: Handler<A, R> + 'static,
{
    compile(&middleware, Arc::new(handler))
}

fn compile<A, R>(middleware: &[Arc<dyn Middleware<A, R>>], handler: Arc<dyn Handler<A, R>>) -> CompiledPipeline<A, R>
where
    A: Send + 'static,
    R: Send + 'static,
{
    let mut next: Step<A, R> = step(move |arg| {
        let handler = handler.clone();
        Box::pin(async move { handler.call(arg).await })
    });

    for mw in middleware.iter().rev() {
        let mw = mw.clone();
        let inner = next;
        next = step(move |arg| {
            let mw = mw.clone();
            let next = Next { step: inner.clone() };
            Box::pin(async move { mw.handle(arg, next).await })
        });
    }

    tracing::debug!(middleware = middleware.len(), "pipeline compiled");
    CompiledPipeline {
        entry: next,
        middleware_count: middleware.len(),
    }
}

/// A compiled pipeline: middleware folded around a terminal handler.
///
/// Cheap to clone; every clone runs the same chain.
pub struct CompiledPipeline<A, R> {
    entry: Step<A, R>,
    middleware_count: usize,
}

impl<A, R> CompiledPipeline<A, R>
where
    A: Send + 'static,
    R: Send + 'static,
{
    /// Runs the chain once for `arg`.
    pub async fn invoke(&self, arg: &mut A) -> R {
        (self.entry)(arg).await
    }

    /// Number of middleware wrapped around the handler.
    pub fn middleware_count(&self) -> usize {
        self.middleware_count
    }
}

impl<A, R> Clone for CompiledPipeline<A, R> {
    fn clone(&self) -> Self {
        Self {
            entry: self.entry.clone(),
            middleware_count: self.middleware_count,
        }
    }
}

impl<A, R> std::fmt::Debug for CompiledPipeline<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledPipeline")
            .field("middleware_count", &self.middleware_count)
            .finish()
    }
}
