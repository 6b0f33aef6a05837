//! # ferrous-invoke
//!
//! Request-execution core for short-lived, event-triggered functions: a named
//! component container with three lifetime policies and an onion middleware
//! pipeline wired around a single terminal handler.
//!
//! ## Features
//!
//! - **Lifetimes**: Singleton, Scoped, and Transient components resolved by name
//! - **At-most-once singletons**: concurrent first resolutions share one in-flight build
//! - **Scope isolation**: one scope per invocation, scoped instances never leak across
//! - **Circular dependency detection**: cycles fail with the full resolution path
//! - **Onion pipeline**: LIFO middleware with short-circuiting and in-place argument mutation
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_invoke::{ComponentSpec, Resolver};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> ferrous_invoke::DiResult<()> {
//! let mut spec = ComponentSpec::new();
//! spec.add_value("db", Database {
//!     connection_string: "postgres://localhost".to_string(),
//! });
//! spec.add_transient("users", |ctx| async move {
//!     Ok(UserService { db: ctx.resolve::<Database>("db").await? })
//! });
//!
//! let root = spec.build(())?;
//! let users = root.resolve::<UserService>("users").await?;
//! assert_eq!(users.db.connection_string, "postgres://localhost");
//! # Ok(())
//! # }
//! ```
//!
//! ## Component Lifetimes
//!
//! - **Singleton**: Built once per root container and shared with every scope
//! - **Scoped**: Built once per scope (one scope per invocation); an error on the root
//! - **Transient**: Built fresh on every resolution
//!
//! ## Invocations
//!
//! ```rust
//! use ferrous_invoke::{
//!     ComponentSpec, DiError, DiResult, InvocationArg, InvocationContext, Invoker, Pipeline, Resolver,
//! };
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> DiResult<()> {
//! let counter = Arc::new(AtomicU32::new(0));
//! let c = counter.clone();
//!
//! let mut spec = ComponentSpec::new();
//! spec.add_scoped("request_id", move |_| {
//!     let n = c.fetch_add(1, Ordering::SeqCst) + 1;
//!     async move { Ok(format!("req-{}", n)) }
//! });
//! let root = spec.build(())?;
//!
//! let mut pipeline = Pipeline::<InvocationArg<()>, DiResult<String>>::new();
//! pipeline.use_fn(|arg, next| {
//!     Box::pin(async move {
//!         // Both resolutions below share the invocation's scope
//!         arg.services.resolve::<String>("request_id").await?;
//!         next.run(arg).await
//!     })
//! });
//! let invoker = Invoker::new(root, pipeline.handler_fn(|arg| {
//!     Box::pin(async move {
//!         let id = arg.services.resolve::<String>("request_id").await?;
//!         Ok::<_, DiError>(id.to_string())
//!     })
//! }))?;
//!
//! assert_eq!(invoker.invoke((), InvocationContext::new("a", "f")).await?, "req-1");
//! assert_eq!(invoker.invoke((), InvocationContext::new("b", "f")).await?, "req-2");
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod collection;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod invocation;
pub mod lifetime;
pub mod observer;
pub mod pipeline;
pub mod prewarm;
pub mod provider;
pub mod traits;

// Internal modules
mod internal;
mod registration;

// Re-export core types
pub use collection::{create_container, ComponentModule, ComponentSpec, ComponentSpecExt};
pub use config::ContainerConfig;
pub use descriptors::ComponentDescriptor;
pub use error::{BoxError, DiError, DiResult};
pub use invocation::{InvocationArg, InvocationContext, Invoker, ServiceResolver, Services};
pub use lifetime::{Lifetime, ParseLifetimeError};
pub use observer::{DiObserver, TracingObserver};
pub use pipeline::{
    build_pipeline, handler_fn, middleware_fn, CompiledPipeline, FnHandler, FnMiddleware, Handler, Middleware,
    Next, Pipeline,
};
pub use prewarm::{PrewarmReport, PrewarmResult};
pub use provider::{BuildContext, Container};
pub use registration::{AnyArc, Recipe};
pub use traits::{AsyncDispose, Dispose, Resolver, ResolverCore};
