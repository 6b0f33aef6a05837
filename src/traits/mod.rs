//! Core traits for the component container.

mod dispose;
mod resolver;

pub use dispose::{AsyncDispose, Dispose};
pub use resolver::{Resolver, ResolverCore};
pub(crate) use resolver::downcast;
