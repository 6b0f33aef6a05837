//! Diagnostic observers for component resolution.
//!
//! Observers receive a callback for every resolution that goes through a
//! container, including cache hits. [`TracingObserver`] forwards them to
//! `tracing`; custom observers can feed metrics or test assertions.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::lifetime::Lifetime;

/// Observer trait for component resolution events.
///
/// Observer calls are made synchronously on the resolving task. Keep
/// implementations lightweight.
///
/// # Examples
///
/// ```
/// use ferrous_invoke::{ComponentSpec, DiError, DiObserver, Lifetime};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct CountingObserver {
///     resolved: AtomicUsize,
/// }
///
/// impl DiObserver for CountingObserver {
///     fn resolving(&self, _name: &str, _lifetime: Lifetime) {}
///
///     fn resolved(&self, _name: &str, _lifetime: Lifetime, _duration: Duration) {
///         self.resolved.fetch_add(1, Ordering::Relaxed);
///     }
///
///     fn resolution_failed(&self, name: &str, error: &DiError) {
///         eprintln!("{} failed: {}", name, error);
///     }
/// }
///
/// let mut spec = ComponentSpec::new();
/// spec.add_observer(Arc::new(CountingObserver::default()));
/// ```
pub trait DiObserver: Send + Sync {
    /// Called when starting to resolve a component.
    fn resolving(&self, name: &str, lifetime: Lifetime);

    /// Called when a component is successfully resolved (built or cached).
    fn resolved(&self, name: &str, lifetime: Lifetime, duration: Duration);

    /// Called when a registered component fails to resolve.
    ///
    /// Covers build errors, lifetime violations such as
    /// [`DiError::ScopedOnRoot`], cycles, and errors of nested dependencies.
    /// Unregistered names fail before any observer is called.
    fn resolution_failed(&self, name: &str, error: &DiError);
}

/// Container for registered observers.
///
/// Designed to have minimal overhead when no observers are registered.
#[derive(Default)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, name: &str, lifetime: Lifetime) {
        for observer in &self.observers {
            observer.resolving(name, lifetime);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, name: &str, lifetime: Lifetime, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(name, lifetime, duration);
        }
    }

    #[inline]
    pub(crate) fn resolution_failed(&self, name: &str, error: &DiError) {
        for observer in &self.observers {
            observer.resolution_failed(name, error);
        }
    }
}

/// Built-in observer that emits resolution events through `tracing`.
///
/// Resolutions are logged at `trace`, failures at `warn`.
///
/// # Examples
///
/// ```
/// use ferrous_invoke::{ComponentSpec, TracingObserver};
/// use std::sync::Arc;
///
/// let mut spec = ComponentSpec::new();
/// spec.add_observer(Arc::new(TracingObserver::new()));
/// ```
#[derive(Debug, Clone)]
pub struct TracingObserver {
    target: &'static str,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self { target: "ferrous_invoke" }
    }

    /// Label attached to every event as the `source` field.
    pub fn with_target(target: &'static str) -> Self {
        Self { target }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for TracingObserver {
    fn resolving(&self, name: &str, lifetime: Lifetime) {
        tracing::trace!(source = self.target, component = name, %lifetime, "resolving");
    }

    fn resolved(&self, name: &str, lifetime: Lifetime, duration: Duration) {
        tracing::trace!(
            source = self.target,
            component = name,
            %lifetime,
            elapsed_us = duration.as_micros() as u64,
            "resolved"
        );
    }

    fn resolution_failed(&self, name: &str, error: &DiError) {
        tracing::warn!(source = self.target, component = name, %error, "resolution failed");
    }
}
