//! Error types for the component container.

use std::sync::Arc;

/// Boxed error returned by component build functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Container errors
///
/// Represents the conditions that can occur while declaring components,
/// creating containers or resolving components. Specification defects
/// (`UnknownLifetime`, `ScopedOnRoot`, `WrongLifetime`, `Circular`) point at a
/// wiring bug; `Build` carries the failure of a component's own build function.
///
/// # Examples
///
/// ```rust
/// use ferrous_invoke::{ComponentSpec, DiError, Resolver};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let root = ComponentSpec::new().build(()).unwrap();
/// match root.resolve::<String>("missing").await {
///     Err(DiError::NotFound(name)) => assert_eq!(name, "missing"),
///     _ => unreachable!(),
/// }
/// # }
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum DiError {
    /// Component not registered
    #[error("component not found: {0}")]
    NotFound(String),
    /// Downcast of a resolved component failed
    #[error("type mismatch for component `{name}`: expected {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
    },
    /// A Scoped component was resolved on the root container
    #[error("scoped component `{0}` cannot be resolved from the root container")]
    ScopedOnRoot(String),
    /// Invalid lifetime use (nested scopes, prewarming a non-singleton)
    #[error("lifetime error: {0}")]
    WrongLifetime(String),
    /// A recipe declared a lifetime tag that is not recognized
    #[error("component `{component}` declares unknown lifetime `{tag}`")]
    UnknownLifetime { component: String, tag: String },
    /// Circular dependency detected (includes path)
    #[error("circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<String>),
    /// Maximum resolution depth exceeded
    #[error("max resolution depth {0} exceeded")]
    DepthExceeded(usize),
    /// A component's build function failed
    #[error("failed to build component `{name}`: {source}")]
    Build {
        name: String,
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync + 'static>,
    },
    /// Root options were requested with a different type than they were created with
    #[error("container options are not of type {expected}")]
    OptionsType { expected: &'static str },
    /// Invalid configuration input
    #[error("configuration error: {0}")]
    Config(String),
}

impl DiError {
    pub(crate) fn build(name: &str, source: BoxError) -> Self {
        DiError::Build {
            name: name.to_string(),
            source: Arc::from(source),
        }
    }

    /// Returns true for errors that indicate a wiring defect rather than a
    /// runtime failure of a build function.
    pub fn is_specification_defect(&self) -> bool {
        matches!(
            self,
            DiError::ScopedOnRoot(_)
                | DiError::WrongLifetime(_)
                | DiError::UnknownLifetime { .. }
                | DiError::Circular(_)
                | DiError::DepthExceeded(_)
        )
    }
}

/// Result type for container operations
pub type DiResult<T> = Result<T, DiError>;
