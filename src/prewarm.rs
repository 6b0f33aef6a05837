//! Cold-start prewarming of singleton components.

use std::time::Duration;

use crate::error::{DiError, DiResult};

/// Outcome of prewarming a single component.
#[derive(Debug, Clone)]
pub struct PrewarmResult {
    /// The component that was built
    pub name: String,
    /// Error if the build failed
    pub error: Option<DiError>,
    /// Time taken to build (or to find it already built)
    pub duration: Duration,
}

impl PrewarmResult {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Report returned by [`Container::prewarm`](crate::Container::prewarm).
///
/// # Examples
///
/// ```
/// use ferrous_invoke::ComponentSpec;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> ferrous_invoke::DiResult<()> {
/// let mut spec = ComponentSpec::new();
/// spec.add_singleton("model", |_| async { Ok(vec![0.5f32; 16]) });
/// spec.prewarm("model");
///
/// let root = spec.build(())?;
/// let report = root.prewarm().await;
/// assert!(report.is_ready());
/// assert_eq!(report.results.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PrewarmReport {
    /// One entry per prewarmed component, in declaration order
    pub results: Vec<PrewarmResult>,
    /// Total time spent prewarming
    pub total_duration: Duration,
}

impl PrewarmReport {
    pub(crate) fn record(&mut self, name: String, result: DiResult<()>, duration: Duration) {
        if let Err(error) = &result {
            tracing::warn!(component = %name, %error, "prewarm failed");
        }
        self.total_duration += duration;
        self.results.push(PrewarmResult {
            name,
            error: result.err(),
            duration,
        });
    }

    /// True if every prewarmed component was built.
    pub fn is_ready(&self) -> bool {
        self.results.iter().all(PrewarmResult::success)
    }

    /// Results of the components that failed to build.
    pub fn failures(&self) -> impl Iterator<Item = &PrewarmResult> {
        self.results.iter().filter(|r| !r.success())
    }

    /// Converts the report into the first failure, if any.
    pub fn into_result(self) -> DiResult<()> {
        match self.results.into_iter().find_map(|r| r.error) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
