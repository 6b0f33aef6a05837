//! Circular dependency detection infrastructure.
//!
//! Resolution is asynchronous, so the chain of components under construction
//! travels with each [`BuildContext`](crate::BuildContext) instead of living in
//! a thread-local stack.

use std::sync::Arc;

use crate::error::{DiError, DiResult};

pub(crate) const MAX_DEPTH: usize = 256;

/// Immutable chain of component names currently being built.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResolutionPath {
    names: Arc<[String]>,
}

impl ResolutionPath {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the path extended with `name`.
    ///
    /// Fails with [`DiError::Circular`] if `name` is already being built on
    /// this chain, and with [`DiError::DepthExceeded`] past [`MAX_DEPTH`].
    pub(crate) fn enter(&self, name: &str) -> DiResult<ResolutionPath> {
        if self.names.iter().any(|n| n == name) {
            let mut path: Vec<String> = self.names.to_vec();
            path.push(name.to_string());
            return Err(DiError::Circular(path));
        }
        if self.names.len() >= MAX_DEPTH {
            return Err(DiError::DepthExceeded(self.names.len()));
        }

        let mut names = Vec::with_capacity(self.names.len() + 1);
        names.extend(self.names.iter().cloned());
        names.push(name.to_string());
        Ok(Self { names: names.into() })
    }

    pub(crate) fn depth(&self) -> usize {
        self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_reentry() {
        let path = ResolutionPath::new().enter("a").unwrap().enter("b").unwrap();
        match path.enter("a") {
            Err(DiError::Circular(cycle)) => assert_eq!(cycle, vec!["a", "b", "a"]),
            other => panic!("unexpected {:?}", other.map(|p| p.depth())),
        }
    }

    #[test]
    fn sibling_paths_are_independent() {
        let root = ResolutionPath::new().enter("a").unwrap();
        let left = root.enter("b").unwrap();
        let right = root.enter("c").unwrap();
        assert_eq!(left.depth(), 2);
        assert!(right.enter("b").is_ok());
    }

    #[test]
    fn caps_depth() {
        let mut path = ResolutionPath::new();
        for i in 0..MAX_DEPTH {
            path = path.enter(&format!("c{i}")).unwrap();
        }
        assert!(matches!(path.enter("one-more"), Err(DiError::DepthExceeded(_))));
    }
}
