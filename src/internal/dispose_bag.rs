//! Internal disposal bag for managing cleanup hooks.

use std::future::Future;

use futures::future::BoxFuture;

/// Future type for disposal operations.
pub(crate) type BoxFutureUnit = BoxFuture<'static, ()>;

/// Container for disposal hooks with LIFO execution order.
///
/// Async hooks are executed first (in reverse order), followed by sync hooks.
#[derive(Default)]
pub(crate) struct DisposeBag {
    sync: Vec<Box<dyn FnOnce() + Send>>,
    asyncs: Vec<Box<dyn FnOnce() -> BoxFutureUnit + Send>>,
}

impl DisposeBag {
    pub(crate) fn push_sync(&mut self, f: Box<dyn FnOnce() + Send>) {
        self.sync.push(f);
    }

    pub(crate) fn push_async<Fut, F>(&mut self, f: F)
    where
        Fut: Future<Output = ()> + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
    {
        self.asyncs.push(Box::new(move || Box::pin(f())));
    }

    /// Moves every hook of `other` to the end of this bag.
    pub(crate) fn append(&mut self, mut other: DisposeBag) {
        self.sync.append(&mut other.sync);
        self.asyncs.append(&mut other.asyncs);
    }

    /// Moves every hook out, leaving the bag empty.
    pub(crate) fn take(&mut self) -> DisposeBag {
        std::mem::take(self)
    }

    /// Runs async hooks then sync hooks, each in reverse registration order.
    pub(crate) async fn run_all_reverse(mut self) {
        while let Some(f) = self.asyncs.pop() {
            (f)().await;
        }
        while let Some(f) = self.sync.pop() {
            (f)();
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sync.is_empty() && self.asyncs.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.sync.len() + self.asyncs.len()
    }
}
