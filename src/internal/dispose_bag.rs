//! Internal disposal bag for component teardown.

use std::future::Future;
use std::pin::Pin;

/// Future type for disposal operations.
pub(crate) type BoxFutureUnit = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A single teardown action produced for a finished component.
pub(crate) enum Teardown {
    Sync(Box<dyn FnOnce() + Send>),
    Async(Box<dyn FnOnce() -> BoxFutureUnit + Send>),
}

/// Container for teardown hooks with LIFO execution order.
///
/// Hooks are pushed as components finish, so popping runs dependents before
/// their dependencies. Async hooks are executed first, followed by sync hooks.
#[derive(Default)]
pub(crate) struct DisposeBag {
    sync: Vec<(String, Box<dyn FnOnce() + Send>)>,
    asyncs: Vec<(String, Box<dyn FnOnce() -> BoxFutureUnit + Send>)>,
}

impl DisposeBag {
    pub(crate) fn push(&mut self, name: &str, teardown: Teardown) {
        match teardown {
            Teardown::Sync(f) => self.sync.push((name.to_string(), f)),
            Teardown::Async(f) => self.asyncs.push((name.to_string(), f)),
        }
    }

    /// Execute all sync hooks in reverse order (LIFO).
    pub(crate) fn run_all_sync_reverse(&mut self) {
        while let Some((name, f)) = self.sync.pop() {
            tracing::trace!(component = %name, "running teardown");
            (f)();
        }
    }

    /// Execute all async hooks in reverse order (LIFO).
    pub(crate) async fn run_all_async_reverse(&mut self) {
        while let Some((name, f)) = self.asyncs.pop() {
            tracing::trace!(component = %name, "running async teardown");
            (f)().await;
        }
    }

    /// Moves the hooks registered for `names` into a new bag, keeping order.
    pub(crate) fn take_named(&mut self, names: &[String]) -> DisposeBag {
        let wanted = |name: &String| names.contains(name);
        let (sync, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.sync).into_iter().partition(|(n, _)| wanted(n));
        self.sync = kept;
        let (asyncs, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.asyncs).into_iter().partition(|(n, _)| wanted(n));
        self.asyncs = kept;
        DisposeBag { sync, asyncs }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sync.is_empty() && self.asyncs.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.sync.len() + self.asyncs.len()
    }
}
