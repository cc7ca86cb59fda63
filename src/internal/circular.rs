//! Per-thread resolution state: the dependency chain and active producers.
//!
//! Cycle detection between singletons lives in the cache (it must see other
//! threads); this module only tracks what the current thread is doing so errors
//! can carry the chain and runaway recursion is cut off.

use std::cell::RefCell;
use std::collections::HashSet;

use crate::error::{DiError, DiResult};

// Thread-local resolution state
thread_local! {
    static RESOLUTION_TLS: RefCell<ResolutionTls> = RefCell::new(ResolutionTls::default());
}

#[derive(Default)]
struct ResolutionTls {
    stack: Vec<String>,
    producing: HashSet<String>,
}

/// Snapshot of the names currently being resolved on this thread, outermost first.
pub(crate) fn current_chain() -> Vec<String> {
    RESOLUTION_TLS.with(|tls| tls.borrow().stack.clone())
}

/// The component whose resolution requested the current one, if any.
pub(crate) fn current_parent() -> Option<String> {
    RESOLUTION_TLS.with(|tls| {
        let tls = tls.borrow();
        let len = tls.stack.len();
        (len >= 2).then(|| tls.stack[len - 2].clone())
    })
}

/// Keeps `name` on the thread's chain for the guard's lifetime.
pub(crate) struct ChainGuard {
    depth: usize,
}

impl ChainGuard {
    pub(crate) fn enter(name: &str, max_depth: usize) -> DiResult<Self> {
        RESOLUTION_TLS.with(|tls| {
            let mut tls = tls.borrow_mut();
            if tls.stack.len() >= max_depth {
                return Err(DiError::DepthExceeded(max_depth));
            }
            tls.stack.push(name.to_string());
            Ok(Self { depth: tls.stack.len() })
        })
    }
}

impl Drop for ChainGuard {
    fn drop(&mut self) {
        RESOLUTION_TLS.with(|tls| {
            let mut tls = tls.borrow_mut();
            debug_assert_eq!(tls.stack.len(), self.depth);
            tls.stack.truncate(self.depth.saturating_sub(1));
        });
    }
}

/// Marks a producer as running `produce()` on this thread.
pub(crate) struct ProducingGuard {
    name: String,
}

impl ProducingGuard {
    /// Returns `None` if the producer is already producing on this thread.
    pub(crate) fn enter(name: &str) -> Option<Self> {
        RESOLUTION_TLS.with(|tls| {
            tls.borrow_mut()
                .producing
                .insert(name.to_string())
                .then(|| Self { name: name.to_string() })
        })
    }
}

impl Drop for ProducingGuard {
    fn drop(&mut self) {
        RESOLUTION_TLS.with(|tls| {
            tls.borrow_mut().producing.remove(&self.name);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_tracks_nesting() {
        let _a = ChainGuard::enter("a", 8).unwrap();
        {
            let _b = ChainGuard::enter("b", 8).unwrap();
            assert_eq!(current_chain(), ["a", "b"]);
            assert_eq!(current_parent().as_deref(), Some("a"));
        }
        assert_eq!(current_parent(), None);
        assert_eq!(current_chain(), ["a"]);
    }

    #[test]
    fn depth_limit_is_enforced() {
        let _a = ChainGuard::enter("a", 2).unwrap();
        let _b = ChainGuard::enter("b", 2).unwrap();
        assert!(matches!(ChainGuard::enter("c", 2), Err(DiError::DepthExceeded(2))));
        assert_eq!(current_chain().len(), 2);
    }

    #[test]
    fn producing_guard_rejects_reentry() {
        let outer = ProducingGuard::enter("p").unwrap();
        assert!(ProducingGuard::enter("p").is_none());
        assert!(ProducingGuard::enter("q").is_some());
        drop(outer);
        assert!(ProducingGuard::enter("p").is_some());
    }
}
