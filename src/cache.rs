//! Tiered singleton cache.
//!
//! Three tiers per name, promoted monotonically:
//!
//! - early factory: registered right after the raw instance exists; computes the
//!   early reference (running the early-reference hooks) at most once
//! - early: the reference handed out to components that hit a cycle
//! - finished: the fully initialized singleton
//!
//! The cache also owns creation ownership. A name being created has exactly one
//! owner thread; other threads block on a condition variable until the owner
//! finishes or fails. A thread that would wait on a name whose owner is
//! (transitively) waiting on it is told to treat the name as a local cycle
//! instead, which is how cross-thread cycles avoid deadlock.
//!
//! The mutex only guards tier transitions. No user code runs under it.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use once_cell::sync::OnceCell;
use parking_lot::{Condvar, Mutex};

use crate::bean::Bean;
use crate::error::{BoxError, DiError, DiResult, Stage};

type EarlyFn = dyn Fn() -> DiResult<Bean> + Send + Sync;

/// Produces the early reference of one creation attempt, once.
pub(crate) struct EarlyFactory {
    compute: Box<EarlyFn>,
    memo: OnceCell<Bean>,
}

impl EarlyFactory {
    pub(crate) fn new(compute: impl Fn() -> DiResult<Bean> + Send + Sync + 'static) -> Self {
        Self { compute: Box::new(compute), memo: OnceCell::new() }
    }

    /// Concurrent callers block until the first computation is done and then
    /// all observe the same reference.
    pub(crate) fn get(&self) -> DiResult<Bean> {
        self.memo.get_or_try_init(|| (self.compute)()).cloned()
    }

    fn peek(&self) -> Option<&Bean> {
        self.memo.get()
    }
}

/// Outcome of [`SingletonCache::acquire`].
pub(crate) enum Acquired {
    /// Already finished.
    Finished(Bean),
    /// Being created by this thread (or one that waits on it); an early
    /// reference is already available.
    Early(Bean),
    /// Being created by this thread (or one that waits on it); promote the
    /// factory to obtain the early reference.
    EarlyFactory(Arc<EarlyFactory>),
    /// The caller now owns the creation.
    Owner(CreationGuard),
}

/// Why [`SingletonCache::acquire`] could not hand out the name.
#[derive(Debug)]
pub(crate) enum AcquireError {
    /// Local cycle with no early reference available.
    Cycle,
    /// Waited past the deadline for another thread.
    Timeout(Duration),
    /// The owner thread failed; its error is shared with waiters.
    Failed(DiError),
}

struct Creation {
    owner: ThreadId,
    attempt: u64,
    waiters: usize,
}

struct SharedFailure {
    error: DiError,
    remaining: usize,
}

#[derive(Default)]
struct CacheState {
    finished: HashMap<String, Bean>,
    finish_order: Vec<String>,
    early: HashMap<String, Bean>,
    early_factories: HashMap<String, Arc<EarlyFactory>>,
    in_creation: HashMap<String, Creation>,
    // thread -> name it is blocked on
    waiting: HashMap<ThreadId, String>,
    failures: HashMap<u64, SharedFailure>,
    // dependency -> components that resolved it while being created
    dependents: HashMap<String, HashSet<String>>,
    // early references replaced by a different finished instance
    superseded: Vec<Bean>,
    next_attempt: u64,
}

impl CacheState {
    fn would_deadlock(&self, owner: ThreadId, me: ThreadId) -> bool {
        let mut current = owner;
        for _ in 0..=self.waiting.len() {
            if current == me {
                return true;
            }
            let Some(name) = self.waiting.get(&current) else {
                return false;
            };
            let Some(creation) = self.in_creation.get(name) else {
                return false;
            };
            current = creation.owner;
        }
        false
    }

    fn local_cycle(&self, name: &str) -> Result<Acquired, AcquireError> {
        if let Some(bean) = self.early.get(name) {
            return Ok(Acquired::Early(bean.clone()));
        }
        match self.early_factories.get(name) {
            Some(factory) => Ok(Acquired::EarlyFactory(factory.clone())),
            None => Err(AcquireError::Cycle),
        }
    }

    fn take_failure(&mut self, attempt: u64) -> Option<DiError> {
        let shared = self.failures.get_mut(&attempt)?;
        shared.remaining = shared.remaining.saturating_sub(1);
        let error = shared.error.clone();
        if shared.remaining == 0 {
            self.failures.remove(&attempt);
        }
        Some(error)
    }

    fn stop_watching(&mut self, name: &str, attempt: u64) {
        if let Some(creation) = self.in_creation.get_mut(name) {
            if creation.attempt == attempt {
                creation.waiters = creation.waiters.saturating_sub(1);
            }
        }
    }
}

/// The singleton tiers plus creation ownership.
pub(crate) struct SingletonCache {
    state: Mutex<CacheState>,
    changed: Condvar,
}

impl SingletonCache {
    pub(crate) fn new() -> Self {
        Self { state: Mutex::new(CacheState::default()), changed: Condvar::new() }
    }

    pub(crate) fn get_finished(&self, name: &str) -> Option<Bean> {
        self.state.lock().finished.get(name).cloned()
    }

    pub(crate) fn is_finished(&self, name: &str) -> bool {
        self.state.lock().finished.contains_key(name)
    }

    /// Names of finished singletons, in finish order.
    pub(crate) fn finished_names(&self) -> Vec<String> {
        self.state.lock().finish_order.clone()
    }

    /// Claims `name` for creation, or reports how the caller should proceed.
    pub(crate) fn acquire(self: &Arc<Self>, name: &str, timeout: Option<Duration>) -> Result<Acquired, AcquireError> {
        let me = thread::current().id();
        let started = Instant::now();
        let deadline = timeout.map(|t| started + t);
        let mut state = self.state.lock();
        // attempt this thread registered itself as a waiter on
        let mut watched: Option<u64> = None;

        loop {
            if let Some(attempt) = watched {
                let still_running = state.in_creation.get(name).is_some_and(|c| c.attempt == attempt);
                if !still_running {
                    watched = None;
                    if let Some(error) = state.take_failure(attempt) {
                        return Err(AcquireError::Failed(error));
                    }
                }
            }

            if let Some(bean) = state.finished.get(name) {
                return Ok(Acquired::Finished(bean.clone()));
            }

            let (owner, attempt) = match state.in_creation.get(name) {
                None => {
                    let attempt = state.next_attempt;
                    state.next_attempt += 1;
                    state.in_creation.insert(
                        name.to_string(),
                        Creation { owner: me, attempt, waiters: 0 },
                    );
                    return Ok(Acquired::Owner(CreationGuard {
                        cache: Arc::clone(self),
                        name: name.to_string(),
                        attempt,
                        done: false,
                    }));
                }
                Some(creation) => (creation.owner, creation.attempt),
            };

            if owner == me || state.would_deadlock(owner, me) {
                if let Some(attempt) = watched {
                    state.stop_watching(name, attempt);
                }
                return state.local_cycle(name);
            }

            if watched != Some(attempt) {
                if let Some(creation) = state.in_creation.get_mut(name) {
                    creation.waiters += 1;
                }
                watched = Some(attempt);
            }

            state.waiting.insert(me, name.to_string());
            let timed_out = match deadline {
                Some(deadline) => self.changed.wait_until(&mut state, deadline).timed_out(),
                None => {
                    self.changed.wait(&mut state);
                    false
                }
            };
            state.waiting.remove(&me);

            if timed_out && state.in_creation.get(name).is_some_and(|c| c.attempt == attempt) {
                state.stop_watching(name, attempt);
                return Err(AcquireError::Timeout(started.elapsed()));
            }
        }
    }

    /// Moves the early reference from the factory tier to the early tier.
    ///
    /// The factory runs outside the lock. If the creation has already moved on,
    /// the computed reference is still returned but the tiers are left alone.
    pub(crate) fn promote_early(&self, name: &str, factory: &Arc<EarlyFactory>) -> DiResult<Bean> {
        let bean = factory.get()?;
        let mut state = self.state.lock();
        let current = state.early_factories.get(name).is_some_and(|f| Arc::ptr_eq(f, factory));
        if current {
            state.early_factories.remove(name);
            state.early.insert(name.to_string(), bean.clone());
        }
        Ok(bean)
    }

    /// Records that `dependent` resolved `dependency` while being created.
    pub(crate) fn record_dependency(&self, dependent: &str, dependency: &str) {
        if dependent == dependency {
            return;
        }
        let mut state = self.state.lock();
        if let Some(set) = state.dependents.get(dependency) {
            if set.contains(dependent) {
                return;
            }
        }
        state
            .dependents
            .entry(dependency.to_string())
            .or_default()
            .insert(dependent.to_string());
    }

    /// Removes finished singletons that transitively depend on `name`.
    ///
    /// Used when `name` fails after its early reference was handed out, so no
    /// finished component keeps a reference to an object that never finished.
    pub(crate) fn purge_dependents(&self, name: &str) -> Vec<String> {
        let mut state = self.state.lock();
        let mut seen = HashSet::new();
        let mut stack = vec![name.to_string()];
        while let Some(current) = stack.pop() {
            for dependent in state.dependents.remove(&current).into_iter().flatten() {
                if seen.insert(dependent.clone()) {
                    stack.push(dependent);
                }
            }
        }
        let mut purged = Vec::new();
        for dependent in seen {
            if state.finished.remove(&dependent).is_some() {
                state.finish_order.retain(|n| n != &dependent);
                purged.push(dependent);
            }
        }
        purged
    }

    /// Drops every tier and returns finished instances in finish order.
    pub(crate) fn drain(&self) -> Vec<(String, Bean)> {
        let mut state = self.state.lock();
        let mut finished = std::mem::take(&mut state.finished);
        let order = std::mem::take(&mut state.finish_order);
        state.early.clear();
        state.early_factories.clear();
        state.dependents.clear();
        state.superseded.clear();
        order
            .into_iter()
            .filter_map(|name| finished.remove(&name).map(|bean| (name, bean)))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().finished.len()
    }
}

impl fmt::Debug for SingletonCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SingletonCache")
            .field("finished", &state.finished.len())
            .field("early", &state.early.len())
            .field("early_factories", &state.early_factories.len())
            .field("in_creation", &state.in_creation.len())
            .finish()
    }
}

/// Ownership of one creation attempt.
///
/// Dropping the guard without [`finish`](Self::finish) or [`fail`](Self::fail)
/// (e.g. on panic) rolls the attempt back and wakes waiters.
pub(crate) struct CreationGuard {
    cache: Arc<SingletonCache>,
    name: String,
    attempt: u64,
    done: bool,
}

impl CreationGuard {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Registers the factory for this attempt's early reference.
    pub(crate) fn register_early_factory(&self, factory: EarlyFactory) {
        let mut state = self.cache.state.lock();
        state.early_factories.insert(self.name.clone(), Arc::new(factory));
    }

    /// The early reference, if one was handed out during this attempt.
    pub(crate) fn early_reference(&self) -> Option<Bean> {
        let state = self.cache.state.lock();
        state
            .early
            .get(&self.name)
            .cloned()
            .or_else(|| state.early_factories.get(&self.name).and_then(|f| f.peek().cloned()))
    }

    /// Publishes the finished instance and wakes waiters.
    pub(crate) fn finish(mut self, bean: Bean) {
        self.done = true;
        let mut state = self.cache.state.lock();
        if let Some(early) = state.early.remove(&self.name) {
            if !Bean::ptr_eq(&early, &bean) {
                state.superseded.push(early);
            }
        }
        state.early_factories.remove(&self.name);
        state.in_creation.remove(&self.name);
        state.finished.insert(self.name.clone(), bean);
        state.finish_order.push(self.name.clone());
        drop(state);
        self.cache.changed.notify_all();
    }

    /// Purges the attempt and hands `error` to any waiters.
    pub(crate) fn fail(mut self, error: DiError) {
        self.done = true;
        self.rollback(error);
    }

    fn rollback(&self, error: DiError) {
        let mut state = self.cache.state.lock();
        state.early.remove(&self.name);
        state.early_factories.remove(&self.name);
        let waiters = match state.in_creation.get(&self.name) {
            Some(creation) if creation.attempt == self.attempt => creation.waiters,
            _ => 0,
        };
        state.in_creation.remove(&self.name);
        if waiters > 0 {
            state.failures.insert(self.attempt, SharedFailure { error, remaining: waiters });
        }
        drop(state);
        self.cache.changed.notify_all();
    }
}

impl Drop for CreationGuard {
    fn drop(&mut self) {
        if !self.done {
            let reason: BoxError = format!("creation of {} was abandoned", self.name).into();
            self.rollback(DiError::construction(&self.name, Stage::Instantiate, Vec::new(), reason));
        }
    }
}
