//! The built container.

mod context;
mod producer;
mod resolve;

use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::bean::Bean;
use crate::cache::SingletonCache;
use crate::config::ContainerConfig;
use crate::descriptors::ComponentDescriptor;
use crate::error::{DiError, DiResult};
use crate::hooks::HookChain;
use crate::internal::DisposeBag;
use crate::naming::canonical_name;
use crate::observer::Observers;
use crate::registration::Registry;
use crate::traits::ResolverCore;

pub use context::ConstructorArgs;

/// A built container of named singleton components.
///
/// Cheap to clone; clones share the same components. Obtain one from
/// [`ComponentCollection::build`](crate::ComponentCollection::build) and resolve
/// with the [`Resolver`](crate::Resolver) methods.
///
/// Call [`shutdown`](Self::shutdown) or [`shutdown_async`](Self::shutdown_async)
/// to run teardown callbacks; dropping the last handle without doing so logs a
/// warning.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{ComponentCollection, ComponentDefinition, Resolver};
///
/// let mut components = ComponentCollection::new();
/// components.register(ComponentDefinition::from_instance("port", 8080u16)).unwrap();
///
/// let container = components.build().unwrap();
/// assert_eq!(*container.get::<u16>("port").unwrap(), 8080);
/// assert!(container.get::<u16>("missing").is_err());
/// ```
pub struct Container {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    pub(crate) registry: Registry,
    pub(crate) cache: Arc<SingletonCache>,
    pub(crate) hooks: Arc<HookChain>,
    pub(crate) observers: Observers,
    pub(crate) config: ContainerConfig,
    pub(crate) disposers: Mutex<DisposeBag>,
    pub(crate) closed: AtomicBool,
    pub(crate) self_ref: Weak<ContainerInner>,
}

/// Weak handle to a [`Container`], handed to container-aware components.
#[derive(Clone)]
pub struct ContainerHandle {
    inner: Weak<ContainerInner>,
}

impl ContainerHandle {
    /// The container, if it is still alive.
    pub fn upgrade(&self) -> Option<Container> {
        self.inner.upgrade().map(|inner| Container { inner })
    }
}

impl fmt::Debug for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerHandle")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl Container {
    pub(crate) fn new(
        registry: Registry,
        hooks: HookChain,
        observers: Observers,
        config: ContainerConfig,
    ) -> Self {
        let inner = Arc::new_cyclic(|self_ref| ContainerInner {
            registry,
            cache: Arc::new(SingletonCache::new()),
            hooks: Arc::new(hooks),
            observers,
            config,
            disposers: Mutex::new(DisposeBag::default()),
            closed: AtomicBool::new(false),
            self_ref: self_ref.clone(),
        });
        Self { inner }
    }

    /// Creates hook components, then every eager singleton.
    pub(crate) fn initialize(&self) -> DiResult<()> {
        let inner = &self.inner;
        for def in inner.registry.iter().filter(|d| d.is_hook() && !d.is_abstract()) {
            let bean = inner.resolve(&def.name)?.bean;
            let hook = def
                .hook_adapter
                .as_ref()
                .and_then(|adapt| adapt(&bean))
                .ok_or_else(|| DiError::TypeMismatch {
                    name: def.name.clone(),
                    expected: "ComponentHook",
                })?;
            inner.hooks.push(hook);
            tracing::debug!(component = %def.name, "registered hook component");
        }

        if !inner.config.eager_init {
            return Ok(());
        }
        for def in inner.registry.iter().filter(|d| !d.lazy && !d.is_abstract() && !d.is_hook()) {
            if def.is_producer() {
                inner.resolve(&crate::naming::producer_reference(&def.name))?;
            } else {
                inner.resolve(&def.name)?;
            }
        }
        tracing::debug!(
            components = inner.registry.len(),
            singletons = inner.cache.len(),
            "container initialized"
        );
        Ok(())
    }

    /// Resolves a component by name. `&name` selects a producer itself.
    pub fn get_bean(&self, name: &str) -> DiResult<Bean> {
        self.inner.resolve(name).map(|r| r.bean)
    }

    /// Returns a weak handle to this container.
    pub fn handle(&self) -> ContainerHandle {
        ContainerHandle { inner: Arc::downgrade(&self.inner) }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    /// Registered names, in registration order.
    pub fn component_names(&self) -> Vec<String> {
        self.inner.registry.names().map(str::to_string).collect()
    }

    pub fn descriptors(&self) -> Vec<ComponentDescriptor> {
        self.inner.registry.iter().map(|d| ComponentDescriptor::from_definition(d)).collect()
    }

    /// Whether the singleton `name` has been fully created.
    pub fn is_singleton_finished(&self, name: &str) -> bool {
        self.inner.cache.is_finished(canonical_name(name))
    }

    /// Names of finished singletons, in the order they finished.
    pub fn singleton_names(&self) -> Vec<String> {
        self.inner.cache.finished_names()
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Runs sync teardown callbacks in reverse creation order and releases all
    /// singletons. Later lookups fail with [`DiError::ContainerClosed`].
    ///
    /// Async teardowns are skipped; use [`shutdown_async`](Self::shutdown_async)
    /// when components registered any.
    pub fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut bag = std::mem::take(&mut *self.inner.disposers.lock());
        tracing::debug!(teardowns = bag.len(), "shutting down container");
        bag.run_all_sync_reverse();
        if !bag.is_empty() {
            tracing::warn!(skipped = bag.len(), "async teardowns skipped; use shutdown_async");
        }
        let released = self.inner.cache.drain();
        tracing::debug!(released = released.len(), "singletons released");
    }

    /// Runs async teardowns, then sync ones, each in reverse creation order, and
    /// releases all singletons.
    pub async fn shutdown_async(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut bag = std::mem::take(&mut *self.inner.disposers.lock());
        tracing::debug!(teardowns = bag.len(), "shutting down container");
        bag.run_all_async_reverse().await;
        bag.run_all_sync_reverse();
        let released = self.inner.cache.drain();
        tracing::debug!(released = released.len(), "singletons released");
    }
}

impl ResolverCore for Container {
    fn resolve_bean(&self, name: &str) -> DiResult<Bean> {
        self.get_bean(name)
    }

    fn resolve_all(&self, types: &[TypeId]) -> DiResult<IndexMap<String, Bean>> {
        self.inner.resolve_by_type(types)
    }

    fn contains(&self, name: &str) -> bool {
        self.inner.registry.contains(canonical_name(name))
    }
}

impl ResolverCore for ContainerInner {
    fn resolve_bean(&self, name: &str) -> DiResult<Bean> {
        self.resolve(name).map(|r| r.bean)
    }

    fn resolve_all(&self, types: &[TypeId]) -> DiResult<IndexMap<String, Bean>> {
        self.resolve_by_type(types)
    }

    fn contains(&self, name: &str) -> bool {
        self.registry.contains(canonical_name(name))
    }
}

impl Clone for Container {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("components", &self.inner.registry.len())
            .field("cache", &self.inner.cache)
            .field("hooks", &self.inner.hooks)
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        if Arc::strong_count(&self.inner) == 1 && !self.is_shut_down() {
            if let Some(bag) = self.inner.disposers.try_lock() {
                if !bag.is_empty() {
                    tracing::warn!(
                        pending = bag.len(),
                        "container dropped with pending teardowns; call shutdown() or shutdown_async() first"
                    );
                }
            }
        }
    }
}
