//! Component collection: the definition source the container is built from.

use std::sync::Arc;

use crate::config::ContainerConfig;
use crate::container::Container;
use crate::definition::ComponentDefinition;
use crate::descriptors::ComponentDescriptor;
use crate::error::DiResult;
use crate::hooks::{ComponentHook, HookChain};
use crate::observer::{Observers, ResolutionObserver};
use crate::registration::Registry;
use crate::validation::{self, ValidationReport};

pub mod module_system;
pub use module_system::*;

/// Collects component definitions, hooks and observers, then builds a
/// [`Container`].
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Autowired, ComponentCollection, ComponentDefinition, Resolver};
///
/// #[derive(Default)]
/// struct A { b: Autowired<B> }
/// #[derive(Default)]
/// struct B { a: Autowired<A> }
///
/// let mut components = ComponentCollection::new();
/// components
///     .register(ComponentDefinition::builder::<A>("a").with_default().autowire::<B, _>("b", |a| &a.b).build())
///     .unwrap()
///     .register(ComponentDefinition::builder::<B>("b").with_default().autowire::<A, _>("a", |b| &b.a).build())
///     .unwrap();
///
/// let container = components.build().unwrap();
/// let a = container.get::<A>("a").unwrap();
/// let b = container.get::<B>("b").unwrap();
/// assert!(std::sync::Arc::ptr_eq(&a.b.get().unwrap(), &b));
/// assert!(std::sync::Arc::ptr_eq(&b.a.get().unwrap(), &a));
/// ```
#[derive(Default)]
pub struct ComponentCollection {
    registry: Registry,
    hooks: Vec<Arc<dyn ComponentHook>>,
    observers: Observers,
    config: ContainerConfig,
}

impl ComponentCollection {
    /// Creates an empty collection with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty collection with `config`.
    pub fn with_config(config: ContainerConfig) -> Self {
        Self { config, ..Self::default() }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Adds a definition.
    ///
    /// Fails with [`DiError::DuplicateDefinition`](crate::DiError::DuplicateDefinition)
    /// if the name is taken and overriding is disabled, or
    /// [`DiError::InvalidName`](crate::DiError::InvalidName) for an empty name,
    /// one starting with the producer prefix, or one containing `#`.
    pub fn register(&mut self, definition: ComponentDefinition) -> DiResult<&mut Self> {
        self.registry.insert(definition, self.config.allow_definition_overriding)?;
        Ok(self)
    }

    /// Appends a hook. Hooks run in the order they are added, before hook components.
    pub fn add_hook(&mut self, hook: Arc<dyn ComponentHook>) -> &mut Self {
        self.hooks.push(hook);
        self
    }

    /// Adds a creation observer.
    pub fn add_observer(&mut self, observer: Arc<dyn ResolutionObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    /// Applies a [`ComponentModule`].
    pub fn add_module<M: ComponentModule>(&mut self, module: M) -> DiResult<&mut Self> {
        module.register_components(self)?;
        Ok(self)
    }

    /// Whether a definition is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    /// Descriptors of every definition, in registration order.
    pub fn descriptors(&self) -> Vec<ComponentDescriptor> {
        self.registry.iter().map(|d| ComponentDescriptor::from_definition(d)).collect()
    }

    /// Checks the declared dependency graph without creating anything.
    pub fn validate(&self) -> ValidationReport {
        validation::validate(&self.registry, &self.config)
    }

    /// Seals the collection and builds the container.
    ///
    /// Hook components are created first, in registration order, then (with
    /// `eager_init`) every non-lazy component. For producers only the producer
    /// itself is created; products are made on first lookup. If any creation
    /// fails the partially built container is shut down and the error returned.
    pub fn build(self) -> DiResult<Container> {
        let report = self.validate();
        for warning in &report.warnings {
            tracing::warn!(%warning, "component configuration");
        }
        for error in &report.errors {
            tracing::warn!(%error, "component configuration");
        }

        let container = Container::new(self.registry, HookChain::new(self.hooks), self.observers, self.config);
        if let Err(error) = container.initialize() {
            tracing::error!(%error, "container initialization failed");
            container.shutdown();
            return Err(error);
        }
        Ok(container)
    }
}
