//! The resolution engine.
//!
//! `resolve(name)` walks a component through
//! `CHECKING_CACHE -> CREATING -> RAW -> WIRING -> INITIALIZING -> FINISHED`.
//! Any failure aborts the name: the creation guard purges its cache state and
//! hands the error to blocked waiters, so a later lookup starts from scratch.

use std::any::TypeId;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;

use super::{ConstructorArgs, ContainerHandle, ContainerInner};
use crate::bean::Bean;
use crate::cache::{AcquireError, Acquired, CreationGuard, EarlyFactory};
use crate::definition::{ComponentDefinition, MatchKind};
use crate::error::{BoxError, DiError, DiResult, Stage};
use crate::hooks::HookStage;
use crate::internal::{current_chain, current_parent, ChainGuard};
use crate::naming::{producer_reference, RequestedName};

/// A resolved object and whether the container's cache owns it.
pub(crate) struct Resolved {
    pub(crate) bean: Bean,
    pub(crate) managed: bool,
}

impl Resolved {
    pub(crate) fn managed(bean: Bean) -> Self {
        Self { bean, managed: true }
    }
}

fn stage_error(name: &str, stage: Stage) -> impl FnOnce(BoxError) -> DiError + '_ {
    move |e| DiError::construction(name, stage, current_chain(), e)
}

impl ContainerInner {
    pub(crate) fn resolve(&self, requested: &str) -> DiResult<Resolved> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DiError::ContainerClosed);
        }
        let RequestedName { canonical, wants_producer } = RequestedName::parse(requested);
        let _chain = ChainGuard::enter(canonical, self.config.max_depth)?;
        let def = self.definition(canonical)?;
        let instance = self.singleton(def)?;
        if let Some(parent) = current_parent() {
            self.cache.record_dependency(&parent, canonical);
        }

        match (def.producer_adapter.as_ref(), wants_producer) {
            (None, true) => Err(DiError::NotAProducer { name: canonical.to_string() }),
            (None, false) | (Some(_), true) => Ok(instance),
            (Some(adapter), false) => {
                let producer = adapter(&instance.bean).ok_or_else(|| DiError::TypeMismatch {
                    name: producer_reference(canonical),
                    expected: def.type_name,
                })?;
                self.product(def, producer)
            }
        }
    }

    fn definition(&self, name: &str) -> DiResult<&Arc<ComponentDefinition>> {
        let def = self.registry.get(name).ok_or_else(|| DiError::UnknownComponent {
            name: name.to_string(),
            chain: current_chain(),
        })?;
        if def.is_abstract() {
            return Err(DiError::AbstractDefinition { name: name.to_string(), chain: current_chain() });
        }
        Ok(def)
    }

    /// Returns the finished instance, an early reference on a cycle, or creates it.
    fn singleton(&self, def: &Arc<ComponentDefinition>) -> DiResult<Resolved> {
        let name = def.name.as_str();
        if let Some(bean) = self.cache.get_finished(name) {
            return Ok(Resolved::managed(bean));
        }

        match self.cache.acquire(name, self.config.wait_timeout()) {
            Ok(Acquired::Finished(bean)) | Ok(Acquired::Early(bean)) => Ok(Resolved::managed(bean)),
            Ok(Acquired::EarlyFactory(factory)) => {
                let bean = self.cache.promote_early(name, &factory)?;
                tracing::trace!(component = name, "early reference exposed");
                if self.observers.has_observers() {
                    self.observers.early_reference_exposed(name);
                }
                Ok(Resolved::managed(bean))
            }
            Ok(Acquired::Owner(guard)) => self.create(def, guard),
            Err(AcquireError::Cycle) => Err(DiError::Circular { chain: current_chain() }),
            Err(AcquireError::Timeout(waited)) => Err(DiError::ResolutionTimeout {
                name: name.to_string(),
                waited,
                chain: current_chain(),
            }),
            Err(AcquireError::Failed(error)) => Err(error),
        }
    }

    fn create(&self, def: &Arc<ComponentDefinition>, guard: CreationGuard) -> DiResult<Resolved> {
        let name = guard.name().to_string();
        let started = Instant::now();
        tracing::trace!(component = %name, "creating component");
        if self.observers.has_observers() {
            self.observers.creating(&name);
        }

        match self.build_component(def, &guard) {
            Ok((raw, finished)) => {
                {
                    let mut disposers = self.disposers.lock();
                    for teardown in def.teardowns.iter().filter_map(|t| t(&raw)) {
                        disposers.push(&name, teardown);
                    }
                }
                guard.finish(finished.clone());
                tracing::debug!(component = %name, "component ready");
                if self.observers.has_observers() {
                    self.observers.created(&name, started.elapsed());
                }
                Ok(Resolved::managed(finished))
            }
            Err(error) => {
                tracing::debug!(component = %name, error = %error, "component creation failed");
                if self.observers.has_observers() {
                    self.observers.failed(&name, &error);
                }
                if guard.early_reference().is_some() {
                    self.purge_dependents(&name);
                }
                guard.fail(error.clone());
                Err(error)
            }
        }
    }

    /// Runs the creation pipeline, returning the raw and the finished object.
    fn build_component(&self, def: &ComponentDefinition, guard: &CreationGuard) -> DiResult<(Bean, Bean)> {
        let name = def.name.as_str();

        for dependency in &def.depends_on {
            self.resolve(dependency)?;
        }

        let mut args = Vec::with_capacity(def.constructor_args.len());
        for arg in &def.constructor_args {
            args.push((arg.clone(), self.resolve(arg)?.bean));
        }
        let constructor = def.constructor.as_ref().ok_or_else(|| DiError::AbstractDefinition {
            name: name.to_string(),
            chain: current_chain(),
        })?;
        let raw = constructor(&ConstructorArgs::new(name, &args, self)).map_err(stage_error(name, Stage::Instantiate))?;
        drop(args);

        let exposed = match &def.exposer {
            Some(expose) => expose(&raw).map_err(stage_error(name, Stage::Instantiate))?,
            None => raw.clone(),
        };

        if self.config.allow_circular_references {
            let hooks = Arc::clone(&self.hooks);
            let early_name = name.to_string();
            let early = exposed.clone();
            let chain = current_chain();
            guard.register_early_factory(EarlyFactory::new(move || {
                hooks.apply(HookStage::EarlyReference, &early_name, &chain, early.clone())
            }));
        }

        for field in &def.fields {
            let dependency = self.resolve(&field.dependency)?;
            (field.inject)(&raw, &dependency.bean, dependency.managed).map_err(stage_error(name, Stage::Inject))?;
        }

        if let Some(name_aware) = &def.name_aware {
            name_aware(&raw, name).map_err(stage_error(name, Stage::Aware))?;
        }
        if let Some(container_aware) = &def.container_aware {
            let handle = ContainerHandle { inner: self.self_ref.clone() };
            container_aware(&raw, handle).map_err(stage_error(name, Stage::Aware))?;
        }

        let chain = current_chain();
        let mut current = self.hooks.apply(HookStage::BeforeInit, name, &chain, exposed.clone())?;
        if let Some(after_properties_set) = &def.after_properties_set {
            after_properties_set(&raw).map_err(stage_error(name, Stage::AfterPropertiesSet))?;
        }
        if let Some(init) = &def.init_method {
            init(&raw).map_err(stage_error(name, Stage::InitMethod))?;
        }
        current = self.hooks.apply(HookStage::AfterInit, name, &chain, current)?;

        if let Some(early) = guard.early_reference() {
            if Bean::ptr_eq(&current, &exposed) {
                current = early;
            } else if !Bean::ptr_eq(&current, &early) {
                if !self.config.allow_raw_injection_despite_wrapping {
                    return Err(DiError::InconsistentEarlyReference { name: name.to_string(), chain });
                }
                tracing::warn!(component = name, "early reference differs from the finished component");
            }
        }

        Ok((raw, current))
    }

    /// Discards finished components that captured the early reference of a
    /// failed component, running their sync teardowns.
    fn purge_dependents(&self, name: &str) {
        let purged = self.cache.purge_dependents(name);
        if purged.is_empty() {
            return;
        }
        tracing::debug!(component = name, purged = ?purged, "discarding dependents of failed component");
        let mut bag = self.disposers.lock().take_named(&purged);
        bag.run_all_sync_reverse();
        if !bag.is_empty() {
            tracing::warn!(skipped = bag.len(), "async teardowns of discarded components skipped");
        }
    }

    /// Every component matching one of `types`, in registration order.
    pub(crate) fn resolve_by_type(&self, types: &[TypeId]) -> DiResult<IndexMap<String, Bean>> {
        let mut found = IndexMap::new();
        for def in self.registry.iter().filter(|d| !d.is_abstract()) {
            let key = match def.matches_type(types) {
                Some(MatchKind::Product) => def.name.clone(),
                Some(MatchKind::Exposed) if def.is_producer() => producer_reference(&def.name),
                Some(MatchKind::Exposed) => def.name.clone(),
                None => continue,
            };
            let bean = self.resolve(&key)?.bean;
            found.insert(key, bean);
        }
        Ok(found)
    }
}
