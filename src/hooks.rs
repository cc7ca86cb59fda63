//! Construction hooks.
//!
//! A hook observes or replaces component objects at three points of the creation
//! pipeline. Hooks run in registration order and each one's output feeds the
//! next, so a hook can wrap a component in a proxy that later hooks see.
//!
//! [`HookStage::EarlyReference`] runs only when another component needs the
//! object before it is finished (a field-injection cycle). Whatever it returns is
//! what the other component receives, so a proxying hook should return the same
//! proxy there and in [`HookStage::AfterInit`].

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::bean::Bean;
use crate::error::{BoxError, DiError, DiResult, Stage};

/// The points in the creation pipeline where hooks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookStage {
    /// The object is about to be handed out before it is finished.
    EarlyReference,
    /// Dependencies injected, init callbacks not yet run.
    BeforeInit,
    /// Init callbacks done; the result becomes the finished instance.
    AfterInit,
}

impl From<HookStage> for Stage {
    fn from(stage: HookStage) -> Self {
        match stage {
            HookStage::EarlyReference => Stage::EarlyReference,
            HookStage::BeforeInit => Stage::BeforeInit,
            HookStage::AfterInit => Stage::AfterInit,
        }
    }
}

/// A processor invoked around component construction.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Bean, BoxError, ComponentCollection, ComponentDefinition, ComponentHook, HookStage};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Counter(AtomicUsize);
///
/// impl ComponentHook for Counter {
///     fn handles(&self, stage: HookStage) -> bool {
///         stage == HookStage::AfterInit
///     }
///
///     fn after_init(&self, _name: &str, bean: Bean) -> Result<Bean, BoxError> {
///         self.0.fetch_add(1, Ordering::SeqCst);
///         Ok(bean)
///     }
/// }
///
/// let counter = Arc::new(Counter::default());
/// let mut components = ComponentCollection::new();
/// components.add_hook(counter.clone());
/// components
///     .register(ComponentDefinition::builder::<u32>("answer").constructor(|_| Ok(42)).build())
///     .unwrap();
/// let _container = components.build().unwrap();
/// assert_eq!(counter.0.load(Ordering::SeqCst), 1);
/// ```
pub trait ComponentHook: Send + Sync + 'static {
    /// Whether this hook takes part in `stage`.
    fn handles(&self, stage: HookStage) -> bool;

    /// Replaces the object handed out before the component is finished.
    fn early_reference(&self, _name: &str, bean: Bean) -> Result<Bean, BoxError> {
        Ok(bean)
    }

    /// Runs after injection and aware callbacks, before init callbacks.
    fn before_init(&self, _name: &str, bean: Bean) -> Result<Bean, BoxError> {
        Ok(bean)
    }

    /// Runs after init callbacks; may return a replacement.
    fn after_init(&self, _name: &str, bean: Bean) -> Result<Bean, BoxError> {
        Ok(bean)
    }
}

/// Hook backed by a closure for a single stage.
struct StageHook<F> {
    stage: HookStage,
    f: F,
}

impl<F> ComponentHook for StageHook<F>
where
    F: Fn(&str, Bean) -> Result<Bean, BoxError> + Send + Sync + 'static,
{
    fn handles(&self, stage: HookStage) -> bool {
        stage == self.stage
    }

    fn early_reference(&self, name: &str, bean: Bean) -> Result<Bean, BoxError> {
        (self.f)(name, bean)
    }

    fn before_init(&self, name: &str, bean: Bean) -> Result<Bean, BoxError> {
        (self.f)(name, bean)
    }

    fn after_init(&self, name: &str, bean: Bean) -> Result<Bean, BoxError> {
        (self.f)(name, bean)
    }
}

/// Builds a hook that runs `f` at a single stage.
///
/// ```
/// use ferrous_ioc::{stage_hook, HookStage};
///
/// let hook = stage_hook(HookStage::BeforeInit, |name, bean| {
///     println!("initializing {name}");
///     Ok(bean)
/// });
/// assert!(hook.handles(HookStage::BeforeInit));
/// assert!(!hook.handles(HookStage::AfterInit));
/// ```
pub fn stage_hook<F>(stage: HookStage, f: F) -> Arc<dyn ComponentHook>
where
    F: Fn(&str, Bean) -> Result<Bean, BoxError> + Send + Sync + 'static,
{
    Arc::new(StageHook { stage, f })
}

/// Ordered hook list shared by the engine and early-reference factories.
pub(crate) struct HookChain {
    hooks: RwLock<Arc<[Arc<dyn ComponentHook>]>>,
}

impl HookChain {
    pub(crate) fn new(hooks: Vec<Arc<dyn ComponentHook>>) -> Self {
        Self { hooks: RwLock::new(hooks.into()) }
    }

    /// Appends a hook; objects created from now on see it.
    pub(crate) fn push(&self, hook: Arc<dyn ComponentHook>) {
        let mut hooks = self.hooks.write();
        let mut next: Vec<_> = hooks.iter().cloned().collect();
        next.push(hook);
        *hooks = next.into();
    }

    pub(crate) fn len(&self) -> usize {
        self.hooks.read().len()
    }

    /// Runs every hook declaring `stage`, threading the object through them.
    pub(crate) fn apply(&self, stage: HookStage, name: &str, chain: &[String], bean: Bean) -> DiResult<Bean> {
        // Snapshot so hooks never run under the lock
        let hooks = self.hooks.read().clone();
        hooks
            .iter()
            .filter(|hook| hook.handles(stage))
            .try_fold(bean, |bean, hook| {
                let next = match stage {
                    HookStage::EarlyReference => hook.early_reference(name, bean),
                    HookStage::BeforeInit => hook.before_init(name, bean),
                    HookStage::AfterInit => hook.after_init(name, bean),
                };
                next.map_err(|e| DiError::construction(name, stage.into(), chain.to_vec(), e))
            })
    }
}

impl Default for HookChain {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl fmt::Debug for HookChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookChain").field("hooks", &self.len()).finish()
    }
}
