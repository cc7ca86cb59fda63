//! Component definitions and their builder.
//!
//! A [`ComponentDefinition`] is the immutable recipe for one named singleton:
//! how to construct it, what it depends on, which slots to fill, and which
//! lifecycle callbacks to run. Definitions are built with [`DefinitionBuilder`]
//! and handed to [`ComponentCollection::register`](crate::ComponentCollection::register).

use std::any::{type_name, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::bean::{Autowired, Bean};
use crate::container::{ConstructorArgs, ContainerHandle};
use crate::error::BoxError;
use crate::hooks::ComponentHook;
use crate::internal::{BoxFutureUnit, Teardown};
use crate::traits::{
    AsyncDispose, ContainerAware, Dispose, ErasedProducer, InitializingComponent, NameAware, Producer,
};

pub(crate) type ConstructorFn = dyn Fn(&ConstructorArgs<'_>) -> Result<Bean, BoxError> + Send + Sync;
pub(crate) type InjectFn = dyn Fn(&Bean, &Bean, bool) -> Result<(), BoxError> + Send + Sync;
pub(crate) type ExposeFn = dyn Fn(&Bean) -> Result<Bean, BoxError> + Send + Sync;
pub(crate) type CallbackFn = dyn Fn(&Bean) -> Result<(), BoxError> + Send + Sync;
pub(crate) type NameAwareFn = dyn Fn(&Bean, &str) -> Result<(), BoxError> + Send + Sync;
pub(crate) type ContainerAwareFn = dyn Fn(&Bean, ContainerHandle) -> Result<(), BoxError> + Send + Sync;
pub(crate) type HookAdapterFn = dyn Fn(&Bean) -> Option<Arc<dyn ComponentHook>> + Send + Sync;
pub(crate) type ProducerAdapterFn = dyn Fn(&Bean) -> Option<Arc<dyn ErasedProducer>> + Send + Sync;
pub(crate) type TeardownFn = dyn Fn(&Bean) -> Option<Teardown> + Send + Sync;

/// A field dependency: the component to resolve and how to assign it.
pub(crate) struct FieldInjection {
    pub(crate) dependency: String,
    pub(crate) inject: Box<InjectFn>,
}

/// Product metadata of a producer definition.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ProductType {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
}

/// Immutable recipe for one named singleton component.
pub struct ComponentDefinition {
    pub(crate) name: String,
    pub(crate) type_name: &'static str,
    pub(crate) exposed_type: TypeId,
    pub(crate) exposed_type_name: &'static str,
    pub(crate) product: Option<ProductType>,
    pub(crate) constructor: Option<Box<ConstructorFn>>,
    pub(crate) constructor_args: Vec<String>,
    pub(crate) depends_on: Vec<String>,
    pub(crate) fields: Vec<FieldInjection>,
    pub(crate) lazy: bool,
    pub(crate) exposer: Option<Box<ExposeFn>>,
    pub(crate) hook_adapter: Option<Box<HookAdapterFn>>,
    pub(crate) producer_adapter: Option<Box<ProducerAdapterFn>>,
    pub(crate) name_aware: Option<Box<NameAwareFn>>,
    pub(crate) container_aware: Option<Box<ContainerAwareFn>>,
    pub(crate) after_properties_set: Option<Box<CallbackFn>>,
    pub(crate) init_method: Option<Box<CallbackFn>>,
    pub(crate) teardowns: Vec<Box<TeardownFn>>,
}

impl ComponentDefinition {
    /// Starts a definition for a component of type `T`.
    ///
    /// The definition stays abstract (not instantiable) until a constructor is
    /// set with [`DefinitionBuilder::constructor`] or [`DefinitionBuilder::with_default`].
    pub fn builder<T: Send + Sync + 'static>(name: impl Into<String>) -> DefinitionBuilder<T> {
        DefinitionBuilder {
            def: ComponentDefinition {
                name: name.into(),
                type_name: type_name::<T>(),
                exposed_type: TypeId::of::<T>(),
                exposed_type_name: type_name::<T>(),
                product: None,
                constructor: None,
                constructor_args: Vec::new(),
                depends_on: Vec::new(),
                fields: Vec::new(),
                lazy: false,
                exposer: None,
                hook_adapter: None,
                producer_adapter: None,
                name_aware: None,
                container_aware: None,
                after_properties_set: None,
                init_method: None,
                teardowns: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    /// Starts a definition for an indirect producer.
    ///
    /// Looking up `name` yields `P::Product`; looking up `&name` yields `P`.
    pub fn producer<P: Producer>(name: impl Into<String>) -> DefinitionBuilder<P> {
        let mut builder = Self::builder::<P>(name);
        builder.def.product = Some(ProductType {
            id: TypeId::of::<Arc<P::Product>>(),
            name: type_name::<P::Product>(),
        });
        builder.def.producer_adapter = Some(Box::new(|bean: &Bean| {
            bean.downcast::<P>().map(|p| p as Arc<dyn ErasedProducer>)
        }));
        builder
    }

    /// A definition whose instance already exists.
    pub fn from_instance<T: Send + Sync + 'static>(name: impl Into<String>, value: T) -> ComponentDefinition {
        let value = Arc::new(value);
        let mut builder = Self::builder::<T>(name);
        builder.def.constructor = Some(Box::new(move |_: &ConstructorArgs<'_>| -> Result<Bean, BoxError> {
            Ok(Bean::from_arc(value.clone()))
        }));
        builder.def
    }

    /// The registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name of the raw instance.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// True if the definition has no constructor.
    pub fn is_abstract(&self) -> bool {
        self.constructor.is_none()
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    pub fn is_producer(&self) -> bool {
        self.producer_adapter.is_some()
    }

    pub fn is_hook(&self) -> bool {
        self.hook_adapter.is_some()
    }

    /// Names resolved before construction and passed to the constructor.
    pub fn constructor_args(&self) -> &[String] {
        &self.constructor_args
    }

    /// Names that must be finished before this component is constructed.
    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    /// Field dependencies in injection order.
    pub fn field_dependencies(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.dependency.as_str())
    }

    /// Every name this definition refers to, in resolution order.
    pub(crate) fn all_dependencies(&self) -> impl Iterator<Item = &str> {
        self.depends_on
            .iter()
            .chain(&self.constructor_args)
            .map(String::as_str)
            .chain(self.field_dependencies())
    }

    /// Whether a lookup by type should match this definition, and under which key.
    pub(crate) fn matches_type(&self, types: &[TypeId]) -> Option<MatchKind> {
        if let Some(product) = self.product {
            if types.contains(&product.id) {
                return Some(MatchKind::Product);
            }
        }
        types.contains(&self.exposed_type).then_some(MatchKind::Exposed)
    }
}

/// How a definition matched a lookup by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MatchKind {
    Exposed,
    Product,
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("exposed_type", &self.exposed_type_name)
            .field("product", &self.product.map(|p| p.name))
            .field("abstract", &self.is_abstract())
            .field("lazy", &self.lazy)
            .field("constructor_args", &self.constructor_args)
            .field("depends_on", &self.depends_on)
            .field("fields", &self.field_dependencies().collect::<Vec<_>>())
            .finish()
    }
}

/// Fluent builder for [`ComponentDefinition`].
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Autowired, ComponentCollection, ComponentDefinition, Resolver};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// #[derive(Default)]
/// struct Pool;
///
/// #[derive(Default)]
/// struct Repository {
///     pool: Autowired<Pool>,
///     ready: AtomicBool,
/// }
///
/// let mut components = ComponentCollection::new();
/// components.register(ComponentDefinition::builder::<Pool>("pool").with_default().build()).unwrap();
/// components.register(
///     ComponentDefinition::builder::<Repository>("repository")
///         .with_default()
///         .autowire::<Pool, _>("pool", |r| &r.pool)
///         .init_method(|r| {
///             r.ready.store(r.pool.is_injected(), Ordering::SeqCst);
///             Ok(())
///         })
///         .build(),
/// ).unwrap();
///
/// let container = components.build().unwrap();
/// let repository = container.get::<Repository>("repository").unwrap();
/// assert!(repository.ready.load(Ordering::SeqCst));
/// ```
pub struct DefinitionBuilder<T> {
    def: ComponentDefinition,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> DefinitionBuilder<T> {
    /// Sets the constructor. Declared [`constructor_arg`](Self::constructor_arg)s
    /// are resolved before it runs and can be read from the [`ConstructorArgs`].
    pub fn constructor<F>(mut self, f: F) -> Self
    where
        F: Fn(&ConstructorArgs<'_>) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.def.constructor = Some(Box::new(move |args: &ConstructorArgs<'_>| f(args).map(Bean::new)));
        self
    }

    /// Constructs the component with `T::default()`.
    pub fn with_default(self) -> Self
    where
        T: Default,
    {
        self.constructor(|_| Ok(T::default()))
    }

    /// Declares a constructor dependency. Cycles through it are errors.
    pub fn constructor_arg(mut self, name: impl Into<String>) -> Self {
        self.def.constructor_args.push(name.into());
        self
    }

    /// Declares an ordering dependency that must be finished first.
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.def.depends_on.push(name.into());
        self
    }

    /// Injects the component `dependency` into the slot returned by `slot`.
    pub fn autowire<D, F>(mut self, dependency: impl Into<String>, slot: F) -> Self
    where
        D: Send + Sync + 'static,
        F: Fn(&T) -> &Autowired<D> + Send + Sync + 'static,
    {
        let dependency = dependency.into();
        let target = dependency.clone();
        let inject = move |raw: &Bean, dep: &Bean, managed: bool| -> Result<(), BoxError> {
            let owner = raw.downcast::<T>().ok_or_else(|| mismatch::<T>("component"))?;
            let value = dep
                .downcast::<D>()
                .ok_or_else(|| format!("dependency {} is not a {}", target, type_name::<D>()))?;
            slot(&owner).inject(value, managed)
        };
        self.def.fields.push(FieldInjection { dependency, inject: Box::new(inject) });
        self
    }

    /// Injects a component exposed as trait `D` (see [`expose_as`](Self::expose_as)).
    pub fn autowire_trait<D, F>(mut self, dependency: impl Into<String>, slot: F) -> Self
    where
        D: ?Sized + Send + Sync + 'static,
        F: Fn(&T) -> &Autowired<D> + Send + Sync + 'static,
    {
        let dependency = dependency.into();
        let target = dependency.clone();
        let inject = move |raw: &Bean, dep: &Bean, managed: bool| -> Result<(), BoxError> {
            let owner = raw.downcast::<T>().ok_or_else(|| mismatch::<T>("component"))?;
            let value = dep
                .downcast_trait::<D>()
                .ok_or_else(|| format!("dependency {} is not exposed as {}", target, type_name::<D>()))?;
            slot(&owner).inject(value, managed)
        };
        self.def.fields.push(FieldInjection { dependency, inject: Box::new(inject) });
        self
    }

    /// Exposes the component to other components as `X` (typically a trait object).
    pub fn expose_as<X, F>(mut self, view: F) -> Self
    where
        X: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<X> + Send + Sync + 'static,
    {
        self.def.exposed_type = TypeId::of::<Arc<X>>();
        self.def.exposed_type_name = type_name::<X>();
        self.def.exposer = Some(Box::new(move |raw: &Bean| -> Result<Bean, BoxError> {
            let raw = raw.downcast::<T>().ok_or_else(|| mismatch::<T>("component"))?;
            Ok(Bean::from_trait(view(raw)))
        }));
        self
    }

    /// Skips pre-instantiation when the container is built.
    pub fn lazy(mut self) -> Self {
        self.def.lazy = true;
        self
    }

    /// Removes the constructor, making the definition non-instantiable.
    pub fn make_abstract(mut self) -> Self {
        self.def.constructor = None;
        self
    }

    /// Runs `f` after [`InitializingComponent::after_properties_set`].
    pub fn init_method<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        self.def.init_method = Some(Box::new(move |raw: &Bean| -> Result<(), BoxError> {
            let raw = raw.downcast::<T>().ok_or_else(|| mismatch::<T>("component"))?;
            f(&raw)
        }));
        self
    }

    /// Runs `f` when the container shuts down.
    pub fn destroy_method<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.def.teardowns.push(Box::new(move |raw: &Bean| {
            let raw = raw.downcast::<T>()?;
            let f = f.clone();
            Some(Teardown::Sync(Box::new(move || f(&raw))))
        }));
        self
    }

    /// Finishes the definition.
    pub fn build(self) -> ComponentDefinition {
        self.def
    }
}

impl<T: NameAware> DefinitionBuilder<T> {
    /// Calls [`NameAware::set_component_name`] after injection.
    pub fn name_aware(mut self) -> Self {
        self.def.name_aware = Some(Box::new(|raw: &Bean, name: &str| -> Result<(), BoxError> {
            let raw = raw.downcast::<T>().ok_or_else(|| mismatch::<T>("component"))?;
            raw.set_component_name(name);
            Ok(())
        }));
        self
    }
}

impl<T: ContainerAware> DefinitionBuilder<T> {
    /// Calls [`ContainerAware::set_container`] after injection.
    pub fn container_aware(mut self) -> Self {
        self.def.container_aware = Some(Box::new(|raw: &Bean, handle: ContainerHandle| -> Result<(), BoxError> {
            let raw = raw.downcast::<T>().ok_or_else(|| mismatch::<T>("component"))?;
            raw.set_container(handle);
            Ok(())
        }));
        self
    }
}

impl<T: InitializingComponent> DefinitionBuilder<T> {
    /// Calls [`InitializingComponent::after_properties_set`] after the before-init hooks.
    pub fn initializing(mut self) -> Self {
        self.def.after_properties_set = Some(Box::new(|raw: &Bean| -> Result<(), BoxError> {
            let raw = raw.downcast::<T>().ok_or_else(|| mismatch::<T>("component"))?;
            raw.after_properties_set()
        }));
        self
    }
}

impl<T: Dispose> DefinitionBuilder<T> {
    /// Calls [`Dispose::dispose`] on shutdown.
    pub fn disposable(mut self) -> Self {
        self.def.teardowns.push(Box::new(|raw: &Bean| {
            let raw = raw.downcast::<T>()?;
            Some(Teardown::Sync(Box::new(move || Dispose::dispose(&*raw))))
        }));
        self
    }
}

impl<T: AsyncDispose> DefinitionBuilder<T> {
    /// Calls [`AsyncDispose::dispose`] on [`Container::shutdown_async`](crate::Container::shutdown_async).
    pub fn async_disposable(mut self) -> Self {
        self.def.teardowns.push(Box::new(|raw: &Bean| {
            let raw = raw.downcast::<T>()?;
            Some(Teardown::Async(Box::new(move || {
                Box::pin(async move { AsyncDispose::dispose(&*raw).await }) as BoxFutureUnit
            })))
        }));
        self
    }
}

impl<T: ComponentHook> DefinitionBuilder<T> {
    /// Registers the finished component as a hook.
    ///
    /// Hook components are created before every other component.
    pub fn hook(mut self) -> Self {
        self.def.hook_adapter = Some(Box::new(|bean: &Bean| {
            bean.downcast::<T>().map(|h| h as Arc<dyn ComponentHook>)
        }));
        self
    }
}

fn mismatch<T>(what: &str) -> BoxError {
    format!("{} is not a {}", what, type_name::<T>()).into()
}
