//! Type-erased component handles and injection slots.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;

use crate::error::BoxError;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// A type-erased, cheaply clonable handle to a component object.
///
/// Every cache tier stores `Bean`s. Concrete types are stored as `Arc<T>`, trait
/// objects as `Arc<Arc<dyn Trait>>`. Identity is pointer identity: two handles are
/// the same component object iff [`Bean::ptr_eq`] holds.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::Bean;
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// let concrete = Bean::new(42u32);
/// assert_eq!(*concrete.downcast::<u32>().unwrap(), 42);
///
/// let erased = Bean::from_trait(Arc::new(English) as Arc<dyn Greeter>);
/// assert_eq!(erased.downcast_trait::<dyn Greeter>().unwrap().greet(), "hello");
///
/// let copy = concrete.clone();
/// assert!(Bean::ptr_eq(&concrete, &copy));
/// ```
#[derive(Clone)]
pub struct Bean {
    inner: AnyArc,
}

impl Bean {
    /// Wraps an owned value.
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self { inner: Arc::new(value) }
    }

    /// Wraps an existing `Arc` without re-allocating.
    pub fn from_arc<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self { inner: value }
    }

    /// Wraps a (possibly unsized) `Arc`, e.g. a trait object.
    pub fn from_trait<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self { inner: Arc::new(value) }
    }

    /// Downcasts to a concrete type.
    ///
    /// Works for both storage forms, so a sized value stored through
    /// [`Bean::from_trait`] (as producers do) is still reachable.
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        if let Ok(value) = self.inner.clone().downcast::<T>() {
            return Some(value);
        }
        self.inner.downcast_ref::<Arc<T>>().cloned()
    }

    /// Downcasts to a trait object stored through [`Bean::from_trait`].
    pub fn downcast_trait<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.inner.downcast_ref::<Arc<T>>().cloned()
    }

    /// Returns true if the object can be downcast to `T`.
    pub fn is<T: Send + Sync + 'static>(&self) -> bool {
        self.inner.is::<T>() || self.inner.is::<Arc<T>>()
    }

    /// Pointer identity.
    pub fn ptr_eq(a: &Bean, b: &Bean) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// `TypeId` of the stored payload (`T` or `Arc<dyn Trait>`).
    pub fn payload_type_id(&self) -> TypeId {
        (*self.inner).type_id()
    }
}

impl fmt::Debug for Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bean")
            .field("ptr", &Arc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

/// Edge from a component to one of its dependencies.
enum Link<T: ?Sized> {
    /// Container-managed singleton; the container's cache owns it.
    Managed(Weak<T>),
    /// Unmanaged value (e.g. a non-cacheable product); owned by the slot.
    Owned(Arc<T>),
}

/// A set-once field that the container fills during the wiring stage.
///
/// Edges to container-managed singletons are held weakly, so mutually dependent
/// components never form an `Arc` cycle: the container owns every singleton and
/// releases them on shutdown. Values the container does not cache are owned by
/// the slot.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{Autowired, ComponentCollection, ComponentDefinition, Resolver};
///
/// #[derive(Default)]
/// struct Repo;
///
/// #[derive(Default)]
/// struct Service {
///     repo: Autowired<Repo>,
/// }
///
/// let mut components = ComponentCollection::new();
/// components.register(ComponentDefinition::builder::<Repo>("repo").with_default().build()).unwrap();
/// components.register(
///     ComponentDefinition::builder::<Service>("service")
///         .with_default()
///         .autowire::<Repo, _>("repo", |s| &s.repo)
///         .build(),
/// ).unwrap();
///
/// let container = components.build().unwrap();
/// let service = container.get::<Service>("service").unwrap();
/// assert!(service.repo.get().is_some());
/// ```
pub struct Autowired<T: ?Sized> {
    slot: OnceCell<Link<T>>,
}

impl<T: ?Sized> Autowired<T> {
    /// Creates an empty slot.
    pub const fn new() -> Self {
        Self { slot: OnceCell::new() }
    }

    /// Returns the injected dependency.
    ///
    /// `None` before injection, or after the container released the dependency.
    pub fn get(&self) -> Option<Arc<T>> {
        match self.slot.get()? {
            Link::Managed(weak) => weak.upgrade(),
            Link::Owned(strong) => Some(strong.clone()),
        }
    }

    /// Returns the injected dependency, panicking if it is unavailable.
    pub fn get_required(&self) -> Arc<T> {
        self.get()
            .unwrap_or_else(|| panic!("Autowired<{}> accessed before injection or after shutdown", std::any::type_name::<T>()))
    }

    /// Whether the slot has been filled.
    pub fn is_injected(&self) -> bool {
        self.slot.get().is_some()
    }

    pub(crate) fn inject(&self, value: Arc<T>, managed: bool) -> Result<(), BoxError> {
        let link = if managed {
            Link::Managed(Arc::downgrade(&value))
        } else {
            Link::Owned(value)
        };
        self.slot
            .set(link)
            .map_err(|_| format!("Autowired<{}> is already injected", std::any::type_name::<T>()).into())
    }
}

impl<T: ?Sized> Default for Autowired<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Autowired<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Autowired")
            .field("type", &std::any::type_name::<T>())
            .field("injected", &self.is_injected())
            .finish()
    }
}
