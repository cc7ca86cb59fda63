//! Resolver traits for component lookup.

use std::any::TypeId;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::bean::Bean;
use crate::error::{DiError, DiResult};

/// Core resolver trait for object-safe component resolution.
///
/// Implemented by [`Container`](crate::Container). Producers and constructors
/// receive a `&dyn ResolverCore`, so everything they resolve goes through the same
/// engine (cycle detection, dependency chain, caching).
///
/// Most users should use the [`Resolver`] trait instead, which provides typed
/// generic methods built on top of this trait.
pub trait ResolverCore: Send + Sync {
    /// Resolves a component by name.
    ///
    /// A leading [`PRODUCER_PREFIX`](crate::naming::PRODUCER_PREFIX) selects the
    /// producer itself rather than its product.
    fn resolve_bean(&self, name: &str) -> DiResult<Bean>;

    /// Resolves every component whose exposed type (or product type, for
    /// producers) is one of `types`, keyed by name in registration order.
    ///
    /// Producers matched by their own type are keyed with the producer prefix.
    fn resolve_all(&self, types: &[TypeId]) -> DiResult<IndexMap<String, Bean>>;

    /// Whether a definition is registered under the (canonical) name.
    fn contains(&self, name: &str) -> bool;
}

/// Typed lookup on top of [`ResolverCore`].
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{ComponentCollection, ComponentDefinition, Resolver};
/// use std::sync::Arc;
///
/// trait Printer: Send + Sync {
///     fn print(&self) -> String;
/// }
///
/// #[derive(Default)]
/// struct Console;
/// impl Printer for Console {
///     fn print(&self) -> String { "console".into() }
/// }
///
/// let mut components = ComponentCollection::new();
/// components
///     .register(
///         ComponentDefinition::builder::<Console>("console")
///             .with_default()
///             .expose_as::<dyn Printer, _>(|c| c as Arc<dyn Printer>)
///             .build(),
///     )
///     .unwrap();
///
/// let container = components.build().unwrap();
/// let printer = container.get_trait::<dyn Printer>("console").unwrap();
/// assert_eq!(printer.print(), "console");
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves a component and downcasts it to a concrete type.
    fn get<T: Send + Sync + 'static>(&self, name: &str) -> DiResult<Arc<T>> {
        self.resolve_bean(name)?
            .downcast::<T>()
            .ok_or_else(|| DiError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Resolves a component exposed as a trait object.
    fn get_trait<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> DiResult<Arc<T>> {
        self.resolve_bean(name)?
            .downcast_trait::<T>()
            .ok_or_else(|| DiError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Resolves a concrete component, panicking on failure.
    fn get_required<T: Send + Sync + 'static>(&self, name: &str) -> Arc<T> {
        self.get::<T>(name)
            .unwrap_or_else(|e| panic!("failed to resolve {}: {}", name, e))
    }

    /// Resolves a trait-object component, panicking on failure.
    fn get_required_trait<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Arc<T> {
        self.get_trait::<T>(name)
            .unwrap_or_else(|e| panic!("failed to resolve {}: {}", name, e))
    }

    /// All components of concrete type `T`, keyed by name.
    fn get_all<T: Send + Sync + 'static>(&self) -> DiResult<IndexMap<String, Arc<T>>> {
        let beans = self.resolve_all(&[TypeId::of::<T>(), TypeId::of::<Arc<T>>()])?;
        Ok(beans
            .into_iter()
            .filter_map(|(name, bean)| bean.downcast::<T>().map(|value| (name, value)))
            .collect())
    }

    /// All components exposed as trait `T`, keyed by name.
    fn get_all_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<IndexMap<String, Arc<T>>> {
        let beans = self.resolve_all(&[TypeId::of::<Arc<T>>()])?;
        Ok(beans
            .into_iter()
            .filter_map(|(name, bean)| bean.downcast_trait::<T>().map(|value| (name, value)))
            .collect())
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
