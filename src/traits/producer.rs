//! Indirect producers.

use std::sync::Arc;

use crate::bean::Bean;
use crate::error::BoxError;
use crate::traits::ResolverCore;

/// A component that manufactures a different logical object on demand.
///
/// Registered with [`ComponentDefinition::producer`](crate::ComponentDefinition::producer).
/// Looking the component up by its name yields the product; prefixing the name
/// with [`PRODUCER_PREFIX`](crate::naming::PRODUCER_PREFIX) yields the producer.
///
/// Every producer states whether its product is cached; there is no default.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{BoxError, ComponentCollection, ComponentDefinition, Producer, Resolver, ResolverCore};
/// use std::sync::Arc;
///
/// struct Connection { url: String }
///
/// #[derive(Default)]
/// struct ConnectionFactory;
///
/// impl Producer for ConnectionFactory {
///     type Product = Connection;
///
///     fn produce(&self, _resolver: &dyn ResolverCore) -> Result<Arc<Connection>, BoxError> {
///         Ok(Arc::new(Connection { url: "postgres://localhost".into() }))
///     }
///
///     fn cacheable(&self) -> bool {
///         true
///     }
/// }
///
/// let mut components = ComponentCollection::new();
/// components
///     .register(ComponentDefinition::producer::<ConnectionFactory>("connection").with_default().build())
///     .unwrap();
/// let container = components.build().unwrap();
///
/// let connection = container.get::<Connection>("connection").unwrap();
/// assert_eq!(connection.url, "postgres://localhost");
/// let factory = container.get::<ConnectionFactory>("&connection").unwrap();
/// # let _ = factory;
/// ```
pub trait Producer: Send + Sync + 'static {
    /// The object handed out under the producer's name.
    type Product: ?Sized + Send + Sync + 'static;

    /// Manufactures the product. May resolve other components.
    fn produce(&self, resolver: &dyn ResolverCore) -> Result<Arc<Self::Product>, BoxError>;

    /// Whether the product is a singleton cached by the container.
    fn cacheable(&self) -> bool;
}

/// Object-safe view of a [`Producer`] used by the engine.
pub(crate) trait ErasedProducer: Send + Sync {
    fn produce_bean(&self, resolver: &dyn ResolverCore) -> Result<Bean, BoxError>;
    fn is_cacheable(&self) -> bool;
}

impl<P: Producer> ErasedProducer for P {
    fn produce_bean(&self, resolver: &dyn ResolverCore) -> Result<Bean, BoxError> {
        self.produce(resolver).map(Bean::from_trait)
    }

    fn is_cacheable(&self) -> bool {
        self.cacheable()
    }
}
