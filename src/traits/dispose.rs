//! Disposal traits for component teardown.

/// Trait for synchronous component teardown.
///
/// Opt in per definition with
/// [`DefinitionBuilder::disposable`](crate::DefinitionBuilder::disposable).
/// Teardown hooks run on [`Container::shutdown`](crate::Container::shutdown) in
/// reverse creation order, so a component is disposed before the components it
/// depends on.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{ComponentCollection, ComponentDefinition, Dispose};
///
/// #[derive(Default)]
/// struct Cache;
///
/// impl Dispose for Cache {
///     fn dispose(&self) {
///         println!("flushing cache");
///     }
/// }
///
/// let mut components = ComponentCollection::new();
/// components
///     .register(ComponentDefinition::builder::<Cache>("cache").with_default().disposable().build())
///     .unwrap();
/// let container = components.build().unwrap();
/// container.shutdown();
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}

/// Trait for asynchronous component teardown.
///
/// Async hooks run before sync hooks when the container is shut down with
/// [`Container::shutdown_async`](crate::Container::shutdown_async).
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{AsyncDispose, ComponentCollection, ComponentDefinition};
/// use async_trait::async_trait;
///
/// #[derive(Default)]
/// struct Client;
///
/// #[async_trait]
/// impl AsyncDispose for Client {
///     async fn dispose(&self) {
///         println!("closing connection");
///     }
/// }
///
/// let mut components = ComponentCollection::new();
/// components
///     .register(ComponentDefinition::builder::<Client>("client").with_default().async_disposable().build())
///     .unwrap();
/// ```
#[async_trait::async_trait]
pub trait AsyncDispose: Send + Sync + 'static {
    /// Perform asynchronous cleanup of resources.
    async fn dispose(&self);
}
