//! Lifecycle capability traits.
//!
//! A component opts into each callback on its definition builder; the engine
//! invokes them at fixed points after wiring and before the after-init hooks:
//!
//! 1. [`NameAware::set_component_name`]
//! 2. [`ContainerAware::set_container`]
//! 3. before-init hooks
//! 4. [`InitializingComponent::after_properties_set`]
//! 5. the explicit init method

use crate::container::ContainerHandle;
use crate::error::BoxError;

/// Receives the name the component is registered under.
pub trait NameAware: Send + Sync + 'static {
    fn set_component_name(&self, name: &str);
}

/// Receives a weak handle to the owning container.
///
/// The handle does not keep the container alive; upgrade it when needed.
pub trait ContainerAware: Send + Sync + 'static {
    fn set_container(&self, container: ContainerHandle);
}

/// Called once all dependencies have been injected.
pub trait InitializingComponent: Send + Sync + 'static {
    fn after_properties_set(&self) -> Result<(), BoxError>;
}
