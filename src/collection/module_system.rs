//! Component modules for grouped registration.

use crate::{ComponentCollection, DiResult};

/// A group of registrations applied to a [`ComponentCollection`] in one call.
///
/// # Example
///
/// ```rust
/// use ferrous_ioc::{ComponentCollection, ComponentDefinition, ComponentModule, DiResult, Resolver};
///
/// #[derive(Default)]
/// struct ConsolePrint;
///
/// struct PrintModule;
///
/// impl ComponentModule for PrintModule {
///     fn register_components(self, components: &mut ComponentCollection) -> DiResult<()> {
///         components.register(ComponentDefinition::builder::<ConsolePrint>("console").with_default().build())?;
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let mut components = ComponentCollection::new();
/// components.add_module(PrintModule)?;
/// let container = components.build()?;
/// assert!(container.get::<ConsolePrint>("console").is_ok());
/// # Ok(())
/// # }
/// ```
pub trait ComponentModule {
    /// Register this module's components.
    fn register_components(self, components: &mut ComponentCollection) -> DiResult<()>;
}
