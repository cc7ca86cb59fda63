//! Context handed to constructors.

use std::any::TypeId;

use indexmap::IndexMap;

use crate::bean::Bean;
use crate::error::DiResult;
use crate::traits::ResolverCore;

/// Constructor-time view of the container.
///
/// Declared constructor arguments are already resolved and are served from
/// here; any other name is resolved through the container. Use the typed
/// [`Resolver`](crate::Resolver) methods to read them.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{ComponentCollection, ComponentDefinition, Resolver};
/// use std::sync::Arc;
///
/// struct Settings { url: String }
/// struct Client { url: String }
///
/// let mut components = ComponentCollection::new();
/// components
///     .register(ComponentDefinition::from_instance("settings", Settings { url: "db://main".into() }))
///     .unwrap();
/// components
///     .register(
///         ComponentDefinition::builder::<Client>("client")
///             .constructor_arg("settings")
///             .constructor(|args| {
///                 let settings = args.get::<Settings>("settings")?;
///                 Ok(Client { url: settings.url.clone() })
///             })
///             .build(),
///     )
///     .unwrap();
///
/// let container = components.build().unwrap();
/// assert_eq!(container.get::<Client>("client").unwrap().url, "db://main");
/// ```
pub struct ConstructorArgs<'a> {
    component: &'a str,
    args: &'a [(String, Bean)],
    resolver: &'a dyn ResolverCore,
}

impl<'a> ConstructorArgs<'a> {
    pub(crate) fn new(component: &'a str, args: &'a [(String, Bean)], resolver: &'a dyn ResolverCore) -> Self {
        Self { component, args, resolver }
    }

    /// Name of the component being constructed.
    pub fn component_name(&self) -> &str {
        self.component
    }

    /// Declared argument names, in declaration order.
    pub fn arg_names(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(|(name, _)| name.as_str())
    }

    /// The underlying resolver.
    pub fn resolver(&self) -> &dyn ResolverCore {
        self.resolver
    }
}

impl<'a> ResolverCore for ConstructorArgs<'a> {
    fn resolve_bean(&self, name: &str) -> DiResult<Bean> {
        match self.args.iter().find(|(arg, _)| arg == name) {
            Some((_, bean)) => Ok(bean.clone()),
            None => self.resolver.resolve_bean(name),
        }
    }

    fn resolve_all(&self, types: &[TypeId]) -> DiResult<IndexMap<String, Bean>> {
        self.resolver.resolve_all(types)
    }

    fn contains(&self, name: &str) -> bool {
        self.resolver.contains(name)
    }
}
