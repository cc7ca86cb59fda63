//! Component descriptors for introspection and diagnostics.

use crate::definition::ComponentDefinition;

/// Read-only summary of a registered definition.
///
/// # Examples
///
/// ```rust
/// use ferrous_ioc::{ComponentCollection, ComponentDefinition};
///
/// #[derive(Default)]
/// struct Database;
///
/// let mut components = ComponentCollection::new();
/// components
///     .register(ComponentDefinition::builder::<Database>("db").with_default().lazy().build())
///     .unwrap();
///
/// let descriptors = components.descriptors();
/// assert_eq!(descriptors[0].name, "db");
/// assert!(descriptors[0].type_name.ends_with("Database"));
/// assert!(descriptors[0].lazy);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDescriptor {
    pub name: String,
    /// Type of the raw instance
    pub type_name: &'static str,
    /// Type other components see
    pub exposed_type_name: &'static str,
    /// Product type for producers
    pub product_type_name: Option<&'static str>,
    pub is_abstract: bool,
    pub lazy: bool,
    pub is_hook: bool,
    pub constructor_args: Vec<String>,
    pub depends_on: Vec<String>,
    pub fields: Vec<String>,
}

impl ComponentDescriptor {
    pub(crate) fn from_definition(def: &ComponentDefinition) -> Self {
        Self {
            name: def.name.clone(),
            type_name: def.type_name,
            exposed_type_name: def.exposed_type_name,
            product_type_name: def.product.map(|p| p.name),
            is_abstract: def.is_abstract(),
            lazy: def.lazy,
            is_hook: def.is_hook(),
            constructor_args: def.constructor_args.clone(),
            depends_on: def.depends_on.clone(),
            fields: def.field_dependencies().map(str::to_string).collect(),
        }
    }

    pub fn is_producer(&self) -> bool {
        self.product_type_name.is_some()
    }
}
