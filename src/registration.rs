//! Definition registry.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::definition::ComponentDefinition;
use crate::error::{DiError, DiResult};
use crate::naming;

/// Definitions by name, in registration order.
#[derive(Default)]
pub(crate) struct Registry {
    definitions: IndexMap<String, Arc<ComponentDefinition>>,
}

impl Registry {
    /// Adds a definition. An override keeps the original registration position.
    pub(crate) fn insert(&mut self, def: ComponentDefinition, allow_override: bool) -> DiResult<()> {
        if !naming::is_registrable(&def.name) {
            return Err(DiError::InvalidName(def.name));
        }
        if self.definitions.contains_key(&def.name) {
            if !allow_override {
                return Err(DiError::DuplicateDefinition(def.name));
            }
            tracing::debug!(component = %def.name, "overriding definition");
        }
        self.definitions.insert(def.name.clone(), Arc::new(def));
        Ok(())
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Arc<ComponentDefinition>> {
        self.definitions.get(name)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<ComponentDefinition>> {
        self.definitions.values()
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub(crate) fn len(&self) -> usize {
        self.definitions.len()
    }
}
