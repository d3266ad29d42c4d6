//! Stored-literal creation strategy

use crate::container::Container;
use crate::creator::ComponentCreator;
use crate::definition::{ComponentDefinition, ComponentInstance};
use crate::error::Result;
use crate::trace::ReferenceStack;

/// Wraps an already-known value and returns it as the created instance,
/// ignoring the declared type. Used exclusively by override layers and by
/// values contributed by value-producing components.
pub struct StoredValueCreator {
    value: ComponentInstance,
}

impl StoredValueCreator {
    /// Wrap a previously computed value
    pub fn new(value: ComponentInstance) -> Self {
        Self { value }
    }
}

impl ComponentCreator for StoredValueCreator {
    fn create(
        &self,
        _container: &mut Container,
        _definition: &ComponentDefinition,
        _trace: &mut ReferenceStack,
    ) -> Result<ComponentInstance> {
        Ok(self.value.clone())
    }

    fn stored_value(&self) -> Option<&ComponentInstance> {
        Some(&self.value)
    }
}
