//! Definition loading

use crate::container::Container;
use crate::definition::ComponentDefinition;
use crate::error::Result;

/// Supplies the base component definitions a build starts from.
///
/// The loader receives the container so it can draw fresh ids from the
/// container's own id sequence; definitions registered later in the build
/// (expanded values, override literals) continue the same sequence.
pub trait DefinitionLoader: Send + Sync {
    /// Produce the base definitions, in registration order
    fn load(&self, container: &mut Container) -> Result<Vec<ComponentDefinition>>;
}

/// A [`DefinitionLoader`] wrapping a closure
pub struct FnDefinitionLoader<F>(F);

impl<F> DefinitionLoader for FnDefinitionLoader<F>
where
    F: Fn(&mut Container) -> Result<Vec<ComponentDefinition>> + Send + Sync,
{
    fn load(&self, container: &mut Container) -> Result<Vec<ComponentDefinition>> {
        (self.0)(container)
    }
}

/// Wrap a closure as a [`DefinitionLoader`]
pub fn from_fn<F>(load: F) -> FnDefinitionLoader<F>
where
    F: Fn(&mut Container) -> Result<Vec<ComponentDefinition>> + Send + Sync,
{
    FnDefinitionLoader(load)
}
