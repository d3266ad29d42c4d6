//! Component capabilities
//!
//! Capabilities a component may implement, declared explicitly on its
//! definition (see [`crate::definition::DefinitionBuilder`]): value
//! production, factory production, and post-build initialization.

use crate::definition::{ComponentInstance, LoadedValue};
use crate::error::Result;

/// A value-producing component: contributes further name→value pairs that
/// are registered as stored-literal components during the build.
///
/// The container itself implements this trait, exposing the post-build
/// name→instance view.
pub trait ObjectLoader: Send + Sync {
    /// Produce the name→value mapping, in registration order
    fn load(&self) -> Result<Vec<(String, LoadedValue)>>;
}

/// An on-demand producer of one dependent object. The product, not the
/// factory, is what lookups hand out and what the type index records.
pub trait ComponentFactory: Send + Sync {
    /// Produce the deliverable; invoked once, immediately after the
    /// factory's own injection completes
    fn create_object(&self) -> Result<ComponentInstance>;
}

/// Post-build initialization hook, looked up once under
/// [`crate::container::INITIALIZER_COMPONENT_NAME`] after every other
/// holder has completed injection.
pub trait Initializer: Send + Sync {
    /// Run the initialization
    fn initialize(&self) -> Result<()>;
}
