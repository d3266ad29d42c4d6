//! Default-construct creation strategy

use std::sync::Arc;

use crate::container::Container;
use crate::creator::ComponentCreator;
use crate::definition::{ComponentDefinition, ComponentInstance};
use crate::error::{ContainerError, Result};
use crate::trace::ReferenceStack;

type ConstructFn = Arc<dyn Fn() -> Result<ComponentInstance> + Send + Sync>;

/// Instantiates via a registered no-argument constructor; the container's
/// injection pass sets properties afterwards.
pub struct DefaultCreator {
    construct: ConstructFn,
}

impl DefaultCreator {
    /// Wrap an infallible no-argument constructor
    pub fn new<T, F>(construct: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            construct: Arc::new(move || Ok(Arc::new(construct()) as ComponentInstance)),
        }
    }

    /// Wrap a fallible constructor. A failure is wrapped into a processing
    /// error naming the constructed type and preserving the root cause.
    pub fn try_new<T, F, E>(construct: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> std::result::Result<T, E> + Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            construct: Arc::new(move || match construct() {
                Ok(value) => Ok(Arc::new(value) as ComponentInstance),
                Err(cause) => Err(ContainerError::processing_with_source(
                    format!(
                        "component instantiation failed. component type = [{}]",
                        std::any::type_name::<T>()
                    ),
                    cause,
                )),
            }),
        }
    }
}

impl ComponentCreator for DefaultCreator {
    fn create(
        &self,
        _container: &mut Container,
        _definition: &ComponentDefinition,
        _trace: &mut ReferenceStack,
    ) -> Result<ComponentInstance> {
        (self.construct)()
    }
}
