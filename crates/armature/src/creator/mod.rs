//! Component creation strategies
//!
//! A [`ComponentCreator`] turns a definition into a raw instance. Three
//! strategies exist:
//!
//! | Strategy | Behavior |
//! |----------|----------|
//! | [`DefaultCreator`] | no-argument construction; properties set later by the injection pass |
//! | [`ConstructorInjectionCreator`] | resolves declared constructor parameters, then builds |
//! | [`StoredValueCreator`] | returns an already-known value; used by override layers |

mod constructor;
mod default;
mod stored;

pub use constructor::{ConstructorInjectionCreator, ConstructorParam, ResolvedArgs};
pub use default::DefaultCreator;
pub use stored::StoredValueCreator;

use crate::container::Container;
use crate::definition::{ComponentDefinition, ComponentInstance};
use crate::error::Result;
use crate::trace::ReferenceStack;

/// Polymorphic creation strategy. Stateless and reusable across builds.
pub trait ComponentCreator: Send + Sync {
    /// Produce a raw instance for `definition`. Creators that resolve
    /// dependencies do so through `container`, threading `trace` so
    /// resolution failures report the full in-flight chain.
    fn create(
        &self,
        container: &mut Container,
        definition: &ComponentDefinition,
        trace: &mut ReferenceStack,
    ) -> Result<ComponentInstance>;

    /// The wrapped value, for stored-literal creators; `None` otherwise.
    /// Override sources use this to enforce the literal-only override rule.
    fn stored_value(&self) -> Option<&ComponentInstance> {
        None
    }
}
