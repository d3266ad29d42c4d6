//! Per-definition runtime records

use std::sync::Arc;

use crate::definition::{ComponentDefinition, ComponentInstance};

/// Lifecycle state of one component within a build.
///
/// Transitions run monotonically forward, with one exception: completing
/// injection on a holder already in `Injected` is a no-op, which is what
/// lets repeated and diamond references terminate.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ComponentState {
    /// Registered, not yet instantiated
    NotInstantiate,
    /// The creator is currently running
    Instantiating,
    /// Raw instance exists; references not yet applied
    Instantiated,
    /// References are currently being resolved and applied
    Injecting,
    /// Fully wired; the resolved instance is available
    Injected,
    /// Creation or injection failed; the build is aborting
    InjectionFailed,
}

impl std::fmt::Display for ComponentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::NotInstantiate => "NOT_INSTANTIATE",
            Self::Instantiating => "INSTANTIATING",
            Self::Instantiated => "INSTANTIATED",
            Self::Injecting => "INJECTING",
            Self::Injected => "INJECTED",
            Self::InjectionFailed => "INJECTION_FAILED",
        };
        f.write_str(label)
    }
}

/// Mutable runtime record tracking one component's build progress.
///
/// Wraps exactly one [`ComponentDefinition`]. `raw` is what the creator
/// produced; `resolved` is what lookups hand out, and differs from `raw`
/// only when a factory-capable component produced a nested deliverable.
#[derive(Debug)]
pub struct ComponentHolder {
    definition: Arc<ComponentDefinition>,
    state: ComponentState,
    raw: Option<ComponentInstance>,
    resolved: Option<ComponentInstance>,
}

impl ComponentHolder {
    /// Create a holder for a freshly registered definition
    pub fn new(definition: Arc<ComponentDefinition>) -> Self {
        Self {
            definition,
            state: ComponentState::NotInstantiate,
            raw: None,
            resolved: None,
        }
    }

    /// The wrapped definition
    pub fn definition(&self) -> &Arc<ComponentDefinition> {
        &self.definition
    }

    /// Current lifecycle state
    pub fn state(&self) -> ComponentState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ComponentState) {
        self.state = state;
    }

    /// The raw instance produced by the creator, if any
    pub fn raw(&self) -> Option<&ComponentInstance> {
        self.raw.as_ref()
    }

    pub(crate) fn set_raw(&mut self, instance: ComponentInstance) {
        self.raw = Some(instance);
    }

    pub(crate) fn take_raw(&mut self) -> Option<ComponentInstance> {
        self.raw.take()
    }

    pub(crate) fn restore_raw(&mut self, instance: ComponentInstance) {
        self.raw = Some(instance);
    }

    /// The fully-injected instance lookups hand out, if injection completed
    pub fn resolved(&self) -> Option<&ComponentInstance> {
        self.resolved.as_ref()
    }

    pub(crate) fn set_resolved(&mut self, instance: ComponentInstance) {
        self.resolved = Some(instance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creator::StoredValueCreator;
    use crate::definition::instance;
    use crate::ComponentId;

    #[test]
    fn fresh_holder_starts_not_instantiated() {
        let def = ComponentDefinition::builder::<String>(
            ComponentId(0),
            StoredValueCreator::new(instance("hello".to_string())),
        )
        .named("greeting")
        .build();
        let holder = ComponentHolder::new(Arc::new(def));
        assert_eq!(holder.state(), ComponentState::NotInstantiate);
        assert!(holder.raw().is_none());
        assert!(holder.resolved().is_none());
    }

    #[test]
    fn state_labels_render_like_the_wire_names() {
        assert_eq!(ComponentState::NotInstantiate.to_string(), "NOT_INSTANTIATE");
        assert_eq!(ComponentState::Injected.to_string(), "INJECTED");
    }
}
