//! Externalized override chain
//!
//! After base registration, the container consults an ordered chain of
//! override sources. Each source may replace already-registered components
//! by name, bound by the literal-only rule: only a component whose value is
//! already a stored literal may be overridden; replacing a constructed
//! component is a fatal configuration error.
//!
//! Sources auto-register via `#[linkme::distributed_slice(EXTERNALIZED_LOADERS)]`
//! and are discovered at container construction. With no registered
//! sources, the built-in [`GlobalPropertyLoader`] is used alone; with one
//! or more, they entirely replace the default and run through the
//! [`CompositeExternalizedLoader`] in registration order, later sources
//! winning on name collisions.

mod global_props;
mod marker;

pub use global_props::GlobalPropertyLoader;
pub use marker::{MarkedComponentEntry, MarkerDefinitionLoader, MARKED_COMPONENTS};

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::container::Container;
use crate::definition::ComponentDefinition;
use crate::error::{ContainerError, Result};
use crate::key::TypeKey;

/// What an override source is allowed to see about an already-loaded
/// component: its declared type, whether it is a stored literal, and the
/// literal's string value when it has one
#[derive(Clone, Debug)]
pub struct LoadedComponentSummary {
    /// Declared type key of the current owner of the name
    pub type_key: TypeKey,
    /// `true` when the current owner is a stored-literal component
    pub literal: bool,
    /// The stored string value, for literal string components
    pub value: Option<String>,
}

/// Name-indexed view of the already-loaded components a source runs against
pub type LoadedComponents = BTreeMap<String, LoadedComponentSummary>;

/// One override source. Returned definitions replace the current owner of
/// their name; sources enforce the literal-only rule against the view they
/// were handed.
pub trait ExternalizedLoader: Send + Sync {
    /// Produce replacement definitions, minting ids from `container`
    fn load(
        &self,
        container: &mut Container,
        loaded: &LoadedComponents,
    ) -> Result<Vec<ComponentDefinition>>;
}

/// Registry entry for externalized override sources
///
/// Each source registers itself with
/// `#[linkme::distributed_slice(EXTERNALIZED_LOADERS)]`.
pub struct ExternalizedLoaderEntry {
    /// Unique source name
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Factory function to create the source instance
    pub factory: fn() -> Arc<dyn ExternalizedLoader>,
}

// Auto-collection via linkme distributed slices - sources submit entries at compile time
#[linkme::distributed_slice]
pub static EXTERNALIZED_LOADERS: [ExternalizedLoaderEntry] = [..];

/// Assemble the override chain from the registry.
///
/// No registered sources yields the default global-property source; one
/// or more yield a composite over all of them in registration order.
pub fn discover() -> Arc<dyn ExternalizedLoader> {
    if EXTERNALIZED_LOADERS.is_empty() {
        debug!("no externalized loaders registered, using global properties");
        return Arc::new(GlobalPropertyLoader::new());
    }
    let sources: Vec<Arc<dyn ExternalizedLoader>> = EXTERNALIZED_LOADERS
        .iter()
        .map(|entry| {
            debug!(source = entry.name, "discovered externalized loader");
            (entry.factory)()
        })
        .collect();
    Arc::new(CompositeExternalizedLoader::new(sources))
}

/// List all registered override sources as (name, description) pairs
pub fn list_externalized_loaders() -> Vec<(&'static str, &'static str)> {
    EXTERNALIZED_LOADERS
        .iter()
        .map(|entry| (entry.name, entry.description))
        .collect()
}

/// Runs each source in order against an accumulating view: a source sees
/// the pre-existing snapshot plus every definition earlier sources produced
/// in the same pass. Later sources win on name collisions.
pub struct CompositeExternalizedLoader {
    sources: Vec<Arc<dyn ExternalizedLoader>>,
}

impl CompositeExternalizedLoader {
    /// Compose the given sources, consulted in order
    pub fn new(sources: Vec<Arc<dyn ExternalizedLoader>>) -> Self {
        Self { sources }
    }
}

impl ExternalizedLoader for CompositeExternalizedLoader {
    fn load(
        &self,
        container: &mut Container,
        loaded: &LoadedComponents,
    ) -> Result<Vec<ComponentDefinition>> {
        let mut cumulative = loaded.clone();
        let mut merged: BTreeMap<String, ComponentDefinition> = BTreeMap::new();
        for source in &self.sources {
            for definition in source.load(container, &cumulative)? {
                let Some(name) = definition.name().map(str::to_string) else {
                    return Err(ContainerError::configuration(
                        "externalized loader produced an unnamed definition.",
                    ));
                };
                cumulative.insert(
                    name.clone(),
                    LoadedComponentSummary {
                        type_key: definition.type_key(),
                        literal: definition.is_literal(),
                        value: definition
                            .creator()
                            .stored_value()
                            .and_then(|value| value.downcast_ref::<String>().cloned()),
                    },
                );
                merged.insert(name, definition);
            }
        }
        Ok(merged.into_values().collect())
    }
}

/// Enforce the literal-only override rule for `key` against `loaded`.
/// A name that is not loaded at all may be introduced freely.
pub fn check_overridable(loaded: &LoadedComponents, key: &str) -> Result<()> {
    match loaded.get(key) {
        Some(existing) if !existing.literal => Err(ContainerError::IllegalOverride {
            key: key.to_string(),
            previous_type: existing.type_key.name().to_string(),
        }),
        _ => Ok(()),
    }
}
