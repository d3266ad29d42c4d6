//! Global-property override source

use tracing::info;

use crate::container::Container;
use crate::definition::ComponentDefinition;
use crate::error::Result;
use crate::externalize::{check_overridable, ExternalizedLoader, LoadedComponents};
use crate::props;

/// Turns every entry of the process-wide property table into a
/// stored-literal string component named after its key, overriding any
/// already-loaded literal of the same name. The default override source
/// when no others are registered.
#[derive(Debug, Default)]
pub struct GlobalPropertyLoader;

impl GlobalPropertyLoader {
    /// Create the source
    pub fn new() -> Self {
        Self
    }
}

impl ExternalizedLoader for GlobalPropertyLoader {
    fn load(
        &self,
        container: &mut Container,
        loaded: &LoadedComponents,
    ) -> Result<Vec<ComponentDefinition>> {
        let mut out = Vec::new();
        for (key, value) in props::snapshot() {
            check_overridable(loaded, &key)?;
            if let Some(previous) = loaded.get(&key).and_then(|s| s.value.clone()) {
                info!(
                    key = %key,
                    previous = %previous,
                    new = %value,
                    "overriding component with global property"
                );
            }
            out.push(ComponentDefinition::literal(
                container.generate_id(),
                key,
                value,
            ));
        }
        Ok(out)
    }
}
