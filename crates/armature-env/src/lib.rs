//! OS-environment override source
//!
//! For every already-loaded component name, an environment lookup key is
//! derived by replacing `.` and `-` with `_` and upper-casing the result;
//! when the process environment holds that key, the component is
//! overridden with the environment value, bound by the same literal-only
//! rule as every override source. Only the overridden key is logged, never
//! its value.
//!
//! Linking this crate registers the source in
//! [`armature::EXTERNALIZED_LOADERS`], which replaces the default
//! global-property source (sources combine in registration order, later
//! ones winning on name collisions).

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use armature::externalize::check_overridable;
use armature::{
    ComponentDefinition, Container, ExternalizedLoader, ExternalizedLoaderEntry, LoadedComponents,
    Result, EXTERNALIZED_LOADERS,
};

#[linkme::distributed_slice(EXTERNALIZED_LOADERS)]
static OS_ENVIRONMENT: ExternalizedLoaderEntry = ExternalizedLoaderEntry {
    name: "os-environment",
    description: "Overrides literal components from OS environment variables",
    factory: || Arc::new(OsEnvironmentLoader::new()),
};

/// Override source backed by the process environment
pub struct OsEnvironmentLoader {
    environment: BTreeMap<String, String>,
}

impl OsEnvironmentLoader {
    /// Snapshot the process environment
    pub fn new() -> Self {
        Self {
            environment: std::env::vars().collect(),
        }
    }

    /// Use a fixed environment instead of the process one
    pub fn with_env(environment: BTreeMap<String, String>) -> Self {
        Self { environment }
    }

    /// Derive the environment lookup key for a component name
    pub fn lookup_key(name: &str) -> String {
        name.replace(['.', '-'], "_").to_uppercase()
    }
}

impl Default for OsEnvironmentLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ExternalizedLoader for OsEnvironmentLoader {
    fn load(
        &self,
        container: &mut Container,
        loaded: &LoadedComponents,
    ) -> Result<Vec<ComponentDefinition>> {
        let mut out = Vec::new();
        for name in loaded.keys() {
            let Some(value) = self.environment.get(&Self::lookup_key(name)) else {
                continue;
            };
            check_overridable(loaded, name)?;
            // the value stays out of the logs, it may be a secret
            info!(key = %name, "overriding component with environment variable");
            out.push(ComponentDefinition::literal(
                container.generate_id(),
                name.clone(),
                value.clone(),
            ));
        }
        Ok(out)
    }
}
