//! Marker-driven definition loader

use tracing::info;

use crate::container::Container;
use crate::definition::{ComponentDefinition, ComponentId, DefinitionBuilder};
use crate::error::Result;
use crate::externalize::{check_overridable, ExternalizedLoader, LoadedComponents};
use crate::key::TypeKey;

/// Registry entry for a marked component
///
/// Marked components register themselves with
/// `#[linkme::distributed_slice(MARKED_COMPONENTS)]`. A
/// [`MarkerDefinitionLoader`] scanning a matching namespace turns each
/// entry into one component definition, named by the first of: the
/// explicit `name`, the alternate type's key, the declared type's key.
pub struct MarkedComponentEntry {
    /// Namespace the component is declared under
    pub namespace: &'static str,
    /// Explicit component name; highest precedence
    pub name: Option<&'static str>,
    /// Alternate type designated to name the component
    pub alternate_type: Option<fn() -> TypeKey>,
    /// Declared type of the component; its key is the fallback name
    pub component_type: fn() -> TypeKey,
    /// Start the definition for a freshly minted id; the loader names and
    /// finishes it
    pub definition: fn(ComponentId) -> DefinitionBuilder,
}

// Auto-collection via linkme distributed slices - components submit entries at compile time
#[linkme::distributed_slice]
pub static MARKED_COMPONENTS: [MarkedComponentEntry] = [..];

/// Scans the marked-component registry for entries under a declared
/// namespace and loads each one as a component definition, bound by the
/// same literal-only override rule as every externalized source.
pub struct MarkerDefinitionLoader {
    base_namespace: String,
}

impl MarkerDefinitionLoader {
    /// Scan `base_namespace` and everything nested under it
    pub fn new(base_namespace: impl Into<String>) -> Self {
        Self {
            base_namespace: base_namespace.into(),
        }
    }

    fn in_scope(&self, namespace: &str) -> bool {
        namespace == self.base_namespace
            || namespace
                .strip_prefix(self.base_namespace.as_str())
                .is_some_and(|rest| rest.starts_with("::"))
    }

    fn component_name(entry: &MarkedComponentEntry) -> String {
        if let Some(name) = entry.name {
            return name.to_string();
        }
        if let Some(alternate) = entry.alternate_type {
            return alternate().name().to_string();
        }
        (entry.component_type)().name().to_string()
    }
}

impl ExternalizedLoader for MarkerDefinitionLoader {
    fn load(
        &self,
        container: &mut Container,
        loaded: &LoadedComponents,
    ) -> Result<Vec<ComponentDefinition>> {
        let mut out = Vec::new();
        for entry in MARKED_COMPONENTS {
            if !self.in_scope(entry.namespace) {
                continue;
            }
            let name = Self::component_name(entry);
            check_overridable(loaded, &name)?;
            let definition = (entry.definition)(container.generate_id())
                .named(name.clone())
                .build();
            info!(
                name = %name,
                component_type = %(entry.component_type)(),
                "loading marked component"
            );
            out.push(definition);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(namespace: &'static str) -> MarkedComponentEntry {
        struct Probe;
        MarkedComponentEntry {
            namespace,
            name: None,
            alternate_type: None,
            component_type: TypeKey::of::<Probe>,
            definition: |_| unreachable!(),
        }
    }

    #[test]
    fn namespace_scope_matches_exact_and_nested() {
        let loader = MarkerDefinitionLoader::new("app::services");
        assert!(loader.in_scope("app::services"));
        assert!(loader.in_scope("app::services::billing"));
        assert!(!loader.in_scope("app::servicesx"));
        assert!(!loader.in_scope("app"));
    }

    #[test]
    fn name_precedence_prefers_explicit_then_alternate() {
        struct Declared;
        trait Facade {}
        let mut e = entry("app");
        e.component_type = TypeKey::of::<Declared>;
        assert!(MarkerDefinitionLoader::component_name(&e).contains("Declared"));

        e.alternate_type = Some(TypeKey::of::<dyn Facade>);
        assert!(MarkerDefinitionLoader::component_name(&e).contains("Facade"));

        e.name = Some("explicit");
        assert_eq!(MarkerDefinitionLoader::component_name(&e), "explicit");
    }
}
