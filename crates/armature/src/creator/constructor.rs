//! Constructor-injection creation strategy

use std::sync::Arc;

use crate::container::Container;
use crate::creator::ComponentCreator;
use crate::definition::{ComponentDefinition, ComponentInstance};
use crate::error::{ContainerError, Result};
use crate::key::TypeKey;
use crate::literal::{self, LiteralKind};
use crate::trace::ReferenceStack;

/// One declared constructor parameter.
///
/// A parameter resolves, in order of precedence: a configuration-value
/// marker (named literal component, coerced), a component-reference marker
/// (by name, assignability-checked), or the declared type through the type
/// index (autowire; tolerates no match). Carrying both markers at once is a
/// configuration error.
#[derive(Clone, Debug)]
pub struct ConstructorParam {
    param_type: Option<TypeKey>,
    config: Option<(String, LiteralKind)>,
    reference: Option<String>,
}

impl ConstructorParam {
    /// Parameter carrying the configuration-value marker
    pub fn config_value(key: impl Into<String>, kind: LiteralKind) -> Self {
        Self {
            param_type: None,
            config: Some((key.into(), kind)),
            reference: None,
        }
    }

    /// Parameter carrying the component-reference marker; the referenced
    /// component must provide `T`'s type key
    pub fn component_ref<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self {
            param_type: Some(TypeKey::of::<T>()),
            config: None,
            reference: Some(name.into()),
        }
    }

    /// Unmarked parameter, resolved by declared type (autowire)
    pub fn by_type<T: ?Sized + 'static>() -> Self {
        Self {
            param_type: Some(TypeKey::of::<T>()),
            config: None,
            reference: None,
        }
    }

    /// Unmarked parameter against an explicit type key
    pub fn by_type_key(key: TypeKey) -> Self {
        Self {
            param_type: Some(key),
            config: None,
            reference: None,
        }
    }

    /// Add the component-reference marker on top of an existing marker.
    /// Declaring both markers is rejected at resolution time.
    pub fn with_component_ref(mut self, name: impl Into<String>) -> Self {
        self.reference = Some(name.into());
        self
    }

    fn resolve(
        &self,
        container: &mut Container,
        trace: &mut ReferenceStack,
    ) -> Result<Option<ComponentInstance>> {
        if self.config.is_some() && self.reference.is_some() {
            return Err(ContainerError::configuration(
                "both config-value and component-ref markers are set on one constructor parameter.",
            ));
        }
        if let Some((key, kind)) = &self.config {
            return Ok(Some(resolve_config_value(container, trace, key, *kind)?));
        }
        if let Some(name) = &self.reference {
            return Ok(Some(resolve_reference(
                container,
                trace,
                name,
                self.param_type,
            )?));
        }
        match self.param_type {
            Some(key) => container.resolve_by_type_key(key, trace),
            None => Ok(None),
        }
    }
}

fn resolve_config_value(
    container: &mut Container,
    trace: &mut ReferenceStack,
    key: &str,
    kind: LiteralKind,
) -> Result<ComponentInstance> {
    let definition = container.definition_by_name(key).ok_or_else(|| {
        ContainerError::configuration(format!("config value was not found. name = [{key}]"))
    })?;
    if !definition.is_literal() {
        return Err(ContainerError::configuration(format!(
            "config value is not a literal component. name = [{key}], component type = [{}]",
            definition.type_key()
        )));
    }
    let value = container.resolve_by_name(key, trace)?.ok_or_else(|| {
        ContainerError::configuration(format!("config value was not found. name = [{key}]"))
    })?;
    let raw = value.downcast_ref::<String>().ok_or_else(|| {
        ContainerError::configuration(format!(
            "config value is not a string literal. name = [{key}]"
        ))
    })?;
    literal::coerce(kind, key, raw)
}

fn resolve_reference(
    container: &mut Container,
    trace: &mut ReferenceStack,
    name: &str,
    param_type: Option<TypeKey>,
) -> Result<ComponentInstance> {
    let definition = container.definition_by_name(name).ok_or_else(|| {
        ContainerError::processing(format!(
            "component name to reference was not found. name = [{name}]"
        ))
    })?;
    if let Some(required) = param_type {
        if !definition.provided_keys().contains(&required) {
            return Err(ContainerError::processing(format!(
                "referenced component type mismatch. name = [{name}], \
                 parameter type = [{required}], component type = [{}]",
                definition.type_key()
            )));
        }
    }
    container.resolve_by_name(name, trace)?.ok_or_else(|| {
        ContainerError::processing(format!(
            "component name to reference was not found. name = [{name}]"
        ))
    })
}

/// Constructor arguments resolved in declaration order. Autowired
/// parameters with no match resolve to `None`.
pub struct ResolvedArgs {
    args: Vec<Option<ComponentInstance>>,
}

impl ResolvedArgs {
    /// Argument at `index`, downcast to `T`; fails when the argument is
    /// absent or of a different type
    pub fn required<T: Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>> {
        self.optional(index)?.ok_or_else(|| {
            ContainerError::processing(format!(
                "constructor argument [{index}] was not resolved."
            ))
        })
    }

    /// Argument at `index`, downcast to `T`, or `None` when the autowire
    /// found no match
    pub fn optional<T: Send + Sync + 'static>(&self, index: usize) -> Result<Option<Arc<T>>> {
        match self.args.get(index) {
            None => Err(ContainerError::processing(format!(
                "constructor argument index [{index}] out of range."
            ))),
            Some(None) => Ok(None),
            Some(Some(value)) => value.clone().downcast::<T>().map(Some).map_err(|_| {
                ContainerError::processing(format!(
                    "constructor argument [{index}] type mismatch. expected = [{}]",
                    std::any::type_name::<T>()
                ))
            }),
        }
    }
}

type BuildFn = Arc<dyn Fn(&ResolvedArgs) -> Result<ComponentInstance> + Send + Sync>;

/// Resolves each declared parameter in order, then invokes the registered
/// build function. With an empty parameter list it behaves exactly as the
/// default creator: construct now, set properties later.
pub struct ConstructorInjectionCreator {
    params: Vec<ConstructorParam>,
    build: BuildFn,
}

impl ConstructorInjectionCreator {
    /// Register a constructor with its parameter declarations
    pub fn new<F>(params: Vec<ConstructorParam>, build: F) -> Self
    where
        F: Fn(&ResolvedArgs) -> Result<ComponentInstance> + Send + Sync + 'static,
    {
        Self {
            params,
            build: Arc::new(build),
        }
    }
}

impl ComponentCreator for ConstructorInjectionCreator {
    fn create(
        &self,
        container: &mut Container,
        definition: &ComponentDefinition,
        trace: &mut ReferenceStack,
    ) -> Result<ComponentInstance> {
        let mut args = Vec::with_capacity(self.params.len());
        for param in &self.params {
            args.push(param.resolve(container, trace)?);
        }
        (self.build)(&ResolvedArgs { args }).map_err(|cause| match cause {
            err @ ContainerError::Processing { .. } => err,
            other => ContainerError::processing_with_source(
                format!(
                    "component instantiation failed. component type = [{}]",
                    definition.type_key()
                ),
                other,
            ),
        })
    }
}
