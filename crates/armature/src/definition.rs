//! Component definitions
//!
//! A [`ComponentDefinition`] is the immutable blueprint describing how to
//! build and wire one component: identity, optional name, declared type
//! key, creation strategy, declared references, and optional capabilities.
//!
//! Everything the container needs to know about a component is declared
//! explicitly at registration time: the "provides" list for the type
//! index, typed setter closures for property wiring, and declared
//! capabilities for value production, factory production, and
//! initialization.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::capability::{ComponentFactory, Initializer, ObjectLoader};
use crate::container::Container;
use crate::creator::{ComponentCreator, StoredValueCreator};
use crate::error::{ContainerError, Result};
use crate::key::TypeKey;
use crate::trace::ReferenceStack;

/// Type-erased component instance
pub type ComponentInstance = Arc<dyn Any + Send + Sync>;

/// Wrap a value as a [`ComponentInstance`]
pub fn instance<T: Send + Sync + 'static>(value: T) -> ComponentInstance {
    Arc::new(value)
}

/// Unique component identifier, monotonically assigned within one build
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ComponentId(pub usize);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// How a declared reference finds its target
#[derive(Clone, Debug)]
pub enum InjectionKind {
    /// Resolve by component id; the target must exist
    ById(ComponentId),
    /// Resolve by component name; the target must exist
    ByName(String),
    /// Resolve through the type index; absence and ambiguity are tolerated
    ByType(TypeKey),
    /// Autowire by name; absence is tolerated
    AutoByName(String),
}

/// Where an applied reference writes its value
#[derive(Clone)]
pub enum PropertySetter {
    /// Ordinary instance property
    Instance(Arc<dyn Fn(&mut (dyn Any + Send + Sync), ComponentInstance) -> Result<()> + Send + Sync>),
    /// Class-level (process-global) target; gated by the static-injection switch
    Static(Arc<dyn Fn(ComponentInstance) -> Result<()> + Send + Sync>),
}

impl fmt::Debug for PropertySetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(_) => f.write_str("PropertySetter::Instance"),
            Self::Static(_) => f.write_str("PropertySetter::Static"),
        }
    }
}

/// Deprecation note on a property; the value is still set after warning
#[derive(Clone, Debug, Default)]
pub struct Deprecation {
    /// Configured reason, cited in the warning when present
    pub reason: Option<String>,
}

/// One declared reference of a component definition
#[derive(Clone, Debug)]
pub struct ComponentReference {
    property: String,
    kind: InjectionKind,
    setter: PropertySetter,
    deprecation: Option<Deprecation>,
}

fn instance_setter<C, V>(
    property: &str,
    set: impl Fn(&mut C, Arc<V>) + Send + Sync + 'static,
) -> PropertySetter
where
    C: Any + Send + Sync,
    V: Any + Send + Sync,
{
    let property = property.to_string();
    PropertySetter::Instance(Arc::new(move |target, value| {
        let target = target.downcast_mut::<C>().ok_or_else(|| {
            ContainerError::processing(format!(
                "property target type mismatch. property = [{property}]"
            ))
        })?;
        let value = value.downcast::<V>().map_err(|_| {
            ContainerError::processing(format!(
                "injected value type mismatch. property = [{property}]"
            ))
        })?;
        set(target, value);
        Ok(())
    }))
}

impl ComponentReference {
    /// Reference resolved by component id (required)
    pub fn by_id<C, V>(
        property: impl Into<String>,
        target: ComponentId,
        set: impl Fn(&mut C, Arc<V>) + Send + Sync + 'static,
    ) -> Self
    where
        C: Any + Send + Sync,
        V: Any + Send + Sync,
    {
        let property = property.into();
        let setter = instance_setter(&property, set);
        Self {
            property,
            kind: InjectionKind::ById(target),
            setter,
            deprecation: None,
        }
    }

    /// Reference resolved by component name (required)
    pub fn by_name<C, V>(
        property: impl Into<String>,
        name: impl Into<String>,
        set: impl Fn(&mut C, Arc<V>) + Send + Sync + 'static,
    ) -> Self
    where
        C: Any + Send + Sync,
        V: Any + Send + Sync,
    {
        let property = property.into();
        let setter = instance_setter(&property, set);
        Self {
            property,
            kind: InjectionKind::ByName(name.into()),
            setter,
            deprecation: None,
        }
    }

    /// Autowire reference resolved through the type index; left untouched
    /// when the type is absent or ambiguous
    pub fn by_type<C, V>(
        property: impl Into<String>,
        set: impl Fn(&mut C, Arc<V>) + Send + Sync + 'static,
    ) -> Self
    where
        C: Any + Send + Sync,
        V: Any + Send + Sync,
    {
        let property = property.into();
        let setter = instance_setter(&property, set);
        Self {
            property,
            kind: InjectionKind::ByType(TypeKey::of::<V>()),
            setter,
            deprecation: None,
        }
    }

    /// Autowire reference against an explicit type key. The setter receives
    /// the untyped instance; useful when the key names a trait or alias.
    pub fn by_type_key<C>(
        property: impl Into<String>,
        key: TypeKey,
        set: impl Fn(&mut C, ComponentInstance) + Send + Sync + 'static,
    ) -> Self
    where
        C: Any + Send + Sync,
    {
        let property = property.into();
        let message_property = property.clone();
        let setter = PropertySetter::Instance(Arc::new(move |target, value| {
            let target = target.downcast_mut::<C>().ok_or_else(|| {
                ContainerError::processing(format!(
                    "property target type mismatch. property = [{message_property}]"
                ))
            })?;
            set(target, value);
            Ok(())
        }));
        Self {
            property,
            kind: InjectionKind::ByType(key),
            setter,
            deprecation: None,
        }
    }

    /// Autowire reference resolved by name; left untouched when absent
    pub fn auto_by_name<C, V>(
        property: impl Into<String>,
        name: impl Into<String>,
        set: impl Fn(&mut C, Arc<V>) + Send + Sync + 'static,
    ) -> Self
    where
        C: Any + Send + Sync,
        V: Any + Send + Sync,
    {
        let property = property.into();
        let setter = instance_setter(&property, set);
        Self {
            property,
            kind: InjectionKind::AutoByName(name.into()),
            setter,
            deprecation: None,
        }
    }

    /// Reference whose setter writes class-level (process-global) state.
    /// Rejected at injection time unless the container was constructed with
    /// the static-injection opt-in.
    pub fn static_by_name<V>(
        property: impl Into<String>,
        name: impl Into<String>,
        set: impl Fn(Arc<V>) + Send + Sync + 'static,
    ) -> Self
    where
        V: Any + Send + Sync,
    {
        let property = property.into();
        let message_property = property.clone();
        let setter = PropertySetter::Static(Arc::new(move |value| {
            let value = value.downcast::<V>().map_err(|_| {
                ContainerError::processing(format!(
                    "injected value type mismatch. property = [{message_property}]"
                ))
            })?;
            set(value);
            Ok(())
        }));
        Self {
            property,
            kind: InjectionKind::ByName(name.into()),
            setter,
            deprecation: None,
        }
    }

    /// Flag the target property as deprecated with no configured reason
    pub fn deprecated(mut self) -> Self {
        self.deprecation = Some(Deprecation::default());
        self
    }

    /// Flag the target property as deprecated, citing a reason
    pub fn deprecated_because(mut self, reason: impl Into<String>) -> Self {
        self.deprecation = Some(Deprecation {
            reason: Some(reason.into()),
        });
        self
    }

    /// Property the reference sets
    pub fn property(&self) -> &str {
        &self.property
    }

    /// How the target is resolved
    pub fn kind(&self) -> &InjectionKind {
        &self.kind
    }

    pub(crate) fn setter(&self) -> &PropertySetter {
        &self.setter
    }

    pub(crate) fn deprecation(&self) -> Option<&Deprecation> {
        self.deprecation.as_ref()
    }
}

/// Custom completion strategy; replaces the default per-property loop
/// entirely when a definition declares one
pub trait ComponentInjector: Send + Sync {
    /// Apply the definition's wiring to `target`
    fn complete_inject(
        &self,
        container: &mut Container,
        definition: &ComponentDefinition,
        target: &mut (dyn Any + Send + Sync),
        trace: &mut ReferenceStack,
    ) -> Result<()>;
}

type CapabilityFn<R> = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> Result<R> + Send + Sync>;

/// Declared factory capability: produce one nested deliverable after the
/// factory component itself completes injection
#[derive(Clone)]
pub(crate) struct FactorySpec {
    pub(crate) product_key: TypeKey,
    pub(crate) product_provides: Vec<TypeKey>,
    pub(crate) produce: CapabilityFn<ComponentInstance>,
}

/// Immutable descriptor of one component
pub struct ComponentDefinition {
    id: ComponentId,
    name: Option<String>,
    type_key: TypeKey,
    provides: Vec<TypeKey>,
    creator: Arc<dyn ComponentCreator>,
    references: Vec<ComponentReference>,
    injector: Option<Arc<dyn ComponentInjector>>,
    use_id_only: bool,
    object_loader: Option<CapabilityFn<Vec<(String, LoadedValue)>>>,
    factory: Option<FactorySpec>,
    initializer: Option<CapabilityFn<()>>,
}

/// One value contributed by a value-producing component
pub struct LoadedValue {
    /// The value itself
    pub value: ComponentInstance,
    /// Runtime type key the value registers under
    pub type_key: TypeKey,
    /// Additional keys the value provides
    pub provides: Vec<TypeKey>,
}

impl LoadedValue {
    /// Wrap a value under its own type key
    pub fn of<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_key: TypeKey::of::<T>(),
            provides: Vec::new(),
        }
    }
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type_key", &self.type_key)
            .field("references", &self.references.len())
            .field("use_id_only", &self.use_id_only)
            .finish_non_exhaustive()
    }
}

impl ComponentDefinition {
    /// Start building a definition for type `T`
    pub fn builder<T: ?Sized + 'static>(
        id: ComponentId,
        creator: impl ComponentCreator + 'static,
    ) -> DefinitionBuilder {
        DefinitionBuilder::new(id, TypeKey::of::<T>(), Arc::new(creator))
    }

    /// Start building a definition under an explicit type key
    pub fn builder_for_key(
        id: ComponentId,
        type_key: TypeKey,
        creator: Arc<dyn ComponentCreator>,
    ) -> DefinitionBuilder {
        DefinitionBuilder::new(id, type_key, creator)
    }

    /// A named stored-literal string definition, the shape every override
    /// source produces
    pub fn literal(id: ComponentId, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::builder::<String>(id, StoredValueCreator::new(instance(value.into())))
            .named(name)
            .build()
    }

    /// Unique identifier
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Component name, when the definition is named
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Declared type key
    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    /// Creation strategy
    pub fn creator(&self) -> &Arc<dyn ComponentCreator> {
        &self.creator
    }

    /// Declared references, in declaration order
    pub fn references(&self) -> &[ComponentReference] {
        &self.references
    }

    /// Custom completion strategy, if declared
    pub fn injector(&self) -> Option<&Arc<dyn ComponentInjector>> {
        self.injector.as_ref()
    }

    /// `true` when the definition is excluded from the name and type indices
    pub fn use_id_only(&self) -> bool {
        self.use_id_only
    }

    /// `true` when the creator wraps an already-known literal value
    pub fn is_literal(&self) -> bool {
        self.creator.stored_value().is_some()
    }

    /// Every type key this definition registers under in the type index.
    /// Factory-capable definitions register their product's keys.
    pub fn provided_keys(&self) -> Vec<TypeKey> {
        let mut keys = Vec::new();
        let mut push = |key: TypeKey| {
            if !keys.contains(&key) {
                keys.push(key);
            }
        };
        if let Some(factory) = &self.factory {
            push(factory.product_key);
            for key in &factory.product_provides {
                push(*key);
            }
        } else {
            push(self.type_key);
            for key in &self.provides {
                push(*key);
            }
        }
        keys
    }

    pub(crate) fn object_loader(&self) -> Option<&CapabilityFn<Vec<(String, LoadedValue)>>> {
        self.object_loader.as_ref()
    }

    pub(crate) fn factory(&self) -> Option<&FactorySpec> {
        self.factory.as_ref()
    }

    pub(crate) fn initializer_capability(&self) -> Option<&CapabilityFn<()>> {
        self.initializer.as_ref()
    }
}

/// Builder for [`ComponentDefinition`]
pub struct DefinitionBuilder {
    id: ComponentId,
    name: Option<String>,
    type_key: TypeKey,
    provides: Vec<TypeKey>,
    creator: Arc<dyn ComponentCreator>,
    references: Vec<ComponentReference>,
    injector: Option<Arc<dyn ComponentInjector>>,
    use_id_only: bool,
    object_loader: Option<CapabilityFn<Vec<(String, LoadedValue)>>>,
    factory: Option<FactorySpec>,
    initializer: Option<CapabilityFn<()>>,
}

impl DefinitionBuilder {
    fn new(id: ComponentId, type_key: TypeKey, creator: Arc<dyn ComponentCreator>) -> Self {
        Self {
            id,
            name: None,
            type_key,
            provides: Vec::new(),
            creator,
            references: Vec::new(),
            injector: None,
            use_id_only: false,
            object_loader: None,
            factory: None,
            initializer: None,
        }
    }

    /// Name the component
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declare an additional type key this component provides
    pub fn provides(mut self, key: TypeKey) -> Self {
        self.provides.push(key);
        self
    }

    /// Declare a reference
    pub fn reference(mut self, reference: ComponentReference) -> Self {
        self.references.push(reference);
        self
    }

    /// Replace the default per-property injection with a custom strategy
    pub fn custom_injector(mut self, injector: impl ComponentInjector + 'static) -> Self {
        self.injector = Some(Arc::new(injector));
        self
    }

    /// Exclude this definition from the name and type indices
    pub fn id_only(mut self) -> Self {
        self.use_id_only = true;
        self
    }

    /// Declare that the component is value-producing: after eager creation
    /// and injection, `T::load` contributes further components
    pub fn object_loader<T>(mut self) -> Self
    where
        T: ObjectLoader + Any + Send + Sync,
    {
        self.object_loader = Some(Arc::new(|raw| {
            let loader = raw.downcast_ref::<T>().ok_or_else(|| {
                ContainerError::processing("object loader instantiation failed.")
            })?;
            loader.load()
        }));
        self
    }

    /// Declare that the component is a factory producing one deliverable of
    /// the given product key
    pub fn factory<T>(mut self, product_key: TypeKey) -> Self
    where
        T: ComponentFactory + Any + Send + Sync,
    {
        self.factory = Some(FactorySpec {
            product_key,
            product_provides: Vec::new(),
            produce: Arc::new(|raw| {
                let factory = raw.downcast_ref::<T>().ok_or_else(|| {
                    ContainerError::processing("component factory instantiation failed.")
                })?;
                factory.create_object()
            }),
        });
        self
    }

    /// Declare an additional key the factory's product provides
    pub fn factory_provides(mut self, key: TypeKey) -> Self {
        if let Some(factory) = &mut self.factory {
            factory.product_provides.push(key);
        }
        self
    }

    /// Declare that the component carries the post-build initializer
    /// capability
    pub fn initializer<T>(mut self) -> Self
    where
        T: Initializer + Any + Send + Sync,
    {
        self.initializer = Some(Arc::new(|raw| {
            let initializer = raw.downcast_ref::<T>().ok_or_else(|| {
                ContainerError::processing("initializer component has no initializer capability.")
            })?;
            initializer.initialize()
        }));
        self
    }

    /// Finish the definition
    pub fn build(self) -> ComponentDefinition {
        ComponentDefinition {
            id: self.id,
            name: self.name,
            type_key: self.type_key,
            provides: self.provides,
            creator: self.creator,
            references: self.references,
            injector: self.injector,
            use_id_only: self.use_id_only,
            object_loader: self.object_loader,
            factory: self.factory,
            initializer: self.initializer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_definition_is_literal() {
        let def = ComponentDefinition::literal(ComponentId(3), "foo.bar", "original");
        assert!(def.is_literal());
        assert_eq!(def.name(), Some("foo.bar"));
        assert_eq!(def.type_key(), TypeKey::of::<String>());
    }

    #[test]
    fn provided_keys_deduplicate() {
        let def = ComponentDefinition::builder::<String>(
            ComponentId(0),
            StoredValueCreator::new(instance("v".to_string())),
        )
        .provides(TypeKey::of::<String>())
        .provides(TypeKey::named("alias"))
        .build();
        let keys = def.provided_keys();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&TypeKey::named("alias")));
    }

    #[test]
    fn deprecation_carries_reason() {
        struct Target;
        let reference = ComponentReference::by_name::<Target, String>("legacy", "x", |_, _| {})
            .deprecated_because("use `modern` instead");
        assert_eq!(
            reference.deprecation().and_then(|d| d.reason.as_deref()),
            Some("use `modern` instead")
        );
    }
}
