//! Container orchestration
//!
//! The [`Container`] drives one build from declarative definitions to a
//! fully wired object graph:
//!
//! 1. reset the id counter and all three indices
//! 2. pull the base definitions from the [`DefinitionLoader`] and register
//!    them (id index always; name and type indices unless `id_only`)
//! 3. eagerly expand every value-producing component into stored-literal
//!    definitions
//! 4. run the externalized override chain, replacing literal components
//! 5. instantiate every holder still in `NOT_INSTANTIATE`
//! 6. complete injection for every holder in `INSTANTIATED`
//! 7. invoke the reserved-name initializer, once, last
//!
//! Lookups by id, name, and type key are usable at any point after step 2
//! and lazily complete any holder they reach. The build itself is
//! single-threaded by construction: every resolving operation takes
//! `&mut self`, so concurrent structural mutation cannot compile. Once a
//! build completes, the graph is read through shared clones of the resolved
//! instances.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::env;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::capability::ObjectLoader;
use crate::creator::StoredValueCreator;
use crate::definition::{
    ComponentDefinition, ComponentId, ComponentInstance, InjectionKind, LoadedValue,
    PropertySetter,
};
use crate::error::{ContainerError, Result};
use crate::externalize::{self, ExternalizedLoader, LoadedComponentSummary, LoadedComponents};
use crate::holder::{ComponentHolder, ComponentState};
use crate::key::TypeKey;
use crate::loader::DefinitionLoader;
use crate::trace::ReferenceStack;

/// Reserved name of the post-build initializer component
pub const INITIALIZER_COMPONENT_NAME: &str = "initializer";

/// Environment variable enabling injection into class-level targets.
/// Read once, at container construction.
pub const STATIC_INJECTION_ENV: &str = "ARMATURE_ALLOW_STATIC_INJECTION";

enum Resolution {
    Resolved(ComponentInstance),
    Blocked(ComponentState),
}

/// Runtime object-graph assembler.
///
/// Construction runs a full build; [`Container::reload`] rebuilds from
/// scratch. A fatal error during a build leaves the container unusable.
pub struct Container {
    loader: Arc<dyn DefinitionLoader>,
    externalized: Arc<dyn ExternalizedLoader>,
    allow_static_injection: bool,
    next_id: usize,
    holders: BTreeMap<ComponentId, ComponentHolder>,
    name_index: HashMap<String, ComponentId>,
    type_index: HashMap<TypeKey, ComponentId>,
    multi_registered: HashSet<TypeKey>,
}

impl Container {
    /// Build a container from a definition loader, discovering override
    /// sources through the registry (falling back to the global-property
    /// source when none are registered)
    pub fn new(loader: impl DefinitionLoader + 'static) -> Result<Self> {
        Self::with_externalized_loader(loader, externalize::discover())
    }

    /// Build a container with an explicit override chain
    pub fn with_externalized_loader(
        loader: impl DefinitionLoader + 'static,
        externalized: Arc<dyn ExternalizedLoader>,
    ) -> Result<Self> {
        let allow_static_injection =
            env::var(STATIC_INJECTION_ENV).is_ok_and(|value| value == "true");
        Self::with_options(Arc::new(loader), externalized, allow_static_injection)
    }

    /// Build a container with every collaborator supplied explicitly
    pub fn with_options(
        loader: Arc<dyn DefinitionLoader>,
        externalized: Arc<dyn ExternalizedLoader>,
        allow_static_injection: bool,
    ) -> Result<Self> {
        let mut container = Self {
            loader,
            externalized,
            allow_static_injection,
            next_id: 0,
            holders: BTreeMap::new(),
            name_index: HashMap::new(),
            type_index: HashMap::new(),
            multi_registered: HashSet::new(),
        };
        container.reload()?;
        Ok(container)
    }

    /// Mint the next unique component id
    pub fn generate_id(&mut self) -> ComponentId {
        let id = ComponentId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Rebuild the whole graph from scratch
    pub fn reload(&mut self) -> Result<()> {
        self.next_id = 0;
        self.holders.clear();
        self.name_index.clear();
        self.type_index.clear();
        self.multi_registered.clear();

        let loader = Arc::clone(&self.loader);
        for definition in loader.load(self)? {
            self.register(definition);
        }
        debug!(definitions = self.holders.len(), "registered base definitions");
        self.dump_registrations();

        let mut stack = ReferenceStack::new();
        self.expand_object_loaders(&mut stack)?;
        self.apply_externalized_overrides()?;

        let ids: Vec<ComponentId> = self.holders.keys().copied().collect();
        for id in &ids {
            if self.holder(*id)?.state() == ComponentState::NotInstantiate {
                self.create_component(*id, None, &mut stack)?;
            }
        }
        for id in &ids {
            if self.holder(*id)?.state() == ComponentState::Instantiated {
                self.complete_inject(*id, None, &mut stack)?;
            }
        }
        self.run_initializer(&mut stack)?;
        debug!(components = self.holders.len(), "container build completed");
        Ok(())
    }

    /// Register one definition. Replaces any previous owner of the same
    /// name in the name index; the type index applies the ambiguity rule.
    pub fn register(&mut self, definition: ComponentDefinition) {
        let definition = Arc::new(definition);
        let id = definition.id();
        self.next_id = self.next_id.max(id.0 + 1);
        if !definition.use_id_only() {
            if let Some(name) = definition.name() {
                self.name_index.insert(name.to_string(), id);
            }
            for key in definition.provided_keys() {
                self.put_type_index(key, id);
            }
        }
        self.holders.insert(id, ComponentHolder::new(definition));
    }

    // A key registered by two distinct components is evicted and stays
    // evicted: later type lookups for it always miss.
    fn put_type_index(&mut self, key: TypeKey, id: ComponentId) {
        if self.multi_registered.contains(&key) {
            return;
        }
        match self.type_index.get(&key) {
            Some(existing) if *existing != id => {
                self.type_index.remove(&key);
                self.multi_registered.insert(key);
            }
            Some(_) => {}
            None => {
                self.type_index.insert(key, id);
            }
        }
    }

    fn dump_registrations(&self) {
        if !tracing::enabled!(tracing::Level::TRACE) {
            return;
        }
        for holder in self.holders.values() {
            let definition = holder.definition();
            trace!(
                id = %definition.id(),
                name = definition.name().unwrap_or(""),
                component_type = %definition.type_key(),
                "registered component definition"
            );
        }
    }

    // Step 3: every value-producing holder is built eagerly and its
    // contributed name→value pairs become stored-literal definitions that
    // participate in the remaining steps.
    fn expand_object_loaders(&mut self, stack: &mut ReferenceStack) -> Result<()> {
        let loader_ids: Vec<ComponentId> = self
            .holders
            .values()
            .filter(|holder| holder.definition().object_loader().is_some())
            .map(|holder| holder.definition().id())
            .collect();
        for id in loader_ids {
            let definition = Arc::clone(self.holder(id)?.definition());
            let Some(load) = definition.object_loader().map(Arc::clone) else {
                continue;
            };
            let instance = self.resolve_by_id(id, stack)?;
            let entries = load(instance.as_ref())?;
            debug!(
                source = definition.name().unwrap_or(""),
                values = entries.len(),
                "expanded value-producing component"
            );
            for (name, loaded) in entries {
                self.register_loaded_value(name, loaded);
            }
        }
        Ok(())
    }

    fn register_loaded_value(&mut self, name: String, loaded: LoadedValue) {
        let id = self.generate_id();
        let mut builder = ComponentDefinition::builder_for_key(
            id,
            loaded.type_key,
            Arc::new(StoredValueCreator::new(loaded.value)),
        )
        .named(name);
        for key in loaded.provides {
            builder = builder.provides(key);
        }
        self.register(builder.build());
    }

    // Step 4: the override chain sees the current name-indexed snapshot and
    // returns replacement definitions, each bound by the literal-only rule
    // (enforced by the sources themselves against their cumulative view).
    fn apply_externalized_overrides(&mut self) -> Result<()> {
        let loaded = self.loaded_components_view();
        let externalized = Arc::clone(&self.externalized);
        let overrides = externalized.load(self, &loaded)?;
        if !overrides.is_empty() {
            debug!(overrides = overrides.len(), "applying externalized overrides");
        }
        for definition in overrides {
            self.register(definition);
        }
        Ok(())
    }

    fn loaded_components_view(&self) -> LoadedComponents {
        let mut view = LoadedComponents::new();
        for (name, id) in &self.name_index {
            let Some(holder) = self.holders.get(id) else {
                continue;
            };
            let definition = holder.definition();
            view.insert(
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
        }
        view
    }

    // Step 7.
    fn run_initializer(&mut self, stack: &mut ReferenceStack) -> Result<()> {
        let Some(id) = self.name_index.get(INITIALIZER_COMPONENT_NAME).copied() else {
            return Ok(());
        };
        let definition = Arc::clone(self.holder(id)?.definition());
        let initialize = definition
            .initializer_capability()
            .map(Arc::clone)
            .ok_or_else(|| {
                ContainerError::processing(format!(
                    "initializer component has no initializer capability. \
                     component type = [{}]",
                    definition.type_key()
                ))
            })?;
        let instance = self.resolve_by_id(id, stack)?;
        initialize(instance.as_ref())?;
        debug!("initializer completed");
        Ok(())
    }

    /// Look up by id, lazily completing the holder. Internal consumers only
    /// pass ids obtained from a real definition; an unknown id is a
    /// processing error.
    pub fn resolve_by_id(
        &mut self,
        id: ComponentId,
        trace: &mut ReferenceStack,
    ) -> Result<ComponentInstance> {
        match self.advance_holder(id, None, trace)? {
            Resolution::Resolved(instance) => Ok(instance),
            Resolution::Blocked(state) => {
                Err(self.blocked_error(id, state, trace))
            }
        }
    }

    /// Look up by name, lazily completing the holder; a miss is `Ok(None)`
    pub fn resolve_by_name(
        &mut self,
        name: &str,
        trace: &mut ReferenceStack,
    ) -> Result<Option<ComponentInstance>> {
        let Some(id) = self.name_index.get(name).copied() else {
            return Ok(None);
        };
        match self.advance_holder(id, None, trace)? {
            Resolution::Resolved(instance) => Ok(Some(instance)),
            Resolution::Blocked(state) => Err(self.blocked_error(id, state, trace)),
        }
    }

    /// Look up through the type index, lazily completing the holder; a miss
    /// or an ambiguous key is `Ok(None)`. A registered holder that cannot
    /// yield an instance is always reported as a cycle.
    pub fn resolve_by_type_key(
        &mut self,
        key: TypeKey,
        trace: &mut ReferenceStack,
    ) -> Result<Option<ComponentInstance>> {
        let Some(id) = self.type_index.get(&key).copied() else {
            return Ok(None);
        };
        match self.advance_holder(id, Some(key), trace)? {
            Resolution::Resolved(instance) => Ok(Some(instance)),
            Resolution::Blocked(_) => Err(ContainerError::CyclicReference {
                message: format!("component type = [{key}]"),
                trace: trace.render(),
            }),
        }
    }

    /// The definition currently owning `name`, if any
    pub fn definition_by_name(&self, name: &str) -> Option<Arc<ComponentDefinition>> {
        let id = self.name_index.get(name)?;
        self.holders.get(id).map(|holder| Arc::clone(holder.definition()))
    }

    /// Typed lookup by name; `Ok(None)` on a miss
    pub fn component_by_name<T: Send + Sync + 'static>(
        &mut self,
        name: &str,
    ) -> Result<Option<Arc<T>>> {
        let mut trace = ReferenceStack::new();
        match self.resolve_by_name(name, &mut trace)? {
            None => Ok(None),
            Some(instance) => instance.downcast::<T>().map(Some).map_err(|_| {
                ContainerError::processing(format!(
                    "component type mismatch. name = [{name}], expected = [{}]",
                    std::any::type_name::<T>()
                ))
            }),
        }
    }

    /// Typed lookup through the type index; `Ok(None)` on a miss or an
    /// ambiguous type
    pub fn component_by_type<T: Send + Sync + 'static>(&mut self) -> Result<Option<Arc<T>>> {
        let mut trace = ReferenceStack::new();
        match self.resolve_by_type_key(TypeKey::of::<T>(), &mut trace)? {
            None => Ok(None),
            Some(instance) => instance.downcast::<T>().map(Some).map_err(|_| {
                ContainerError::processing(format!(
                    "component type mismatch. expected = [{}]",
                    std::any::type_name::<T>()
                ))
            }),
        }
    }

    /// Untyped lookup by id
    pub fn component_by_id(&mut self, id: ComponentId) -> Result<ComponentInstance> {
        let mut trace = ReferenceStack::new();
        self.resolve_by_id(id, &mut trace)
    }

    /// Untyped lookup against an explicit type key
    pub fn component_by_type_key(&mut self, key: TypeKey) -> Result<Option<ComponentInstance>> {
        let mut trace = ReferenceStack::new();
        self.resolve_by_type_key(key, &mut trace)
    }

    fn holder(&self, id: ComponentId) -> Result<&ComponentHolder> {
        self.holders.get(&id).ok_or_else(|| {
            ContainerError::processing(format!("component id was not found. id = [{id}]"))
        })
    }

    fn holder_mut(&mut self, id: ComponentId) -> Result<&mut ComponentHolder> {
        self.holders.get_mut(&id).ok_or_else(|| {
            ContainerError::processing(format!("component id was not found. id = [{id}]"))
        })
    }

    fn display_name(definition: &ComponentDefinition) -> String {
        definition
            .name()
            .map_or_else(|| definition.id().to_string(), str::to_string)
    }

    fn blocked_error(
        &self,
        id: ComponentId,
        state: ComponentState,
        trace: &ReferenceStack,
    ) -> ContainerError {
        let name = self
            .holders
            .get(&id)
            .map_or_else(|| id.to_string(), |holder| Self::display_name(holder.definition()));
        match state {
            ComponentState::Instantiating | ComponentState::Injecting => {
                ContainerError::CyclicReference {
                    message: format!("component name = [{name}]"),
                    trace: trace.render(),
                }
            }
            other => ContainerError::InvalidComponentState {
                name,
                state: other.to_string(),
            },
        }
    }

    fn advance_holder(
        &mut self,
        id: ComponentId,
        lookup_type: Option<TypeKey>,
        trace: &mut ReferenceStack,
    ) -> Result<Resolution> {
        let holder = self.holder(id)?;
        let state = holder.state();
        match state {
            ComponentState::Injected => {
                let resolved = holder.resolved().cloned().ok_or_else(|| {
                    ContainerError::processing(format!(
                        "injected component has no resolved instance. id = [{id}]"
                    ))
                })?;
                Ok(Resolution::Resolved(resolved))
            }
            ComponentState::NotInstantiate | ComponentState::Instantiated => {
                self.build_out(id, state == ComponentState::NotInstantiate, lookup_type, trace)?;
                let resolved = self
                    .holder(id)?
                    .resolved()
                    .cloned()
                    .ok_or_else(|| {
                        ContainerError::processing(format!(
                            "component resolution produced no instance. id = [{id}]"
                        ))
                    })?;
                Ok(Resolution::Resolved(resolved))
            }
            blocked => Ok(Resolution::Blocked(blocked)),
        }
    }

    fn build_out(
        &mut self,
        id: ComponentId,
        needs_create: bool,
        lookup_type: Option<TypeKey>,
        trace: &mut ReferenceStack,
    ) -> Result<()> {
        if needs_create {
            self.create_component(id, lookup_type, trace)?;
        }
        self.complete_inject(id, lookup_type, trace)
    }

    fn push_frame(
        definition: &ComponentDefinition,
        lookup_type: Option<TypeKey>,
        trace: &mut ReferenceStack,
    ) {
        match lookup_type {
            Some(key) => trace.push_for_type(definition, key),
            None => trace.push(definition),
        }
    }

    fn create_component(
        &mut self,
        id: ComponentId,
        lookup_type: Option<TypeKey>,
        trace: &mut ReferenceStack,
    ) -> Result<()> {
        let definition = Arc::clone(self.holder(id)?.definition());
        let creator = Arc::clone(definition.creator());
        self.holder_mut(id)?.set_state(ComponentState::Instantiating);
        Self::push_frame(&definition, lookup_type, trace);
        let created = creator.create(self, &definition, trace);
        trace.pop();
        match created {
            Ok(raw) => {
                let holder = self.holder_mut(id)?;
                holder.set_raw(raw);
                holder.set_state(ComponentState::Instantiated);
                Ok(())
            }
            Err(error) => {
                self.holder_mut(id)?.set_state(ComponentState::InjectionFailed);
                Err(error)
            }
        }
    }

    // Re-entry at INJECTED is a no-op, which is what lets repeated and
    // diamond references terminate.
    fn complete_inject(
        &mut self,
        id: ComponentId,
        lookup_type: Option<TypeKey>,
        trace: &mut ReferenceStack,
    ) -> Result<()> {
        let holder = self.holder(id)?;
        match holder.state() {
            ComponentState::Injected => return Ok(()),
            ComponentState::Instantiated => {}
            other => {
                let name = Self::display_name(holder.definition());
                return Err(ContainerError::InvalidComponentState {
                    name,
                    state: other.to_string(),
                });
            }
        }
        let definition = Arc::clone(holder.definition());
        self.holder_mut(id)?.set_state(ComponentState::Injecting);
        Self::push_frame(&definition, lookup_type, trace);
        let initialized = self.initialize_component(id, &definition, trace);
        trace.pop();
        match initialized {
            Ok(()) => {
                self.holder_mut(id)?.set_state(ComponentState::Injected);
                Ok(())
            }
            Err(error) => {
                self.holder_mut(id)?.set_state(ComponentState::InjectionFailed);
                Err(error)
            }
        }
    }

    fn initialize_component(
        &mut self,
        id: ComponentId,
        definition: &Arc<ComponentDefinition>,
        trace: &mut ReferenceStack,
    ) -> Result<()> {
        let mut raw = self.holder_mut(id)?.take_raw().ok_or_else(|| {
            ContainerError::processing(format!(
                "instantiated component has no raw instance. id = [{id}]"
            ))
        })?;
        let wired = self.apply_wiring(definition, &mut raw, trace);
        self.holder_mut(id)?.restore_raw(Arc::clone(&raw));
        wired?;
        let resolved = match definition.factory() {
            Some(factory) => (factory.produce)(raw.as_ref())?,
            None => raw,
        };
        self.holder_mut(id)?.set_resolved(resolved);
        Ok(())
    }

    fn apply_wiring(
        &mut self,
        definition: &Arc<ComponentDefinition>,
        raw: &mut ComponentInstance,
        trace: &mut ReferenceStack,
    ) -> Result<()> {
        if let Some(injector) = definition.injector() {
            let injector = Arc::clone(injector);
            let target = Self::unique_target(definition, raw)?;
            return injector.complete_inject(self, definition, target, trace);
        }
        if definition.references().is_empty() {
            return Ok(());
        }
        let target = Self::unique_target(definition, raw)?;
        for reference in definition.references() {
            self.inject_reference(definition, &mut *target, reference, trace)?;
        }
        Ok(())
    }

    // The raw instance is unique until the holder reaches INJECTED: no
    // lookup hands out a clone of a mid-resolution holder (those error as
    // cycles), so exclusive access here is guaranteed.
    fn unique_target<'a>(
        definition: &ComponentDefinition,
        raw: &'a mut ComponentInstance,
    ) -> Result<&'a mut (dyn std::any::Any + Send + Sync)> {
        Arc::get_mut(raw).ok_or_else(|| {
            ContainerError::processing(format!(
                "component instance is shared during injection. component = [{}]",
                Self::display_name(definition)
            ))
        })
    }

    fn inject_reference(
        &mut self,
        definition: &Arc<ComponentDefinition>,
        target: &mut (dyn std::any::Any + Send + Sync),
        reference: &crate::definition::ComponentReference,
        trace: &mut ReferenceStack,
    ) -> Result<()> {
        let value = match reference.kind() {
            InjectionKind::ById(target_id) => Some(self.resolve_by_id(*target_id, trace)?),
            InjectionKind::ByName(name) => {
                let resolved = self.resolve_by_name(name, trace)?;
                Some(resolved.ok_or_else(|| {
                    ContainerError::configuration(format!(
                        "component to reference was not found. name = [{name}], \
                         component = [{}], property = [{}]",
                        Self::display_name(definition),
                        reference.property()
                    ))
                })?)
            }
            InjectionKind::ByType(key) => self.resolve_by_type_key(*key, trace)?,
            InjectionKind::AutoByName(name) => self.resolve_by_name(name, trace)?,
        };
        // autowire misses leave the property untouched
        let Some(value) = value else {
            return Ok(());
        };
        self.set_property(definition, target, reference, value)
    }

    fn set_property(
        &self,
        definition: &ComponentDefinition,
        target: &mut (dyn std::any::Any + Send + Sync),
        reference: &crate::definition::ComponentReference,
        value: ComponentInstance,
    ) -> Result<()> {
        if let Some(deprecation) = reference.deprecation() {
            let component = Self::display_name(definition);
            match deprecation.reason.as_deref() {
                Some(reason) => warn!(
                    component = %component,
                    property = reference.property(),
                    reason,
                    "setting a deprecated property"
                ),
                None => warn!(
                    component = %component,
                    property = reference.property(),
                    "setting a deprecated property"
                ),
            }
        }
        match reference.setter() {
            PropertySetter::Instance(set) => set(target, value),
            PropertySetter::Static(set) => {
                if !self.allow_static_injection {
                    return Err(ContainerError::StaticInjectionNotAllowed {
                        component: Self::display_name(definition),
                        property: reference.property().to_string(),
                    });
                }
                set(value)
            }
        }
    }
}

/// The post-build name→instance view: every named, injected holder in
/// registration order
impl ObjectLoader for Container {
    fn load(&self) -> Result<Vec<(String, LoadedValue)>> {
        let mut out = Vec::new();
        for holder in self.holders.values() {
            let definition = holder.definition();
            if definition.use_id_only() {
                continue;
            }
            let (Some(name), Some(resolved)) = (definition.name(), holder.resolved()) else {
                continue;
            };
            // only the current owner of a name is part of the view
            if self.name_index.get(name) != Some(&definition.id()) {
                continue;
            }
            out.push((
                name.to_string(),
                LoadedValue {
                    value: Arc::clone(resolved),
                    type_key: definition.type_key(),
                    provides: definition.provided_keys(),
                },
            ));
        }
        Ok(out)
    }
}
