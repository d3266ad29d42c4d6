//! Build algorithm end to end: expansion, factories, the initializer, and
//! lookup semantics after a completed build

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use armature::{
    instance, loader, ComponentDefinition, ComponentFactory, ComponentInstance,
    CompositeExternalizedLoader, Container, DefaultCreator, Initializer, LoadedValue, ObjectLoader,
    Result, StringListFactory, TypeKey,
};

fn bare(l: impl armature::DefinitionLoader + 'static) -> Result<Container> {
    Container::with_options(
        Arc::new(l),
        Arc::new(CompositeExternalizedLoader::new(Vec::new())),
        false,
    )
}

#[test]
fn repeated_lookups_return_the_same_instance() {
    struct Service;
    let mut container = bare(loader::from_fn(|c| {
        Ok(vec![ComponentDefinition::builder::<Service>(
            c.generate_id(),
            DefaultCreator::new(|| Service),
        )
        .named("service")
        .build()])
    }))
    .expect("build");
    let first = container
        .component_by_name::<Service>("service")
        .expect("lookup")
        .expect("present");
    let second = container
        .component_by_name::<Service>("service")
        .expect("lookup")
        .expect("present");
    assert!(Arc::ptr_eq(&first, &second));
    let by_type = container
        .component_by_type::<Service>()
        .expect("lookup")
        .expect("present");
    assert!(Arc::ptr_eq(&first, &by_type));
}

#[test]
fn value_producing_components_contribute_further_components() {
    struct ConfigSource;
    impl ObjectLoader for ConfigSource {
        fn load(&self) -> Result<Vec<(String, LoadedValue)>> {
            Ok(vec![
                ("derived.host".to_string(), LoadedValue::of("db.internal".to_string())),
                ("derived.port".to_string(), LoadedValue::of(5432_i64)),
            ])
        }
    }
    let mut container = bare(loader::from_fn(|c| {
        Ok(vec![ComponentDefinition::builder::<ConfigSource>(
            c.generate_id(),
            DefaultCreator::new(|| ConfigSource),
        )
        .named("config.source")
        .object_loader::<ConfigSource>()
        .build()])
    }))
    .expect("build");
    let host = container
        .component_by_name::<String>("derived.host")
        .expect("lookup")
        .expect("present");
    assert_eq!(host.as_str(), "db.internal");
    let port = container
        .component_by_name::<i64>("derived.port")
        .expect("lookup")
        .expect("present");
    assert_eq!(*port, 5432);
}

#[test]
fn factory_products_are_what_lookups_hand_out() {
    let mut container = bare(loader::from_fn(|c| {
        Ok(vec![ComponentDefinition::builder::<StringListFactory>(
            c.generate_id(),
            DefaultCreator::new(|| StringListFactory::with_values("red,green,blue")),
        )
        .named("colors")
        .factory::<StringListFactory>(TypeKey::of::<Vec<String>>())
        .build()])
    }))
    .expect("build");
    let by_name = container
        .component_by_name::<Vec<String>>("colors")
        .expect("lookup")
        .expect("present");
    assert_eq!(by_name.as_slice(), ["red", "green", "blue"]);
    let by_type = container
        .component_by_type::<Vec<String>>()
        .expect("lookup")
        .expect("present");
    assert!(Arc::ptr_eq(&by_name, &by_type));
}

#[test]
fn factory_runs_once_even_across_repeated_lookups() {
    static PRODUCED: AtomicUsize = AtomicUsize::new(0);
    struct CountingFactory;
    impl ComponentFactory for CountingFactory {
        fn create_object(&self) -> Result<ComponentInstance> {
            PRODUCED.fetch_add(1, Ordering::SeqCst);
            Ok(instance("product".to_string()))
        }
    }
    let mut container = bare(loader::from_fn(|c| {
        Ok(vec![ComponentDefinition::builder::<CountingFactory>(
            c.generate_id(),
            DefaultCreator::new(|| CountingFactory),
        )
        .named("counting")
        .factory::<CountingFactory>(TypeKey::of::<String>())
        .build()])
    }))
    .expect("build");
    for _ in 0..3 {
        container
            .component_by_name::<String>("counting")
            .expect("lookup")
            .expect("present");
    }
    assert_eq!(PRODUCED.load(Ordering::SeqCst), 1);
}

#[test]
fn initializer_runs_exactly_once_and_last() {
    static INITIALIZED: AtomicUsize = AtomicUsize::new(0);
    struct Boot;
    impl Initializer for Boot {
        fn initialize(&self) -> Result<()> {
            INITIALIZED.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
    let mut container = bare(loader::from_fn(|c| {
        Ok(vec![ComponentDefinition::builder::<Boot>(
            c.generate_id(),
            DefaultCreator::new(|| Boot),
        )
        .named("initializer")
        .initializer::<Boot>()
        .build()])
    }))
    .expect("build");
    assert_eq!(INITIALIZED.load(Ordering::SeqCst), 1);

    // a later lookup re-enters at INJECTED, which is a no-op
    container
        .component_by_name::<Boot>("initializer")
        .expect("lookup")
        .expect("present");
    assert_eq!(INITIALIZED.load(Ordering::SeqCst), 1);
}

#[test]
fn ambiguous_types_miss_regardless_of_query_order() {
    struct Repo;
    let mut container = bare(loader::from_fn(|c| {
        let first = ComponentDefinition::builder::<Repo>(
            c.generate_id(),
            DefaultCreator::new(|| Repo),
        )
        .named("first")
        .build();
        let second = ComponentDefinition::builder::<Repo>(
            c.generate_id(),
            DefaultCreator::new(|| Repo),
        )
        .named("second")
        .build();
        Ok(vec![first, second])
    }))
    .expect("build");
    assert!(container.component_by_type::<Repo>().expect("lookup").is_none());
    // both remain reachable by name
    assert!(container.component_by_name::<Repo>("first").expect("lookup").is_some());
    assert!(container.component_by_type::<Repo>().expect("lookup").is_none());
}

#[test]
fn provides_keys_extend_the_type_index() {
    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }
    struct English;
    impl Greeter for English {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }
    let mut container = bare(loader::from_fn(|c| {
        Ok(vec![ComponentDefinition::builder::<English>(
            c.generate_id(),
            DefaultCreator::new(|| English),
        )
        .named("greeter")
        .provides(TypeKey::of::<dyn Greeter>())
        .build()])
    }))
    .expect("build");
    let found = container
        .component_by_type_key(TypeKey::of::<dyn Greeter>())
        .expect("lookup")
        .expect("present");
    let english = found.downcast_ref::<English>().expect("concrete type");
    assert_eq!(english.greet(), "hello");
}

#[test]
fn the_container_exposes_the_post_build_name_view() {
    let mut container = bare(loader::from_fn(|c| {
        Ok(vec![
            ComponentDefinition::literal(c.generate_id(), "alpha", "1"),
            ComponentDefinition::literal(c.generate_id(), "beta", "2"),
        ])
    }))
    .expect("build");
    // make sure lookups completed before reading the view
    container.component_by_name::<String>("alpha").expect("lookup");
    let view = container.load().expect("view");
    let names: Vec<&str> = view.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["alpha", "beta"]);
}

#[test]
fn unknown_ids_are_a_processing_error() {
    let mut container = bare(loader::from_fn(|_| Ok(Vec::new()))).expect("build");
    let error = container
        .component_by_id(armature::ComponentId(99))
        .err()
        .expect("must fail");
    assert!(error.is_processing(), "got: {error}");
    assert!(error.to_string().contains("99"), "got: {error}");
}

#[test]
fn deprecated_properties_warn_but_still_set() {
    #[derive(Default)]
    struct Legacy {
        threshold: Option<Arc<String>>,
    }
    let mut container = bare(loader::from_fn(|c| {
        let value = ComponentDefinition::literal(c.generate_id(), "legacy.threshold", "9");
        let legacy = ComponentDefinition::builder::<Legacy>(
            c.generate_id(),
            DefaultCreator::new(Legacy::default),
        )
        .named("legacy")
        .reference(
            armature::ComponentReference::by_name::<Legacy, String>(
                "threshold",
                "legacy.threshold",
                |legacy, value| legacy.threshold = Some(value),
            )
            .deprecated_because("use `limits.threshold` instead"),
        )
        .build();
        Ok(vec![value, legacy])
    }))
    .expect("build");
    let legacy = container
        .component_by_name::<Legacy>("legacy")
        .expect("lookup")
        .expect("present");
    assert_eq!(legacy.threshold.as_deref().map(String::as_str), Some("9"));
}

#[test]
fn static_injection_works_under_the_opt_in() {
    static WRITTEN: AtomicUsize = AtomicUsize::new(0);
    #[derive(Default)]
    struct Legacy;
    let result = Container::with_options(
        Arc::new(loader::from_fn(|c| {
            let value = ComponentDefinition::literal(c.generate_id(), "legacy.global", "x");
            let legacy = ComponentDefinition::builder::<Legacy>(
                c.generate_id(),
                DefaultCreator::new(Legacy::default),
            )
            .named("legacy")
            .reference(armature::ComponentReference::static_by_name::<String>(
                "global",
                "legacy.global",
                |_| {
                    WRITTEN.fetch_add(1, Ordering::SeqCst);
                },
            ))
            .build();
            Ok(vec![value, legacy])
        })),
        Arc::new(CompositeExternalizedLoader::new(Vec::new())),
        true,
    );
    assert!(result.is_ok());
    assert_eq!(WRITTEN.load(Ordering::SeqCst), 1);
}

#[test]
fn autowire_by_name_misses_leave_the_property_untouched() {
    #[derive(Default)]
    struct Tolerant {
        extra: Option<Arc<String>>,
    }
    let mut container = bare(loader::from_fn(|c| {
        Ok(vec![ComponentDefinition::builder::<Tolerant>(
            c.generate_id(),
            DefaultCreator::new(Tolerant::default),
        )
        .named("tolerant")
        .reference(armature::ComponentReference::auto_by_name::<Tolerant, String>(
            "extra",
            "nowhere.defined",
            |tolerant, value| tolerant.extra = Some(value),
        ))
        .build()])
    }))
    .expect("build");
    let tolerant = container
        .component_by_name::<Tolerant>("tolerant")
        .expect("lookup")
        .expect("present");
    assert!(tolerant.extra.is_none());
}

#[test]
fn a_custom_injector_replaces_the_default_wiring() {
    use armature::{ComponentInjector, ReferenceStack};

    #[derive(Default)]
    struct Assembled {
        wired: bool,
        sibling: Option<Arc<String>>,
    }

    struct HandWiring;
    impl ComponentInjector for HandWiring {
        fn complete_inject(
            &self,
            container: &mut Container,
            _definition: &ComponentDefinition,
            target: &mut (dyn std::any::Any + Send + Sync),
            trace: &mut ReferenceStack,
        ) -> Result<()> {
            let sibling = container.resolve_by_name("sibling", trace)?;
            if let Some(assembled) = target.downcast_mut::<Assembled>() {
                assembled.wired = true;
                assembled.sibling = sibling.and_then(|s| s.downcast::<String>().ok());
            }
            Ok(())
        }
    }

    let mut container = bare(loader::from_fn(|c| {
        let sibling = ComponentDefinition::literal(c.generate_id(), "sibling", "hi");
        let assembled = ComponentDefinition::builder::<Assembled>(
            c.generate_id(),
            DefaultCreator::new(Assembled::default),
        )
        .named("assembled")
        .custom_injector(HandWiring)
        .build();
        Ok(vec![sibling, assembled])
    }))
    .expect("build");
    let assembled = container
        .component_by_name::<Assembled>("assembled")
        .expect("lookup")
        .expect("present");
    assert!(assembled.wired);
    assert_eq!(assembled.sibling.as_deref().map(String::as_str), Some("hi"));
}

#[test]
fn by_id_references_wire_across_definitions() {
    #[derive(Default)]
    struct Holder {
        value: Option<Arc<String>>,
    }
    let mut container = bare(loader::from_fn(|c| {
        let target_id = c.generate_id();
        let target = ComponentDefinition::builder::<String>(
            target_id,
            armature::StoredValueCreator::new(instance("linked".to_string())),
        )
        .build();
        let holder = ComponentDefinition::builder::<Holder>(
            c.generate_id(),
            DefaultCreator::new(Holder::default),
        )
        .named("holder")
        .reference(armature::ComponentReference::by_id::<Holder, String>(
            "value",
            target_id,
            |holder, value| holder.value = Some(value),
        ))
        .build();
        Ok(vec![target, holder])
    }))
    .expect("build");
    let holder = container
        .component_by_name::<Holder>("holder")
        .expect("lookup")
        .expect("present");
    assert_eq!(holder.value.as_deref().map(String::as_str), Some("linked"));
}

#[test]
fn rebuilding_resets_ids_and_state() {
    let mut container = bare(loader::from_fn(|c| {
        Ok(vec![ComponentDefinition::literal(c.generate_id(), "only", "v")])
    }))
    .expect("build");
    container.reload().expect("rebuild");
    let value = container
        .component_by_name::<String>("only")
        .expect("lookup")
        .expect("present");
    assert_eq!(value.as_str(), "v");
}
