//! Override chain behavior: global properties, the literal-only rule, and
//! marker-driven loading

use std::sync::Arc;

use armature::{
    instance, loader, props, ComponentDefinition, ConstructorInjectionCreator, ConstructorParam,
    Container, ContainerError, DefaultCreator, GlobalPropertyLoader, LiteralKind,
    MarkedComponentEntry, MarkerDefinitionLoader, TypeKey, MARKED_COMPONENTS,
};

#[test]
fn global_property_replaces_a_loaded_literal() {
    props::set_property("exttest.timeout", "30");
    let mut container = Container::with_externalized_loader(
        loader::from_fn(|c| {
            Ok(vec![ComponentDefinition::literal(
                c.generate_id(),
                "exttest.timeout",
                "10",
            )])
        }),
        Arc::new(GlobalPropertyLoader::new()),
    )
    .expect("build");
    let value = container
        .component_by_name::<String>("exttest.timeout")
        .expect("lookup")
        .expect("present");
    assert_eq!(value.as_str(), "30");
    props::clear_property("exttest.timeout");
}

#[test]
fn discovery_defaults_to_global_properties() {
    props::set_property("exttest.discovered", "yes");
    let mut container = Container::new(loader::from_fn(|_| Ok(Vec::new()))).expect("build");
    let value = container
        .component_by_name::<String>("exttest.discovered")
        .expect("lookup")
        .expect("present");
    assert_eq!(value.as_str(), "yes");
    props::clear_property("exttest.discovered");
}

#[test]
fn overriding_a_constructed_component_names_key_and_prior_type() {
    struct Pool;
    props::set_property("exttest.pool", "8");
    let result = Container::with_externalized_loader(
        loader::from_fn(|c| {
            Ok(vec![ComponentDefinition::builder::<Pool>(
                c.generate_id(),
                DefaultCreator::new(|| Pool),
            )
            .named("exttest.pool")
            .build()])
        }),
        Arc::new(GlobalPropertyLoader::new()),
    );
    props::clear_property("exttest.pool");
    let error = result.err().expect("build must fail");
    assert!(matches!(error, ContainerError::IllegalOverride { .. }));
    let message = error.to_string();
    assert!(message.contains("exttest.pool"), "got: {message}");
    assert!(message.contains("Pool"), "got: {message}");
}

struct Audit {
    target: Arc<String>,
}

#[linkme::distributed_slice(MARKED_COMPONENTS)]
static AUDIT_COMPONENT: MarkedComponentEntry = MarkedComponentEntry {
    namespace: "exttest::services",
    name: Some("audit"),
    alternate_type: None,
    component_type: TypeKey::of::<Audit>,
    definition: |id| {
        ComponentDefinition::builder::<Audit>(
            id,
            ConstructorInjectionCreator::new(
                vec![ConstructorParam::config_value(
                    "audit.target",
                    LiteralKind::Str,
                )],
                |args| {
                    Ok(instance(Audit {
                        target: args.required::<String>(0)?,
                    }))
                },
            ),
        )
    },
};

#[linkme::distributed_slice(MARKED_COMPONENTS)]
static FOREIGN_COMPONENT: MarkedComponentEntry = MarkedComponentEntry {
    namespace: "othercrate::services",
    name: Some("foreign"),
    alternate_type: None,
    component_type: TypeKey::of::<Audit>,
    definition: |_| unreachable!("out-of-scope entries must never be loaded"),
};

#[test]
fn marker_loader_builds_in_scope_components() {
    let mut container = Container::with_externalized_loader(
        loader::from_fn(|c| {
            Ok(vec![ComponentDefinition::literal(
                c.generate_id(),
                "audit.target",
                "orders",
            )])
        }),
        Arc::new(MarkerDefinitionLoader::new("exttest")),
    )
    .expect("build");
    let audit = container
        .component_by_name::<Audit>("audit")
        .expect("lookup")
        .expect("present");
    assert_eq!(audit.target.as_str(), "orders");
    assert!(container
        .component_by_name::<Audit>("foreign")
        .expect("lookup")
        .is_none());
}
