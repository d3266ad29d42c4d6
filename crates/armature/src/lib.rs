//! Runtime object-graph assembler
//!
//! Armature builds, wires, and manages the lifecycle of application
//! components from declarative definitions: references resolve by id,
//! name, or type key; cyclic dependencies are detected and reported with
//! the full in-flight reference stack; and configuration overrides layer
//! in from pluggable external sources with a defined precedence.
//!
//! ## Architecture
//!
//! - `definition`: immutable component blueprints and their references
//! - `creator`: creation strategies (default, constructor-injection,
//!   stored-literal)
//! - `holder`: per-component lifecycle records and the state machine
//! - `container`: the build algorithm, the three indices, and the three
//!   lookup operations
//! - `externalize`: the override chain and its built-in sources
//! - `capability`: the object-loader, factory, and initializer contracts
//! - `disposal`: reverse-order teardown of registered resources
//!
//! ## Building a container
//!
//! ```ignore
//! let mut container = Container::new(loader::from_fn(|c| {
//!     Ok(vec![ComponentDefinition::literal(c.generate_id(), "db.url", "postgres://db")])
//! }))?;
//! let url = container.component_by_name::<String>("db.url")?;
//! ```
//!
//! ## Concurrency
//!
//! A build runs on one thread: every resolving operation takes
//! `&mut self`, so concurrent structural mutation cannot compile. After a
//! build completes, resolved instances are shared `Arc`s and may be read
//! from any number of threads.

pub mod capability;
pub mod container;
pub mod creator;
pub mod definition;
pub mod disposal;
pub mod error;
pub mod externalize;
pub mod factory;
pub mod holder;
pub mod key;
pub mod literal;
pub mod loader;
pub mod logging;
pub mod props;
pub mod trace;

pub use capability::{ComponentFactory, Initializer, ObjectLoader};
pub use container::{Container, INITIALIZER_COMPONENT_NAME, STATIC_INJECTION_ENV};
pub use creator::{
    ComponentCreator, ConstructorInjectionCreator, ConstructorParam, DefaultCreator, ResolvedArgs,
    StoredValueCreator,
};
pub use definition::{
    instance, ComponentDefinition, ComponentId, ComponentInjector, ComponentInstance,
    ComponentReference, DefinitionBuilder, InjectionKind, LoadedValue,
};
pub use disposal::{ApplicationDisposer, BasicApplicationDisposer, Disposable};
pub use error::{ContainerError, Result};
pub use externalize::{
    CompositeExternalizedLoader, ExternalizedLoader, ExternalizedLoaderEntry, GlobalPropertyLoader,
    LoadedComponentSummary, LoadedComponents, MarkedComponentEntry, MarkerDefinitionLoader,
    EXTERNALIZED_LOADERS, MARKED_COMPONENTS,
};
pub use factory::StringListFactory;
pub use holder::{ComponentHolder, ComponentState};
pub use key::TypeKey;
pub use literal::LiteralKind;
pub use loader::DefinitionLoader;
pub use trace::ReferenceStack;
