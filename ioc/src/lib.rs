//! # Fibre Beans
//!
//! A definition-driven Inversion of Control (IoC) container for Rust.
//!
//! Components are described by bean definitions (an id, the catalog name of
//! a concrete type, a scope and property bindings) which can come from XML
//! markup, from a component scan over the type catalog, or from code. On
//! refresh the container validates every definition, indexes the types they
//! provide and eagerly builds every singleton, failing fast on the first
//! error.
//!
//! ## Core Concepts
//!
//! - **Type Catalog**: explicit metadata for every type the container can
//!   build: its constructors, autowired members, property slots and the roles
//!   (`dyn Trait`) it can be served as. Types can also register themselves at
//!   link time through [`BEAN_TYPES`].
//! - **Scopes**: `singleton` beans are cached until the next refresh,
//!   `prototype` beans are built fresh on every request.
//! - **Autowiring**: constructor parameters, fields and setters are resolved
//!   by qualifier (a bean id) when one is given, otherwise by type.
//! - **Cycle detection**: a bean that depends on itself, directly or through
//!   others, fails with the full chain of ids.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_beans::{BeanType, Container, Dependency, TypeCatalog};
//! use std::sync::Arc;
//!
//! trait Repository: Send + Sync {
//!   fn find(&self) -> String;
//! }
//!
//! #[derive(Default)]
//! struct MemoryRepository;
//! impl Repository for MemoryRepository {
//!   fn find(&self) -> String {
//!     "alice".to_string()
//!   }
//! }
//!
//! struct UserService {
//!   repository: Arc<dyn Repository>,
//!   greeting: String,
//! }
//!
//! let catalog = TypeCatalog::new()
//!   .with(
//!     BeanType::builder::<MemoryRepository>("app::MemoryRepository")
//!       .implements::<dyn Repository, _>(|repo| repo as Arc<dyn Repository>)
//!       .default_constructor(MemoryRepository::default)
//!       .build(),
//!   )
//!   .with(
//!     BeanType::builder::<UserService>("app::UserService")
//!       .injectable_constructor([Dependency::of::<dyn Repository>()], |args| {
//!         Ok(UserService { repository: args.next()?, greeting: String::new() })
//!       })
//!       .property::<String, _>("greeting", |service, value| service.greeting = value)
//!       .build(),
//!   );
//!
//! let container = Container::builder(catalog)
//!   .markup_text(
//!     "inline",
//!     r#"<beans>
//!          <bean id="repository" class="app::MemoryRepository"/>
//!          <bean id="users" class="app::UserService">
//!            <property name="greeting" value="Hello"/>
//!          </bean>
//!        </beans>"#,
//!   )
//!   .build_refreshed()
//!   .unwrap();
//!
//! let users = container.get_bean_as::<UserService>("users").unwrap();
//! assert_eq!(format!("{} {}", users.greeting, users.repository.find()), "Hello alice");
//! ```

mod catalog;
mod config;
mod container;
mod core;
mod definition;
mod descriptor;
mod error;
mod index;
mod macros;
mod registry;
mod resolver;
mod scope;
mod source;
mod value;

pub use catalog::{TypeCatalog, BEAN_TYPES};
pub use config::{
  find_config_file, find_config_file_in, load_config, process_raw_config, ContainerConfig,
  ContainerConfigRaw,
};
pub use container::{Container, ContainerBuilder};
pub use crate::core::TypeKey;
pub use definition::{BeanDefinition, BindingValue, Origin, PropertyBinding};
pub use descriptor::{Args, Autowire, BeanType, BeanTypeBuilder, ComponentMarker, Dependency};
pub use error::{Error, Result};
pub use resolver::Bean;
pub use scope::Scope;
pub use source::{ComponentScan, DefinitionSource, MarkupSource};
pub use value::{ScalarKind, ScalarValue, Value};
