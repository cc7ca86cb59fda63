//! # ferrous-ioc
//!
//! A singleton component container with named lookup, field-injection cycle
//! resolution, construction hooks and indirect producers.
//!
//! ## Features
//!
//! - **Named singletons**: every component is created at most once and shared
//! - **Cycle resolution**: components that reference each other through
//!   [`Autowired`] fields are wired with early references; constructor and
//!   `depends_on` cycles are reported as [`DiError::Circular`]
//! - **Hooks**: an ordered [`ComponentHook`] chain can observe or replace objects,
//!   including the early reference handed out during a cycle
//! - **Producers**: a [`Producer`] registered as `name` serves its product under
//!   `name` and itself under `&name`
//! - **Lifecycle**: aware callbacks, init methods, and reverse-order teardown
//! - **Thread-safe**: concurrent lookups create each component once; cross-thread
//!   cycles do not deadlock
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_ioc::{Autowired, ComponentCollection, ComponentDefinition, Resolver};
//!
//! #[derive(Default)]
//! struct Database {
//!     url: String,
//! }
//!
//! #[derive(Default)]
//! struct UserService {
//!     db: Autowired<Database>,
//! }
//!
//! let mut components = ComponentCollection::new();
//! components.register(ComponentDefinition::from_instance(
//!     "db",
//!     Database { url: "postgres://localhost".to_string() },
//! ))?;
//! components.register(
//!     ComponentDefinition::builder::<UserService>("users")
//!         .with_default()
//!         .autowire::<Database, _>("db", |s| &s.db)
//!         .build(),
//! )?;
//!
//! let container = components.build()?;
//! let users = container.get::<UserService>("users")?;
//! assert_eq!(users.db.get_required().url, "postgres://localhost");
//! # Ok::<(), ferrous_ioc::DiError>(())
//! ```
//!
//! ## Producers
//!
//! ```rust
//! use ferrous_ioc::{BoxError, ComponentCollection, ComponentDefinition, Producer, Resolver, ResolverCore};
//! use std::sync::Arc;
//!
//! trait Print: Send + Sync {
//!     fn print(&self, text: &str) -> String;
//! }
//!
//! struct Console;
//! impl Print for Console {
//!     fn print(&self, text: &str) -> String {
//!         format!("console: {text}")
//!     }
//! }
//!
//! #[derive(Default)]
//! struct PrintFactory;
//!
//! impl Producer for PrintFactory {
//!     type Product = dyn Print;
//!
//!     fn produce(&self, _resolver: &dyn ResolverCore) -> Result<Arc<dyn Print>, BoxError> {
//!         Ok(Arc::new(Console))
//!     }
//!
//!     fn cacheable(&self) -> bool {
//!         true
//!     }
//! }
//!
//! let mut components = ComponentCollection::new();
//! components.register(ComponentDefinition::producer::<PrintFactory>("print").with_default().build())?;
//! let container = components.build()?;
//!
//! let print = container.get_trait::<dyn Print>("print")?;
//! assert_eq!(print.print("hi"), "console: hi");
//! assert!(container.get::<PrintFactory>("&print").is_ok());
//! # Ok::<(), ferrous_ioc::DiError>(())
//! ```

// Module declarations
pub mod collection;
pub mod config;
pub mod container;
pub mod definition;
pub mod descriptors;
pub mod error;
pub mod hooks;
pub mod naming;
pub mod observer;
pub mod traits;
pub mod validation;

// Internal modules
mod bean;
mod cache;
mod internal;
mod registration;

pub use bean::{Autowired, Bean};
pub use collection::{ComponentCollection, ComponentModule};
pub use config::{ContainerConfig, DEFAULT_MAX_DEPTH};
pub use container::{ConstructorArgs, Container, ContainerHandle};
pub use definition::{ComponentDefinition, DefinitionBuilder};
pub use descriptors::ComponentDescriptor;
pub use error::{BoxError, DiError, DiResult, Stage};
pub use hooks::{stage_hook, ComponentHook, HookStage};
pub use naming::PRODUCER_PREFIX;
pub use observer::{LoggingObserver, ResolutionObserver};
pub use traits::{
    AsyncDispose, ContainerAware, Dispose, InitializingComponent, NameAware, Producer, Resolver, ResolverCore,
};
pub use validation::{ValidationError, ValidationReport, ValidationWarning};
