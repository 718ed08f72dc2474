//! # Filament
//!
//! A graph-validated, two-phase dependency-injection runtime for Rust.
//!
//! Filament wires an application's object graph at startup from a
//! declarative registration table: each type registers a [`Blueprint`]
//! naming its constructor dependencies, injectable fields and methods,
//! and the interfaces it can stand in for. From a seed set, the
//! [`Indexer`] discovers the closure of types to build, the
//! [`GraphValidator`] proves the wiring sound before anything is
//! constructed (constructor-level cycles and unbound interfaces abort
//! bootstrap with one aggregated report), and the [`Injector`] resolves
//! the closure in two phases so that cycles running through field or
//! method injection wire up correctly. Finished singletons live in a
//! [`Context`], a thread-safe type-keyed instance store.
//!
//! ## Core Concepts
//!
//! - **Registry**: the registration table; the container's stand-in for
//!   runtime reflection.
//! - **Blueprint**: one type's injection record — constructor, fields,
//!   methods, implemented interfaces.
//! - **Context**: the instance store; lookups fall back from exact match
//!   to declared-interface compatibility to on-demand synthesis.
//! - **Bootstrap**: index → validate → instantiate → inject, with an
//!   explicit abort path when validation fails.
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use filament::{bootstrap, keys, Blueprint, Context, Registry};
//!
//! struct Config {
//!     url: String,
//! }
//!
//! struct Database {
//!     config: Arc<Config>,
//! }
//!
//! fn main() -> filament::Result<()> {
//!     let registry = Arc::new(Registry::new());
//!     registry.register(
//!         Blueprint::for_type::<Config>()
//!             .constructor(keys![], |_| Ok(Config { url: "memory://local".into() })),
//!     )?;
//!     registry.register(
//!         Blueprint::for_type::<Database>().constructor(keys![Config], |cx| {
//!             Ok(Database { config: cx.demand::<Config>()? })
//!         }),
//!     )?;
//!
//!     let context = Context::new(registry);
//!     bootstrap(&context, keys![Database])?;
//!
//!     let database = context.get::<Database>().expect("database wired");
//!     assert_eq!(database.config.url, "memory://local");
//!     Ok(())
//! }
//! ```

mod blueprint;
mod context;
mod core;
mod error;
mod global;
mod indexer;
mod injector;
mod macros;
mod manifest;
mod registry;
mod validator;

pub use blueprint::{Blueprint, BlueprintBuilder, FieldSite, MethodArgs, MethodSite, Param};
pub use context::{Context, Extras};
pub use core::{StoredInstance, TypeKey};
pub use error::{Error, Result};
pub use global::{global, global_registry};
pub use indexer::Indexer;
pub use injector::{bootstrap, bootstrap_from_manifest, ConstructScope, Injector};
pub use manifest::{
  find_manifest, load_seed_names, parse_seed_names, resolve_seed_names, Manifest,
};
pub use registry::{DependencyEdge, Origin, Registry};
pub use validator::{GraphValidator, MissingBinding, Validation};
