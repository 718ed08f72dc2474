//! The process-wide default registry and context.
//!
//! These accessors exist for the application's single entry point, where
//! threading an explicit handle through `main` buys nothing. Everything
//! else in the crate — and every test — works against explicit
//! [`Registry`]/[`Context`] values, so independent containers never
//! share process state.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::context::Context;
use crate::registry::Registry;

// Created on first access in a thread-safe manner, torn down at process
// exit.
static GLOBAL_REGISTRY: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::new()));
static GLOBAL_CONTEXT: Lazy<Context> = Lazy::new(|| Context::new(GLOBAL_REGISTRY.clone()));

/// The registration table behind the global context.
pub fn global_registry() -> &'static Arc<Registry> {
  &GLOBAL_REGISTRY
}

/// The process-wide default context.
pub fn global() -> &'static Context {
  &GLOBAL_CONTEXT
}
