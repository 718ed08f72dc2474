//! The two-phase resolution engine that turns a closure into live,
//! wired instances.
//!
//! Naive single-pass recursive construction cannot tolerate cycles that
//! pass through field or method injection, so resolution runs in two
//! explicit phases over the whole closure: first every type is
//! *incompletely* instantiated (constructed and cached, fields and
//! methods untouched), then every flattened field and method site is
//! injected against the now-populated context. A cycle that only
//! involves field or method edges therefore resolves regardless of
//! traversal order; only constructor-level cycles are fatal, and those
//! are the validator's job to catch before this code runs.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::blueprint::{Blueprint, FieldSite, MethodArgs, MethodSite};
use crate::context::Context;
use crate::core::{StoredInstance, TypeKey};
use crate::error::{Error, Result};
use crate::indexer::Indexer;
use crate::manifest::{resolve_seed_names, Manifest};
use crate::registry::Registry;
use crate::validator::Validation;

thread_local! {
  // Keys whose constructors are on the current call stack. Guards the
  // recursive construction paths against constructor-level cycles that
  // slipped past validation: re-entry degrades to a logged failure
  // instead of unbounded recursion.
  static CONSTRUCTING: RefCell<HashSet<TypeKey>> = RefCell::new(HashSet::new());
}

struct ConstructionGuard {
  key: TypeKey,
}

impl ConstructionGuard {
  fn enter(key: TypeKey) -> Option<Self> {
    let entered = CONSTRUCTING.with(|stack| stack.borrow_mut().insert(key));
    entered.then_some(Self { key })
  }
}

impl Drop for ConstructionGuard {
  fn drop(&mut self) {
    CONSTRUCTING.with(|stack| {
      stack.borrow_mut().remove(&self.key);
    });
  }
}

#[derive(Clone, Copy)]
enum ResolveMode {
  /// Phase-1 resolution: constructor parameters come through the
  /// incomplete-get path and memoize immediately.
  Incomplete,
  /// On-demand resolution: parameters come through the full lookup
  /// path, synthesizing as needed.
  Full,
}

/// The resolver handed to constructor closures.
pub struct ConstructScope<'a> {
  injector: &'a Injector,
  context: &'a Context,
  owner: TypeKey,
  mode: ResolveMode,
}

impl ConstructScope<'_> {
  /// Resolves one constructor parameter. Constructor parameters are
  /// always required; an unresolvable one fails the whole construction.
  pub fn demand<T: ?Sized + Any + Send + Sync>(&self) -> Result<Arc<T>> {
    let key = TypeKey::of::<T>();
    let resolved = match self.mode {
      ResolveMode::Incomplete => self.injector.incomplete(key, self.context),
      ResolveMode::Full => self.context.resolve_quiet(key),
    };
    resolved
      .and_then(|instance| instance.downcast::<T>())
      .ok_or(Error::UnsatisfiedDependency {
        required: key,
        requested_by: self.owner,
      })
  }

  /// The type under construction.
  pub fn owner(&self) -> TypeKey {
    self.owner
  }
}

/// The resolution engine. Stateless apart from the registry handle; one
/// value can serve any number of contexts.
pub struct Injector {
  registry: Arc<Registry>,
}

impl Injector {
  pub fn new(registry: Arc<Registry>) -> Self {
    Self { registry }
  }

  /// Phase 1: every closure member gets a (possibly field/method
  /// incomplete) cached instance. Failures are logged and leave the
  /// entry absent.
  pub fn instantiate_all(&self, indexer: &Indexer, context: &Context) {
    debug!("phase 1: instantiating {} types", indexer.len());
    for &key in indexer.closure() {
      let _ = self.incomplete(key, context);
    }
  }

  /// Phase 2: walks the flattened field and method sites of the closure
  /// and injects each against the populated context.
  pub fn inject_all(&self, indexer: &Indexer, context: &Context) {
    debug!("phase 2: injecting field and method sites");
    for field in indexer.fields() {
      let Some(owner) = context.peek(field.owner()) else {
        debug!(
          "skipping field {}.{}: owner instance absent",
          field.owner(),
          field.name()
        );
        continue;
      };
      self.inject_field(field, &owner, context);
    }
    for method in indexer.methods() {
      let Some(owner) = context.peek(method.owner()) else {
        debug!(
          "skipping method {}.{}: owner instance absent",
          method.owner(),
          method.name()
        );
        continue;
      };
      self.invoke_method(method, &owner, context);
    }
  }

  /// The incomplete get: reuse a stored instance, or construct one by
  /// resolving constructor parameters recursively through this same
  /// path, caching the new instance the moment its constructor returns
  /// and before any field or method on it is touched.
  pub(crate) fn incomplete(&self, key: TypeKey, context: &Context) -> Option<StoredInstance> {
    if let Some(existing) = context.peek(key) {
      return Some(existing);
    }
    let Some(blueprint) = self.registry.blueprint(key) else {
      debug!("no blueprint for {}; cannot instantiate", key);
      return None;
    };
    let Some(_guard) = ConstructionGuard::enter(key) else {
      warn!("{}", Error::CircularConstruction(key));
      return None;
    };
    let instance = self.construct(&blueprint, context, ResolveMode::Incomplete)?;
    context.insert(key, instance.clone());
    Some(instance)
  }

  /// On-demand synthesis: construct, cache, and fully inject in one
  /// shot. Satisfies an interface key through its single registered
  /// implementer.
  pub(crate) fn synthesize(&self, key: TypeKey, context: &Context) -> Option<StoredInstance> {
    if let Some(blueprint) = self.registry.blueprint(key) {
      let Some(_guard) = ConstructionGuard::enter(key) else {
        warn!("{}", Error::CircularConstruction(key));
        return None;
      };
      let instance = self.construct(&blueprint, context, ResolveMode::Full)?;
      context.insert(key, instance.clone());
      self.inject_blueprint_sites(&blueprint, &instance, context);
      return Some(instance);
    }
    let implementers = self.registry.implementers(key);
    match implementers.as_slice() {
      [concrete] => {
        let instance = context
          .peek(*concrete)
          .or_else(|| self.synthesize(*concrete, context))?;
        let blueprint = self.registry.blueprint(*concrete)?;
        let cast = blueprint.cast_to(key)?;
        cast(&instance)
      }
      [] => None,
      _ => {
        warn!(
          "multiple implementers registered for {}; refusing to choose one",
          key
        );
        None
      }
    }
  }

  /// Builds a fresh, fully injected instance without caching the root.
  pub(crate) fn fresh(&self, key: TypeKey, context: &Context) -> Option<StoredInstance> {
    let Some(blueprint) = self.registry.blueprint(key) else {
      debug!("no blueprint for {}; cannot instantiate", key);
      return None;
    };
    let Some(_guard) = ConstructionGuard::enter(key) else {
      warn!("{}", Error::CircularConstruction(key));
      return None;
    };
    let instance = self.construct(&blueprint, context, ResolveMode::Full)?;
    self.inject_blueprint_sites(&blueprint, &instance, context);
    Some(instance)
  }

  fn construct(
    &self,
    blueprint: &Blueprint,
    context: &Context,
    mode: ResolveMode,
  ) -> Option<StoredInstance> {
    let scope = ConstructScope {
      injector: self,
      context,
      owner: blueprint.key(),
      mode,
    };
    let built = if let Some(constructor) = blueprint.constructor() {
      (constructor.build)(&scope)
    } else if let Some(fallback) = blueprint.fallback() {
      fallback(&scope)
    } else {
      Err(Error::MissingConstructor(blueprint.key()))
    };
    match built {
      Ok(instance) => Some(instance),
      Err(error) => {
        warn!("failed to construct {}: {}", blueprint.key(), error);
        None
      }
    }
  }

  fn inject_blueprint_sites(
    &self,
    blueprint: &Blueprint,
    instance: &StoredInstance,
    context: &Context,
  ) {
    for field in blueprint.fields() {
      self.inject_field(field, instance, context);
    }
    for method in blueprint.methods() {
      self.invoke_method(method, instance, context);
    }
  }

  fn inject_field(&self, field: &FieldSite, owner: &StoredInstance, context: &Context) {
    match context.resolve_quiet(field.key()) {
      Some(value) => {
        if !field.apply(owner, &value) {
          warn!(
            "field {}.{} rejected a value of type {}",
            field.owner(),
            field.name(),
            value.key()
          );
        }
      }
      None if field.is_optional() => {
        debug!("optional field {}.{} left unset", field.owner(), field.name());
      }
      None => {
        warn!(
          "required field {}.{} could not be satisfied; left unset",
          field.owner(),
          field.name()
        );
      }
    }
  }

  fn invoke_method(&self, method: &MethodSite, owner: &StoredInstance, context: &Context) {
    let values = method
      .params()
      .iter()
      .map(|param| {
        let resolved = context.resolve_quiet(param.key());
        if resolved.is_none() && !param.is_optional() {
          warn!(
            "required parameter {} of {}.{} could not be satisfied",
            param.key(),
            method.owner(),
            method.name()
          );
        }
        resolved
      })
      .collect();
    let args = MethodArgs::new(values);
    if !method.invoke(owner, &args) {
      warn!(
        "method {}.{} rejected its receiver; declaration mismatch",
        method.owner(),
        method.name()
      );
    }
  }
}

/// Bootstraps a context from a seed set: index, validate, and — only on
/// a clean report — run both injection phases.
///
/// A failed validation aborts with [`Error::Validation`] carrying the
/// aggregated report; the context is left untouched so the host can
/// refuse startup, fix the wiring, and retry.
pub fn bootstrap(
  context: &Context,
  seeds: impl IntoIterator<Item = TypeKey>,
) -> Result<Validation> {
  let registry = context.registry().clone();
  let indexer = Indexer::index(&registry, seeds);
  let validation = context.validate(&indexer);
  if !validation.ok {
    return Err(Error::Validation(validation));
  }
  let injector = Injector::new(registry);
  injector.instantiate_all(&indexer, context);
  injector.inject_all(&indexer, context);
  Ok(validation)
}

/// Bootstraps from a [`Manifest`]: resolves the seed names and, when the
/// manifest keeps validation enabled, behaves like [`bootstrap`].
/// Returns `Ok(None)` when the manifest opted out of validation.
pub fn bootstrap_from_manifest(
  context: &Context,
  manifest: &Manifest,
) -> Result<Option<Validation>> {
  let registry = context.registry().clone();
  let seeds = resolve_seed_names(&registry, manifest.seeds.iter().map(String::as_str));
  if manifest.validate {
    return bootstrap(context, seeds).map(Some);
  }
  let indexer = Indexer::index(&registry, seeds);
  let injector = Injector::new(registry);
  injector.instantiate_all(&indexer, context);
  injector.inject_all(&indexer, context);
  Ok(None)
}
