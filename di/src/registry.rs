//! The registration table and the dependency-discovery queries over it.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::blueprint::{Blueprint, BlueprintBuilder};
use crate::core::TypeKey;
use crate::error::{Error, Result};

/// Where on a type a dependency was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
  Constructor,
  Field,
  Method,
}

/// One declared dependency edge, with its classification.
#[derive(Debug, Clone, Copy)]
pub struct DependencyEdge {
  pub target: TypeKey,
  pub origin: Origin,
  pub optional: bool,
}

/// The registration table: type key → [`Blueprint`].
///
/// This is the container's stand-in for runtime reflection. Everything
/// the discoverer, indexer, injector and validator know about a type
/// comes from the blueprint registered here. The table is thread-safe
/// and dynamic; the last registration for a key wins.
#[derive(Default)]
pub struct Registry {
  blueprints: DashMap<TypeKey, Arc<Blueprint>>,
  names: DashMap<String, TypeKey>,
}

impl Registry {
  /// Creates a new, empty `Registry`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Erases and stores a blueprint.
  ///
  /// Rejects blueprints that declared more than one injectable
  /// constructor — the ambiguity is a structural error, not a silent
  /// pick.
  pub fn register<C: Send + Sync + 'static>(&self, builder: BlueprintBuilder<C>) -> Result<()> {
    let blueprint = builder.into_blueprint();
    let key = blueprint.key();
    if blueprint.constructor_declarations() > 1 {
      return Err(Error::MultipleConstructors(key));
    }
    debug!("registered blueprint for {}", key);
    self.names.insert(key.name().to_owned(), key);
    self.blueprints.insert(key, Arc::new(blueprint));
    Ok(())
  }

  /// The blueprint for `key`, if registered.
  pub fn blueprint(&self, key: TypeKey) -> Option<Arc<Blueprint>> {
    self.blueprints.get(&key).map(|entry| entry.value().clone())
  }

  /// Whether a blueprint exists for `key`.
  pub fn contains(&self, key: TypeKey) -> bool {
    self.blueprints.contains_key(&key)
  }

  /// Number of registered blueprints.
  pub fn len(&self) -> usize {
    self.blueprints.len()
  }

  pub fn is_empty(&self) -> bool {
    self.blueprints.is_empty()
  }

  /// Resolves a fully qualified type name to its registered key.
  pub fn key_by_name(&self, name: &str) -> Option<TypeKey> {
    self.names.get(name).map(|entry| *entry.value())
  }

  /// Keys of every registered blueprint declaring it implements the
  /// interface `target`.
  pub fn implementers(&self, target: TypeKey) -> Vec<TypeKey> {
    self
      .blueprints
      .iter()
      .filter(|entry| entry.value().interfaces().any(|i| i.id() == target.id()))
      .map(|entry| *entry.key())
      .collect()
  }

  /// Every declared dependency of `key`, with origin and optionality,
  /// in declaration order (constructor, then fields, then methods).
  /// Empty for unregistered keys.
  pub fn dependency_edges(&self, key: TypeKey) -> Vec<DependencyEdge> {
    let Some(blueprint) = self.blueprint(key) else {
      return Vec::new();
    };
    let mut edges = Vec::new();
    for &target in blueprint.constructor_params() {
      edges.push(DependencyEdge {
        target,
        origin: Origin::Constructor,
        optional: false,
      });
    }
    for field in blueprint.fields() {
      edges.push(DependencyEdge {
        target: field.key(),
        origin: Origin::Field,
        optional: field.is_optional(),
      });
    }
    for method in blueprint.methods() {
      for param in method.params() {
        edges.push(DependencyEdge {
          target: param.key(),
          origin: Origin::Method,
          optional: param.is_optional(),
        });
      }
    }
    edges
  }

  /// Every dependency of `key`, ignoring optionality. Deduplicated,
  /// first-seen order.
  pub fn all_dependencies(&self, key: TypeKey) -> Vec<TypeKey> {
    dedup(self.dependency_edges(key).into_iter().map(|e| e.target))
  }

  /// Every required dependency of `key`, optional edges excluded.
  pub fn required_dependencies(&self, key: TypeKey) -> Vec<TypeKey> {
    dedup(
      self
        .dependency_edges(key)
        .into_iter()
        .filter(|e| !e.optional)
        .map(|e| e.target),
    )
  }

  /// The constructor-declared dependencies of `key`; constructor
  /// parameters are always required.
  pub fn required_constructor_dependencies(&self, key: TypeKey) -> Vec<TypeKey> {
    dedup(
      self
        .dependency_edges(key)
        .into_iter()
        .filter(|e| e.origin == Origin::Constructor)
        .map(|e| e.target),
    )
  }
}

fn dedup(keys: impl Iterator<Item = TypeKey>) -> Vec<TypeKey> {
  let mut seen = std::collections::HashSet::new();
  keys.filter(|key| seen.insert(*key)).collect()
}
