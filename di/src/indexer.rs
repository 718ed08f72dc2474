//! Closure discovery: the transitive set of types a seed set pulls in.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::blueprint::{Blueprint, FieldSite, MethodSite};
use crate::core::TypeKey;
use crate::registry::Registry;

/// The closure of a seed set under the dependency relation, plus the
/// flattened injection sites the injector iterates in its second phase.
///
/// Discovery is a breadth-first walk: the work queue starts with the
/// registered seeds; each dequeued type contributes every declared
/// dependency, and a dependency joins the closure (and the queue) the
/// first time it appears, provided the registry holds a blueprint for
/// it. Targets without a blueprint stay outside the closure and are
/// recorded as external references for the validator. Each key is
/// enqueued at most once, so the walk terminates.
///
/// An `Indexer` is computed once per bootstrap and never mutated after.
pub struct Indexer {
  closure: Vec<TypeKey>,
  members: HashSet<TypeKey>,
  externals: Vec<(TypeKey, TypeKey)>,
  blueprints: Vec<Arc<Blueprint>>,
}

impl Indexer {
  /// Discovers the closure of `seeds`. Seeds without a registered
  /// blueprint are logged and skipped, mirroring the treatment of
  /// unresolvable names in a seed list.
  pub fn index(registry: &Registry, seeds: impl IntoIterator<Item = TypeKey>) -> Self {
    let mut closure = Vec::new();
    let mut members = HashSet::new();
    let mut externals = Vec::new();
    let mut queue = VecDeque::new();

    for seed in seeds {
      if !registry.contains(seed) {
        warn!("seed type {} has no registered blueprint; skipping", seed);
        continue;
      }
      if members.insert(seed) {
        closure.push(seed);
        queue.push_back(seed);
      }
    }

    while let Some(key) = queue.pop_front() {
      for dependency in registry.all_dependencies(key) {
        if members.contains(&dependency) {
          continue;
        }
        if registry.contains(dependency) {
          members.insert(dependency);
          closure.push(dependency);
          queue.push_back(dependency);
        } else {
          externals.push((key, dependency));
        }
      }
    }

    let blueprints = closure
      .iter()
      .filter_map(|key| registry.blueprint(*key))
      .collect();
    debug!("indexed closure of {} types", closure.len());

    Self {
      closure,
      members,
      externals,
      blueprints,
    }
  }

  /// Discovers the closure of a list of type names, resolving each
  /// against the registry. Unresolvable names are logged and skipped.
  pub fn from_names<'a>(
    registry: &Registry,
    names: impl IntoIterator<Item = &'a str>,
  ) -> Self {
    let seeds = crate::manifest::resolve_seed_names(registry, names);
    Self::index(registry, seeds)
  }

  /// The closure, in discovery order.
  pub fn closure(&self) -> &[TypeKey] {
    &self.closure
  }

  /// Whether `key` is a member of the closure.
  pub fn contains(&self, key: TypeKey) -> bool {
    self.members.contains(&key)
  }

  /// Number of closure members.
  pub fn len(&self) -> usize {
    self.closure.len()
  }

  pub fn is_empty(&self) -> bool {
    self.closure.is_empty()
  }

  /// Dependency edges whose target has no blueprint, as
  /// `(dependent, target)` pairs in discovery order.
  pub fn externals(&self) -> &[(TypeKey, TypeKey)] {
    &self.externals
  }

  /// The flattened field sites of the whole closure, in closure order.
  pub fn fields(&self) -> impl Iterator<Item = &FieldSite> {
    self.blueprints.iter().flat_map(|bp| bp.fields().iter())
  }

  /// The flattened method sites of the whole closure, in closure order.
  pub fn methods(&self) -> impl Iterator<Item = &MethodSite> {
    self.blueprints.iter().flat_map(|bp| bp.methods().iter())
  }
}
