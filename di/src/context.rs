//! The instance store: a type-keyed map of live singletons.

use std::any::Any;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{info, warn};

use crate::core::{StoredInstance, TypeKey};
use crate::indexer::Indexer;
use crate::injector::Injector;
use crate::registry::Registry;
use crate::validator::{GraphValidator, Validation};

/// Ad-hoc instances for a scoped lookup, each keyed by its own type.
#[derive(Default)]
pub struct Extras {
  items: Vec<StoredInstance>,
}

impl Extras {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds an override instance, keyed by `T`.
  pub fn with<T: Any + Send + Sync>(mut self, value: Arc<T>) -> Self {
    self.items.push(StoredInstance::new(value));
    self
  }
}

/// The instance store.
///
/// Holds at most one instance per type key and resolves lookups in three
/// steps: exact entry, declared-interface compatibility scan, and
/// finally on-demand synthesis through the injector. Lookups never
/// fail loudly — a miss is logged and surfaced as `None`, per the
/// best-effort bootstrap policy of the runtime.
///
/// The map is a concurrent `DashMap`, so reads after bootstrap are safe
/// from any thread; bootstrap itself is still expected to run on a
/// single thread before workers start.
pub struct Context {
  registry: Arc<Registry>,
  instances: DashMap<TypeKey, StoredInstance>,
}

impl Context {
  /// Creates an empty context over a registration table.
  pub fn new(registry: Arc<Registry>) -> Self {
    Self {
      registry,
      instances: DashMap::new(),
    }
  }

  /// The registration table this context resolves against.
  pub fn registry(&self) -> &Arc<Registry> {
    &self.registry
  }

  /// Returns the instance for `T`, synthesizing (construct + fully
  /// inject + cache) when none is stored yet. `None` means resolution
  /// failed; the cause has been logged.
  pub fn get<T: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.lookup(TypeKey::of::<T>()).and_then(|s| s.downcast::<T>())
  }

  /// Always synthesizes a fresh, fully injected instance of `T`,
  /// bypassing the cache for the root object. Its dependencies still
  /// resolve (and memoize) through the normal path.
  pub fn get_new<T: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<T>> {
    let key = TypeKey::of::<T>();
    let injector = Injector::new(self.registry.clone());
    let fresh = injector.fresh(key, self);
    if fresh.is_none() {
      warn!("could not synthesize a new instance of {}", key);
    }
    fresh.and_then(|s| s.downcast::<T>())
  }

  /// Resolves `T` against a disposable copy of this context seeded with
  /// the given override instances. The copy is discarded afterwards;
  /// this context is never mutated.
  pub fn get_scoped<T: ?Sized + Any + Send + Sync>(&self, extras: Extras) -> Option<Arc<T>> {
    let scoped = self.fork();
    for item in extras.items {
      scoped.instances.insert(item.key(), item);
    }
    scoped.get::<T>()
  }

  /// Stores `value` under its own type key, replacing any prior entry.
  pub fn put<T: Any + Send + Sync>(&self, value: T) {
    self.put_arc(Arc::new(value));
  }

  /// Stores a shared handle under its own type key.
  pub fn put_arc<T: ?Sized + Any + Send + Sync>(&self, value: Arc<T>) {
    let stored = StoredInstance::new(value);
    self.instances.insert(stored.key(), stored);
  }

  /// Bulk-copies every instance of `other` into this context. Entries of
  /// `other` win on key collision.
  pub fn merge(&self, other: &Context) {
    if std::ptr::eq(self, other) {
      return;
    }
    for entry in other.instances.iter() {
      self.instances.insert(*entry.key(), entry.value().clone());
    }
  }

  /// Whether an instance is stored under exactly `key`.
  pub fn contains(&self, key: TypeKey) -> bool {
    self.instances.contains_key(&key)
  }

  /// Whether every key has a stored instance.
  pub fn contains_all(&self, keys: impl IntoIterator<Item = TypeKey>) -> bool {
    keys.into_iter().all(|key| self.contains(key))
  }

  /// The stored keys, in unspecified order.
  pub fn keys(&self) -> Vec<TypeKey> {
    self.instances.iter().map(|entry| *entry.key()).collect()
  }

  /// Number of stored instances.
  pub fn len(&self) -> usize {
    self.instances.len()
  }

  pub fn is_empty(&self) -> bool {
    self.instances.is_empty()
  }

  /// Runs the pre-flight graph validation for `indexer` and logs the
  /// wiring report — `info` on a clean graph, `warn` otherwise. Never
  /// fails; callers branch on the returned [`Validation`].
  pub fn validate(&self, indexer: &Indexer) -> Validation {
    let validation = GraphValidator::new(&self.registry).validate(indexer, self);
    if validation.ok {
      info!("{}", validation.report);
    } else {
      warn!("{}", validation.report);
    }
    validation
  }

  /// Key-driven lookup with on-demand synthesis; the erased counterpart
  /// of [`Context::get`].
  pub fn lookup(&self, key: TypeKey) -> Option<StoredInstance> {
    let resolved = self.resolve_quiet(key);
    if resolved.is_none() {
      warn!("no instance available for {} and synthesis failed", key);
    }
    resolved
  }

  /// Lookup with synthesis but without the failure warning; the injector
  /// uses this for sites that log their own, better-located message.
  pub(crate) fn resolve_quiet(&self, key: TypeKey) -> Option<StoredInstance> {
    if let Some(found) = self.peek(key) {
      return Some(found);
    }
    Injector::new(self.registry.clone()).synthesize(key, self)
  }

  /// Non-synthesizing lookup: exact entry first, then the first stored
  /// instance whose blueprint declares it implements `key`, in map
  /// iteration order.
  pub fn peek(&self, key: TypeKey) -> Option<StoredInstance> {
    if let Some(entry) = self.instances.get(&key) {
      return Some(entry.value().clone());
    }
    for entry in self.instances.iter() {
      if let Some(blueprint) = self.registry.blueprint(*entry.key()) {
        if let Some(cast) = blueprint.cast_to(key) {
          if let Some(upcast) = cast(entry.value()) {
            return Some(upcast);
          }
        }
      }
    }
    None
  }

  /// A copy of this context over the same registry: same instances,
  /// independent map.
  pub fn fork(&self) -> Context {
    let copy = Context::new(self.registry.clone());
    copy.merge(self);
    copy
  }

  pub(crate) fn insert(&self, key: TypeKey, instance: StoredInstance) {
    self.instances.insert(key, instance);
  }
}
