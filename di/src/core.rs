//! Core identity and type-erasure primitives shared by the container.

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Opaque token standing in for a concrete type or a trait object at the
/// container boundary.
///
/// Two keys are equal iff they denote the same declared type; equality and
/// hashing use the `TypeId` alone. The captured type name exists for
/// reports and deterministic sorting, and the interface flag records
/// whether the key was declared as a trait-object dependency — the
/// validator's missing-binding check relies on it.
#[derive(Clone, Copy)]
pub struct TypeKey {
  id: TypeId,
  name: &'static str,
  interface: bool,
}

impl TypeKey {
  /// Key for a concrete type.
  pub fn of<T: ?Sized + Any>() -> Self {
    Self {
      id: TypeId::of::<T>(),
      name: std::any::type_name::<T>(),
      interface: false,
    }
  }

  /// Key for a trait object, marked as an interface for diagnostics.
  ///
  /// Use this form when declaring a dependency on `dyn Trait`; a plain
  /// [`TypeKey::of`] key resolves identically but the validator will not
  /// treat it as a bindable interface.
  pub fn of_interface<T: ?Sized + Any>() -> Self {
    Self {
      interface: true,
      ..Self::of::<T>()
    }
  }

  /// The fully qualified name of the denoted type.
  pub fn name(&self) -> &'static str {
    self.name
  }

  /// Whether this key was declared as a trait-object dependency.
  pub fn is_interface(&self) -> bool {
    self.interface
  }

  pub(crate) fn id(&self) -> TypeId {
    self.id
  }
}

impl PartialEq for TypeKey {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for TypeKey {}

impl std::hash::Hash for TypeKey {
  fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

// Ordering is by name so that reports come out deterministic; the id
// breaks ties between distinct types that render the same name.
impl PartialOrd for TypeKey {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for TypeKey {
  fn cmp(&self, other: &Self) -> Ordering {
    self.name.cmp(other.name).then_with(|| self.id.cmp(&other.id))
  }
}

impl fmt::Debug for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.interface {
      write!(f, "TypeKey({}, interface)", self.name)
    } else {
      write!(f, "TypeKey({})", self.name)
    }
  }
}

impl fmt::Display for TypeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name)
  }
}

/// A type-erased, cheaply clonable handle to a stored instance.
///
/// The inner `Any` always wraps an `Arc<T>` for the key's `T`, so a
/// handle can be cloned and downcast freely without knowing `T` at the
/// storage layer. This is the same double-indirection trick the
/// resolution path uses for trait objects: `Arc<dyn Trait>` is itself a
/// sized value and boxes into `Any` like any other.
#[derive(Clone)]
pub struct StoredInstance {
  key: TypeKey,
  value: Arc<dyn Any + Send + Sync>,
}

impl StoredInstance {
  /// Wraps an instance, keyed by its own type.
  pub fn new<T: ?Sized + Any + Send + Sync>(instance: Arc<T>) -> Self {
    Self {
      key: TypeKey::of::<T>(),
      value: Arc::new(instance),
    }
  }

  pub(crate) fn from_parts(key: TypeKey, value: Arc<dyn Any + Send + Sync>) -> Self {
    Self { key, value }
  }

  /// The key this instance is stored under.
  pub fn key(&self) -> TypeKey {
    self.key
  }

  /// Recovers the typed handle, if `T` matches the stored type.
  pub fn downcast<T: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.value.downcast_ref::<Arc<T>>().cloned()
  }
}

impl fmt::Debug for StoredInstance {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "StoredInstance({})", self.key.name)
  }
}
