//! Declarative injection metadata: what a type needs and how to build it.
//!
//! A [`Blueprint`] is the registration-table replacement for runtime
//! reflection: it records one constructor (declared parameter keys plus a
//! build closure), the injectable field and method sites, and the
//! interfaces the concrete type can stand in for. The typed
//! [`BlueprintBuilder`] erases all of it into boxed closures so the
//! registry, indexer, injector and validator can work purely on
//! [`TypeKey`]s.

use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::core::{StoredInstance, TypeKey};
use crate::error::Result;
use crate::injector::ConstructScope;

pub(crate) type BuildFn =
  Box<dyn Fn(&ConstructScope<'_>) -> Result<StoredInstance> + Send + Sync>;
pub(crate) type ApplyFn = Box<dyn Fn(&StoredInstance, &StoredInstance) -> bool + Send + Sync>;
pub(crate) type InvokeFn = Box<dyn Fn(&StoredInstance, &MethodArgs) -> bool + Send + Sync>;
pub(crate) type CastFn = Box<dyn Fn(&StoredInstance) -> Option<StoredInstance> + Send + Sync>;

/// One parameter of an injectable method.
#[derive(Debug, Clone, Copy)]
pub struct Param {
  key: TypeKey,
  optional: bool,
}

impl Param {
  pub fn required(key: TypeKey) -> Self {
    Self { key, optional: false }
  }

  pub fn optional(key: TypeKey) -> Self {
    Self { key, optional: true }
  }

  pub fn key(&self) -> TypeKey {
    self.key
  }

  pub fn is_optional(&self) -> bool {
    self.optional
  }
}

/// An injectable field: one dependency applied to a built instance.
pub struct FieldSite {
  owner: TypeKey,
  key: TypeKey,
  name: &'static str,
  optional: bool,
  apply: ApplyFn,
}

impl FieldSite {
  pub fn owner(&self) -> TypeKey {
    self.owner
  }

  pub fn key(&self) -> TypeKey {
    self.key
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn is_optional(&self) -> bool {
    self.optional
  }

  /// Applies the resolved value to the owning instance. `false` means a
  /// downcast failed, which indicates a mismatched declaration.
  pub(crate) fn apply(&self, owner: &StoredInstance, value: &StoredInstance) -> bool {
    (self.apply)(owner, value)
  }
}

/// An injectable method: a parameter list resolved as a batch, then one
/// invocation on the built instance.
pub struct MethodSite {
  owner: TypeKey,
  name: &'static str,
  params: Vec<Param>,
  invoke: InvokeFn,
}

impl MethodSite {
  pub fn owner(&self) -> TypeKey {
    self.owner
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn params(&self) -> &[Param] {
    &self.params
  }

  pub(crate) fn invoke(&self, owner: &StoredInstance, args: &MethodArgs) -> bool {
    (self.invoke)(owner, args)
  }
}

/// Resolved arguments handed to a method-site closure.
///
/// A slot is `None` when the parameter could not be resolved; required
/// parameters are logged by the injector before the call, but the method
/// is still invoked so the receiver can decide how to degrade.
pub struct MethodArgs {
  values: Vec<Option<StoredInstance>>,
}

impl MethodArgs {
  pub(crate) fn new(values: Vec<Option<StoredInstance>>) -> Self {
    Self { values }
  }

  /// The resolved argument at `index`, if present and of type `T`.
  pub fn get<T: ?Sized + Any + Send + Sync>(&self, index: usize) -> Option<Arc<T>> {
    self
      .values
      .get(index)
      .and_then(Option::as_ref)
      .and_then(StoredInstance::downcast::<T>)
  }
}

pub(crate) struct Constructor {
  pub(crate) params: Vec<TypeKey>,
  pub(crate) build: BuildFn,
}

/// The erased injection record for one concrete type.
pub struct Blueprint {
  key: TypeKey,
  constructor: Option<Constructor>,
  fallback: Option<BuildFn>,
  constructor_declarations: usize,
  fields: Vec<FieldSite>,
  methods: Vec<MethodSite>,
  implements: Vec<(TypeKey, CastFn)>,
}

impl Blueprint {
  /// Starts a blueprint for a type with a zero-argument fallback
  /// constructor (its `Default` impl), used when no constructor is
  /// declared.
  pub fn of<C: Default + Send + Sync + 'static>() -> BlueprintBuilder<C> {
    let mut builder = BlueprintBuilder::empty();
    builder.inner.fallback = Some(Box::new(|_scope| {
      Ok(StoredInstance::new(Arc::new(C::default())))
    }));
    builder
  }

  /// Starts a blueprint with no constructor at all. Instantiation fails
  /// at runtime unless [`BlueprintBuilder::constructor`] is called — the
  /// moral equivalent of a class without an accessible constructor.
  pub fn for_type<C: Send + Sync + 'static>() -> BlueprintBuilder<C> {
    BlueprintBuilder::empty()
  }

  /// The key this blueprint builds.
  pub fn key(&self) -> TypeKey {
    self.key
  }

  /// Declared constructor parameter keys; empty when only the fallback
  /// exists.
  pub fn constructor_params(&self) -> &[TypeKey] {
    self
      .constructor
      .as_ref()
      .map(|c| c.params.as_slice())
      .unwrap_or_default()
  }

  pub fn fields(&self) -> &[FieldSite] {
    &self.fields
  }

  pub fn methods(&self) -> &[MethodSite] {
    &self.methods
  }

  /// Keys of the interfaces this type declares it can stand in for.
  pub fn interfaces(&self) -> impl Iterator<Item = TypeKey> + '_ {
    self.implements.iter().map(|(key, _)| *key)
  }

  pub(crate) fn constructor(&self) -> Option<&Constructor> {
    self.constructor.as_ref()
  }

  pub(crate) fn fallback(&self) -> Option<&BuildFn> {
    self.fallback.as_ref()
  }

  pub(crate) fn constructor_declarations(&self) -> usize {
    self.constructor_declarations
  }

  /// The upcast for `target`, when declared.
  pub(crate) fn cast_to(&self, target: TypeKey) -> Option<&CastFn> {
    self
      .implements
      .iter()
      .find(|(key, _)| key.id() == target.id())
      .map(|(_, cast)| cast)
  }
}

/// Typed builder for a [`Blueprint`]; erase-and-register via
/// [`crate::Registry::register`].
pub struct BlueprintBuilder<C> {
  inner: Blueprint,
  _marker: PhantomData<fn() -> C>,
}

impl<C: Send + Sync + 'static> BlueprintBuilder<C> {
  fn empty() -> Self {
    Self {
      inner: Blueprint {
        key: TypeKey::of::<C>(),
        constructor: None,
        fallback: None,
        constructor_declarations: 0,
        fields: Vec::new(),
        methods: Vec::new(),
        implements: Vec::new(),
      },
      _marker: PhantomData,
    }
  }

  /// Declares the injectable constructor: the parameter keys that feed
  /// the dependency graph, and the build closure that resolves them
  /// through the [`ConstructScope`].
  ///
  /// At most one constructor may be declared; a second declaration is a
  /// structural error reported at registration time.
  pub fn constructor(
    mut self,
    params: Vec<TypeKey>,
    build: impl Fn(&ConstructScope<'_>) -> Result<C> + Send + Sync + 'static,
  ) -> Self {
    self.inner.constructor_declarations += 1;
    self.inner.constructor = Some(Constructor {
      params,
      build: Box::new(move |scope| build(scope).map(|c| StoredInstance::new(Arc::new(c)))),
    });
    self
  }

  /// Declares a required injectable field of concrete type `F`.
  ///
  /// The apply closure runs in the injection phase, once every closure
  /// member has been constructed; a field written after construction is
  /// expected to sit behind interior mutability (a `OnceCell`,
  /// typically).
  pub fn field<F: ?Sized + Any + Send + Sync>(
    self,
    name: &'static str,
    apply: impl Fn(&C, Arc<F>) + Send + Sync + 'static,
  ) -> Self {
    let key = TypeKey::of::<F>();
    self.field_site(key, name, false, apply)
  }

  /// Declares an optional injectable field of concrete type `F`.
  pub fn optional_field<F: ?Sized + Any + Send + Sync>(
    self,
    name: &'static str,
    apply: impl Fn(&C, Arc<F>) + Send + Sync + 'static,
  ) -> Self {
    let key = TypeKey::of::<F>();
    self.field_site(key, name, true, apply)
  }

  /// Declares an injectable field under an explicit key — the form to use
  /// for trait-object fields, with a `key!(trait ...)` key, so the
  /// validator sees the interface flag.
  pub fn field_with<F: ?Sized + Any + Send + Sync>(
    self,
    key: TypeKey,
    name: &'static str,
    optional: bool,
    apply: impl Fn(&C, Arc<F>) + Send + Sync + 'static,
  ) -> Self {
    debug_assert_eq!(key, TypeKey::of::<F>(), "field key does not match closure type");
    self.field_site(key, name, optional, apply)
  }

  fn field_site<F: ?Sized + Any + Send + Sync>(
    mut self,
    key: TypeKey,
    name: &'static str,
    optional: bool,
    apply: impl Fn(&C, Arc<F>) + Send + Sync + 'static,
  ) -> Self {
    let owner = self.inner.key;
    let apply: ApplyFn = Box::new(move |instance, value| {
      match (instance.downcast::<C>(), value.downcast::<F>()) {
        (Some(owner), Some(value)) => {
          apply(&owner, value);
          true
        }
        _ => false,
      }
    });
    self.inner.fields.push(FieldSite {
      owner,
      key,
      name,
      optional,
      apply,
    });
    self
  }

  /// Declares an injectable method with an explicit parameter list. The
  /// invoke closure receives the arguments resolved as a batch; slots for
  /// unresolvable parameters are `None`.
  pub fn method(
    mut self,
    name: &'static str,
    params: Vec<Param>,
    invoke: impl Fn(&C, &MethodArgs) + Send + Sync + 'static,
  ) -> Self {
    let owner = self.inner.key;
    let invoke: InvokeFn = Box::new(move |instance, args| match instance.downcast::<C>() {
      Some(owner) => {
        invoke(&owner, args);
        true
      }
      None => false,
    });
    self.inner.methods.push(MethodSite {
      owner,
      name,
      params,
      invoke,
    });
    self
  }

  /// Sugar for the common one-required-parameter method.
  pub fn setter<A: Any + Send + Sync>(
    self,
    name: &'static str,
    invoke: impl Fn(&C, Arc<A>) + Send + Sync + 'static,
  ) -> Self {
    let params = vec![Param::required(TypeKey::of::<A>())];
    self.method(name, params, move |owner, args| {
      if let Some(value) = args.get::<A>(0) {
        invoke(owner, value);
      }
    })
  }

  /// Sugar for a one-optional-parameter method.
  pub fn optional_setter<A: Any + Send + Sync>(
    self,
    name: &'static str,
    invoke: impl Fn(&C, Arc<A>) + Send + Sync + 'static,
  ) -> Self {
    let params = vec![Param::optional(TypeKey::of::<A>())];
    self.method(name, params, move |owner, args| {
      if let Some(value) = args.get::<A>(0) {
        invoke(owner, value);
      }
    })
  }

  /// Declares that this type can stand in for the interface `I`.
  ///
  /// The cast closure is where the unsizing coercion happens, so the
  /// call site reads `.implements::<dyn Store>(|c| c)`. The trait must
  /// be `Send + Sync` for the handle to cross the container.
  pub fn implements<I: ?Sized + Any + Send + Sync>(
    mut self,
    cast: impl Fn(Arc<C>) -> Arc<I> + Send + Sync + 'static,
  ) -> Self {
    let target = TypeKey::of_interface::<I>();
    let cast: CastFn = Box::new(move |stored| {
      stored
        .downcast::<C>()
        .map(|concrete| StoredInstance::from_parts(target, Arc::new(cast(concrete))))
    });
    self.inner.implements.push((target, cast));
    self
  }

  pub(crate) fn into_blueprint(self) -> Blueprint {
    self.inner
  }
}
