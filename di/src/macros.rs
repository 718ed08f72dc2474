//! Public macros for key construction and ergonomic resolution.

/// Builds a single [`crate::TypeKey`].
///
/// The `trait` arm produces an interface-flagged key for a trait object,
/// which is what the validator's missing-binding check keys off:
///
/// ```
/// use filament::key;
///
/// trait Store: Send + Sync {}
/// struct Config;
///
/// assert!(!key!(Config).is_interface());
/// assert!(key!(trait Store).is_interface());
/// ```
#[macro_export]
macro_rules! key {
  (trait $trait_ident:ident) => {
    $crate::TypeKey::of_interface::<dyn $trait_ident>()
  };
  ($type:ty) => {
    $crate::TypeKey::of::<$type>()
  };
}

/// Builds a `Vec<TypeKey>` from a mixed list of concrete types and
/// `trait` entries:
///
/// ```
/// use filament::keys;
///
/// trait Store: Send + Sync {}
/// struct Config;
/// struct Database;
///
/// let keys = keys![Config, trait Store, Database];
/// assert_eq!(keys.len(), 3);
/// assert!(keys[1].is_interface());
/// ```
#[macro_export]
macro_rules! keys {
  () => {
    ::std::vec::Vec::<$crate::TypeKey>::new()
  };
  ($($rest:tt)+) => {{
    let mut keys = ::std::vec::Vec::new();
    $crate::__keys_push!(keys; $($rest)+);
    keys
  }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __keys_push {
  ($vec:ident; trait $trait_ident:ident $(,)?) => {
    $vec.push($crate::TypeKey::of_interface::<dyn $trait_ident>());
  };
  ($vec:ident; trait $trait_ident:ident, $($rest:tt)+) => {
    $vec.push($crate::TypeKey::of_interface::<dyn $trait_ident>());
    $crate::__keys_push!($vec; $($rest)+);
  };
  ($vec:ident; $type:ty $(,)?) => {
    $vec.push($crate::TypeKey::of::<$type>());
  };
  ($vec:ident; $type:ty, $($rest:tt)+) => {
    $vec.push($crate::TypeKey::of::<$type>());
    $crate::__keys_push!($vec; $($rest)+);
  };
}

/// Resolves an instance, panicking when it is unavailable.
///
/// The two-argument forms resolve against an explicit [`crate::Context`];
/// the one-argument forms fall back to [`crate::global`]. Use the
/// fallible [`crate::Context::get`] directly where absence is an
/// expected outcome.
///
/// # Panics
///
/// Panics if the instance cannot be resolved or synthesized.
#[macro_export]
macro_rules! resolve {
  ($context:expr, trait $trait_ident:ident) => {
    $context.get::<dyn $trait_ident>().unwrap_or_else(|| {
      panic!(
        "failed to resolve required instance: {}",
        ::std::any::type_name::<dyn $trait_ident>()
      )
    })
  };
  ($context:expr, $type:ty) => {
    $context.get::<$type>().unwrap_or_else(|| {
      panic!(
        "failed to resolve required instance: {}",
        ::std::any::type_name::<$type>()
      )
    })
  };
  (trait $trait_ident:ident) => {
    $crate::resolve!($crate::global(), trait $trait_ident)
  };
  ($type:ty) => {
    $crate::resolve!($crate::global(), $type)
  };
}
