use thiserror::Error;

use crate::core::TypeKey;
use crate::validator::Validation;

/// The main error type for the `filament` runtime.
///
/// Lookup APIs on the container deliberately return `Option` rather than
/// this type: a missing instance is an expected outcome that is logged
/// and tolerated. `Error` covers the registration, configuration, and
/// bootstrap surfaces, where a failure must stop the caller.
#[derive(Debug, Error)]
pub enum Error {
  #[error("more than one injectable constructor declared for {0}")]
  MultipleConstructors(TypeKey),

  #[error("no usable constructor for {0}")]
  MissingConstructor(TypeKey),

  #[error("unsatisfied dependency: {required} required by {requested_by}")]
  UnsatisfiedDependency {
    required: TypeKey,
    requested_by: TypeKey,
  },

  #[error("constructor-level cycle entered at {0}")]
  CircularConstruction(TypeKey),

  #[error("constructor for {key} failed: {reason}")]
  Construction { key: TypeKey, reason: String },

  #[error("unknown type name: {0}")]
  UnknownTypeName(String),

  #[error("dependency graph validation failed:\n{}", .0.report)]
  Validation(Validation),

  #[error("failed to read configuration: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to parse manifest: {0}")]
  Manifest(#[from] serde_yaml::Error),
}

/// A specialized `Result` type for `filament` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
