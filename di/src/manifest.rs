//! Seed lists and the optional bootstrap manifest.
//!
//! The container can be seeded three ways: literal [`TypeKey`]s, a
//! plain-text list of type names (one per line), or a small YAML
//! manifest that also carries bootstrap options. Name resolution is
//! best-effort: unresolvable names are logged and skipped so one stale
//! entry never aborts the load.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::core::TypeKey;
use crate::error::{Error, Result};
use crate::registry::Registry;

/// The YAML bootstrap manifest.
///
/// ```yaml
/// seeds:
///   - myapp::tracking::Engine
///   - myapp::persistence::Store
/// validate: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Manifest {
  /// Fully qualified type names to seed the closure with.
  #[serde(default)]
  pub seeds: Vec<String>,
  /// Whether bootstrap runs the pre-flight graph validation. On by
  /// default; opting out skips the abort-on-failure contract.
  #[serde(default = "default_validate")]
  pub validate: bool,
}

fn default_validate() -> bool {
  true
}

impl Default for Manifest {
  fn default() -> Self {
    Self {
      seeds: Vec::new(),
      validate: true,
    }
  }
}

impl Manifest {
  /// Parses a manifest from YAML text.
  pub fn from_yaml_str(text: &str) -> Result<Self> {
    Ok(serde_yaml::from_str(text)?)
  }

  /// Reads and parses a manifest file.
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
    let text = std::fs::read_to_string(path)?;
    Self::from_yaml_str(&text)
  }
}

/// Probes the conventional manifest locations relative to the working
/// directory and returns the first that exists.
pub fn find_manifest() -> Option<PathBuf> {
  const CANDIDATES: [&str; 4] = [
    "filament.yaml",
    "filament.yml",
    "config/filament.yaml",
    "config/filament.yml",
  ];
  CANDIDATES
    .into_iter()
    .map(PathBuf::from)
    .find(|path| path.is_file())
}

/// Reads a plain-text seed list: one type name per line, blank lines and
/// `#` comments ignored.
pub fn load_seed_names(path: impl AsRef<Path>) -> Result<Vec<String>> {
  Ok(parse_seed_names(&std::fs::read_to_string(path)?))
}

/// Parses seed names out of plain text. See [`load_seed_names`].
pub fn parse_seed_names(text: &str) -> Vec<String> {
  text
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty() && !line.starts_with('#'))
    .map(str::to_owned)
    .collect()
}

/// Resolves type names against the registry. Unresolvable names are
/// logged and skipped; the load never aborts.
pub fn resolve_seed_names<'a>(
  registry: &Registry,
  names: impl IntoIterator<Item = &'a str>,
) -> Vec<TypeKey> {
  names
    .into_iter()
    .filter_map(|name| {
      let key = registry.key_by_name(name);
      if key.is_none() {
        warn!("{}", Error::UnknownTypeName(name.to_owned()));
      }
      key
    })
    .collect()
}
