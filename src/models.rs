//! Data structures produced while resolving a bundle.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Deserialize;

/// One concrete resource belonging to a bundle.
///
/// The path is stored separately from the bundle prefix, so membership checks compare the
/// resource path alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath {
  /// Bundle prefix (`/prefix/`) the resource is served under, if any.
  pub bundle_prefix: Option<String>,
  /// Normalised resource path, or the verbatim path for generated resources.
  pub path: String,
}

impl ResourcePath {
  /// Create a resource path under an optional bundle prefix.
  pub fn new(bundle_prefix: Option<&str>, path: impl Into<String>) -> Self {
    Self {
      bundle_prefix: bundle_prefix.map(str::to_string),
      path: path.into(),
    }
  }

  /// The resource path without the bundle prefix.
  pub fn path(&self) -> &str {
    &self.path
  }

  /// Copy of this entry pointing at a different path under the same prefix.
  pub fn with_path(&self, path: impl Into<String>) -> Self {
    Self {
      bundle_prefix: self.bundle_prefix.clone(),
      path: path.into(),
    }
  }
}

impl std::fmt::Display for ResourcePath {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match &self.bundle_prefix {
      Some(prefix) => write!(
        f,
        "{}/{}",
        prefix.trim_end_matches('/'),
        self.path.trim_start_matches('/')
      ),
      None => f.write_str(&self.path),
    }
  }
}

/// Per-bundle flags deciding where and how a bundle is included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InclusionPolicy {
  /// The bundle is included on every page.
  pub global: bool,
  /// Position among global bundles.
  pub inclusion_order: i32,
  /// Resources are only served in debug mode.
  pub debug_only: bool,
  /// Resources are never served in debug mode.
  pub exclude_on_debug: bool,
  /// Conditional-comment expression wrapped around the bundle's tags.
  pub conditional_comment: Option<String>,
  /// Static URL replacing the bundle in production.
  pub alternate_production_url: Option<String>,
}

impl InclusionPolicy {
  /// Whether resources are appended to the production list.
  pub fn includes_in_production(&self) -> bool {
    !self.debug_only
  }

  /// Whether resources are appended to the debug list.
  pub fn includes_in_debug(&self) -> bool {
    !self.exclude_on_debug
  }
}

/// Immutable outcome of one mapping resolution pass.
///
/// A bundle publishes a new snapshot as a whole; readers holding an older snapshot keep
/// iterating it undisturbed.
#[derive(Debug, Clone, Default)]
pub struct ResolvedPaths {
  /// Resources served in production, in concatenation order.
  pub production: Arc<[ResourcePath]>,
  /// Resources served individually in debug mode, in emission order.
  pub debug: Arc<[ResourcePath]>,
  /// License files collected while resolving.
  pub licenses: Arc<BTreeSet<String>>,
}

impl ResolvedPaths {
  /// Returns `true` when `path` appears verbatim in either list.
  pub fn contains(&self, path: &str) -> bool {
    self.production.iter().any(|item| item.path == path)
      || self.debug.iter().any(|item| item.path == path)
  }
}
