//! Recognition of generated (synthetic) resource paths.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

/// Registry describing which paths are produced by generators rather than read from storage.
pub trait GeneratorRegistry: Send + Sync {
  /// Returns `true` when the path is produced by a generator.
  fn is_generated_path(&self, path: &str) -> bool;

  /// Variant axes (for example `locale`) the generator for `path` can produce variants for.
  fn supported_variant_axes(&self, path: &str) -> BTreeSet<String>;
}

/// Registry that recognises no generated paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGenerators;

impl GeneratorRegistry for NoGenerators {
  fn is_generated_path(&self, _path: &str) -> bool {
    false
  }

  fn supported_variant_axes(&self, _path: &str) -> BTreeSet<String> {
    BTreeSet::new()
  }
}

fn generator_prefix_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_.-]*:$").expect("invalid generator prefix regex")
  })
}

/// Registry recognising generated paths by a scheme-like prefix such as `messages:`.
#[derive(Debug, Clone, Default)]
pub struct PrefixGeneratorRegistry {
  generators: Vec<(String, BTreeSet<String>)>,
}

impl PrefixGeneratorRegistry {
  /// Create an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a generator prefix along with the variant axes it supports.
  ///
  /// Prefixes without a trailing `:` get one appended. Returns `None` for prefixes that are
  /// not a valid scheme name.
  pub fn register<I, S>(mut self, prefix: &str, axes: I) -> Option<Self>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let prefix = if prefix.ends_with(':') {
      prefix.to_string()
    } else {
      format!("{prefix}:")
    };
    if !generator_prefix_pattern().is_match(&prefix) {
      return None;
    }

    let axes = axes.into_iter().map(Into::into).collect();
    self.generators.retain(|(existing, _)| *existing != prefix);
    self.generators.push((prefix, axes));
    Some(self)
  }

  fn find(&self, path: &str) -> Option<&BTreeSet<String>> {
    self
      .generators
      .iter()
      .find(|(prefix, _)| path.starts_with(prefix.as_str()))
      .map(|(_, axes)| axes)
  }
}

impl GeneratorRegistry for PrefixGeneratorRegistry {
  fn is_generated_path(&self, path: &str) -> bool {
    self.find(path).is_some()
  }

  fn supported_variant_axes(&self, path: &str) -> BTreeSet<String> {
    self.find(path).cloned().unwrap_or_default()
  }
}
