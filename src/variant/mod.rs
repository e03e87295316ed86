//! Variant axes declared by bundles and the keys derived from them.
//!
//! A variant key joins one value per axis with [`VARIANT_SEPARATOR`], axes ordered by name, so
//! `{locale: fr, device: mobile}` becomes `mobile@fr`. Keys feed fingerprint lookups and
//! cache-busting URLs, so their composition must never depend on hash-map iteration order.

mod selection;

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

pub use selection::{resolve_variant_paths, select_bundle_variant_key};

/// Separator between axis values in a variant key, and between a path and its key.
pub const VARIANT_SEPARATOR: char = '@';

/// Values requested by a caller, keyed by axis name.
pub type VariantContext = BTreeMap<String, String>;

/// The possible values of one variant axis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VariantSet {
  values: Vec<String>,
  default: Option<String>,
}

impl VariantSet {
  /// Create a set from values in declaration order; duplicates are dropped.
  pub fn new<I, S>(values: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut seen = BTreeSet::new();
    let values = values
      .into_iter()
      .map(Into::into)
      .filter(|value: &String| seen.insert(value.clone()))
      .collect();
    Self {
      values,
      default: None,
    }
  }

  /// Set the value used when a request does not match any declared value.
  pub fn with_default(mut self, default: impl Into<String>) -> Self {
    self.default = Some(default.into());
    self
  }

  /// Declared values in order.
  pub fn values(&self) -> &[String] {
    &self.values
  }

  /// Fallback value, if one is declared and part of the set.
  pub fn default_value(&self) -> Option<&str> {
    self
      .default
      .as_deref()
      .filter(|value| self.contains(value))
  }

  /// Returns `true` when `value` is declared.
  pub fn contains(&self, value: &str) -> bool {
    self.values.iter().any(|candidate| candidate == value)
  }
}

/// Variant axes declared by a bundle, iterated in axis-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct VariantSets(BTreeMap<String, VariantSet>);

impl VariantSets {
  /// Create an empty declaration.
  pub fn new() -> Self {
    Self::default()
  }

  /// Declare (or replace) an axis.
  pub fn with_axis(mut self, axis: impl Into<String>, set: VariantSet) -> Self {
    self.0.insert(axis.into(), set);
    self
  }

  /// Returns `true` when no axis is declared.
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// The set declared for `axis`.
  pub fn get(&self, axis: &str) -> Option<&VariantSet> {
    self.0.get(axis)
  }

  /// Declared axes with their sets, in axis-name order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &VariantSet)> {
    self.0.iter().map(|(axis, set)| (axis.as_str(), set))
  }

  /// Every variant key of the cross product of the declared axes.
  ///
  /// Axes are combined in name order and values in declaration order; axes without values are
  /// skipped.
  pub fn all_variant_keys(&self) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for (_, set) in self.iter().filter(|(_, set)| !set.values().is_empty()) {
      keys = if keys.is_empty() {
        set.values().to_vec()
      } else {
        keys
          .iter()
          .flat_map(|prefix| {
            set
              .values()
              .iter()
              .map(move |value| format!("{prefix}{VARIANT_SEPARATOR}{value}"))
          })
          .collect()
      };
    }
    keys
  }
}

/// Compose the key for the requested values of `axes`, skipping axes absent from the request
/// or requested with an empty value.
pub fn variant_key(context: &VariantContext, axes: &BTreeSet<String>) -> String {
  context
    .iter()
    .filter(|(axis, value)| !value.is_empty() && axes.contains(axis.as_str()))
    .map(|(_, value)| value.as_str())
    .collect::<Vec<_>>()
    .join(&VARIANT_SEPARATOR.to_string())
}

/// Name of the variant-specific form of a generated resource.
pub fn variant_resource_name(path: &str, key: &str) -> String {
  if key.is_empty() {
    path.to_string()
  } else {
    format!("{path}{VARIANT_SEPARATOR}{key}")
  }
}
