use std::sync::Arc;

use crate::generator::GeneratorRegistry;
use crate::models::ResourcePath;
use crate::variant::{VARIANT_SEPARATOR, VariantContext, VariantSet, variant_key, variant_resource_name};

/// Rewrite generated resources to their variant-specific names.
///
/// An empty context hands back the same list without allocating. Each generated path only
/// reacts to the axes its generator supports; other paths are kept as they are.
pub fn resolve_variant_paths(
  paths: &Arc<[ResourcePath]>,
  context: &VariantContext,
  generators: &dyn GeneratorRegistry,
) -> Arc<[ResourcePath]> {
  if context.is_empty() {
    return Arc::clone(paths);
  }

  paths
    .iter()
    .map(|item| {
      if !generators.is_generated_path(item.path()) {
        return item.clone();
      }
      let axes = generators.supported_variant_axes(item.path());
      let key = variant_key(context, &axes);
      if key.is_empty() {
        item.clone()
      } else {
        item.with_path(variant_resource_name(item.path(), &key))
      }
    })
    .collect()
}

/// Pick the most specific declared variant key for a request.
///
/// Axes are visited in name order and each contributes its best declared value: the requested
/// value itself, then its `_`-truncated parents (`en_GB_x`, `en_GB`, `en`), then the axis
/// default. Axes yielding nothing are left out of the key; requested axes the bundle does not
/// declare are ignored. Returns `None` when the request is empty or nothing matches.
pub fn select_bundle_variant_key<'a, I>(declared: I, context: &VariantContext) -> Option<String>
where
  I: IntoIterator<Item = (&'a str, &'a VariantSet)>,
{
  if context.is_empty() {
    return None;
  }

  let values: Vec<&str> = declared
    .into_iter()
    .filter_map(|(axis, set)| best_value(set, context.get(axis).map(String::as_str)))
    .collect();

  if values.is_empty() {
    None
  } else {
    Some(values.join(&VARIANT_SEPARATOR.to_string()))
  }
}

fn best_value<'a>(set: &'a VariantSet, requested: Option<&str>) -> Option<&'a str> {
  let mut candidate = requested.filter(|value| !value.is_empty());
  while let Some(value) = candidate {
    if let Some(found) = set.values().iter().find(|declared| declared.as_str() == value) {
      return Some(found.as_str());
    }
    candidate = value.rsplit_once('_').map(|(parent, _)| parent);
  }
  set.default_value()
}
