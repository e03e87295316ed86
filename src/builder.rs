//! Build orchestrator turning a configuration into a set of resolved bundles.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::bundle::ResourceBundle;
use crate::config::BundleConfig;
use crate::error::{BundleError, Result};
use crate::generator::{GeneratorRegistry, NoGenerators};
use crate::reader::ResourceReader;

/// High-level helper resolving every bundle of a configuration against one reader.
pub struct BundleSetBuilder {
  reader: Arc<dyn ResourceReader>,
  generators: Arc<dyn GeneratorRegistry>,
}

impl BundleSetBuilder {
  /// Create a builder reading resources through `reader`, with no generators registered.
  pub fn new(reader: Arc<dyn ResourceReader>) -> Self {
    Self {
      reader,
      generators: Arc::new(NoGenerators),
    }
  }

  /// Use `generators` to recognise generated paths.
  pub fn with_generators(mut self, generators: Arc<dyn GeneratorRegistry>) -> Self {
    self.generators = generators;
    self
  }

  /// Resolve every bundle, then check names and dependency declarations.
  ///
  /// Any bundle failing to resolve aborts the whole build.
  pub fn build(&self, config: BundleConfig) -> Result<BundleSet> {
    let mut bundles = Vec::with_capacity(config.bundles.len());
    let mut by_name = HashMap::new();

    for definition in config.bundles {
      let bundle = ResourceBundle::from_definition(
        definition,
        config.resolver.clone(),
        Arc::clone(&self.reader),
        Arc::clone(&self.generators),
      )?;
      if by_name
        .insert(bundle.name().to_string(), bundles.len())
        .is_some()
      {
        return Err(BundleError::DuplicateBundle {
          name: bundle.name().to_string(),
        });
      }
      bundles.push(Arc::new(bundle));
    }

    for bundle in &bundles {
      if let Some(missing) = bundle
        .dependencies()
        .iter()
        .find(|dependency| !by_name.contains_key(dependency.as_str()))
      {
        return Err(BundleError::UnknownDependency {
          bundle: bundle.name().to_string(),
          dependency: missing.clone(),
        });
      }
    }

    info!(bundles = bundles.len(), "built bundle set");
    Ok(BundleSet { bundles, by_name })
  }
}

/// Resolved bundles in declaration order.
#[derive(Debug, Default)]
pub struct BundleSet {
  bundles: Vec<Arc<ResourceBundle>>,
  by_name: HashMap<String, usize>,
}

impl BundleSet {
  /// Number of bundles.
  pub fn len(&self) -> usize {
    self.bundles.len()
  }

  /// Returns `true` when the set holds no bundle.
  pub fn is_empty(&self) -> bool {
    self.bundles.is_empty()
  }

  /// Bundles in declaration order.
  pub fn iter(&self) -> impl Iterator<Item = &Arc<ResourceBundle>> {
    self.bundles.iter()
  }

  /// Look a bundle up by name.
  pub fn get(&self, name: &str) -> Option<&Arc<ResourceBundle>> {
    self.by_name.get(name).map(|index| &self.bundles[*index])
  }

  /// Look a bundle up by id.
  pub fn find_by_id(&self, id: &str) -> Option<&Arc<ResourceBundle>> {
    self.bundles.iter().find(|bundle| bundle.id() == id)
  }

  /// First bundle, in declaration order, that a resource path belongs to.
  pub fn bundle_for_path(&self, path: &str) -> Option<&Arc<ResourceBundle>> {
    self.bundles.iter().find(|bundle| bundle.belongs_to_bundle(path))
  }

  /// Bundles `name` depends on, in declared order.
  ///
  /// No transitive expansion or reordering happens here.
  pub fn dependencies_of(&self, name: &str) -> Result<Vec<Arc<ResourceBundle>>> {
    let Some(bundle) = self.get(name) else {
      return Ok(Vec::new());
    };
    bundle
      .dependencies()
      .iter()
      .map(|dependency| {
        self
          .get(dependency)
          .cloned()
          .ok_or_else(|| BundleError::UnknownDependency {
            bundle: name.to_string(),
            dependency: dependency.clone(),
          })
      })
      .collect()
  }

  /// Global bundles, stably ordered by inclusion order.
  pub fn global_bundles(&self) -> Vec<Arc<ResourceBundle>> {
    let mut globals: Vec<Arc<ResourceBundle>> = self
      .bundles
      .iter()
      .filter(|bundle| bundle.inclusion_policy().global)
      .cloned()
      .collect();
    globals.sort_by_key(|bundle| bundle.inclusion_policy().inclusion_order);
    globals
  }
}
