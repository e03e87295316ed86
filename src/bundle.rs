//! A resolved bundle: identity, resource lists, variants and fingerprints.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::config::BundleDefinition;
use crate::error::{BundleError, Result};
use crate::fingerprint::FingerprintStore;
use crate::generator::GeneratorRegistry;
use crate::models::{InclusionPolicy, ResolvedPaths, ResourcePath};
use crate::paths::{as_dir_path, as_path};
use crate::reader::ResourceReader;
use crate::resolver::{ResolveContext, ResolverOptions, resolve_mappings};
use crate::variant::{VariantContext, VariantSets, resolve_variant_paths, select_bundle_variant_key};

/// Mappings together with the paths they resolved to, published as one unit.
struct Snapshot {
  mappings: Arc<[String]>,
  paths: Arc<ResolvedPaths>,
}

/// A named, ordered collection of resources served as one logical unit.
///
/// Resource lists are rebuilt copy-on-write: a remapping resolves a complete new snapshot
/// before swapping it in, so concurrent readers see either the old or the new lists in full.
pub struct ResourceBundle {
  id: String,
  name: String,
  bundle_prefix: Option<String>,
  file_extension: String,
  policy: InclusionPolicy,
  variants: VariantSets,
  variant_keys: Vec<String>,
  dependencies: Vec<String>,
  debug_url: Option<String>,
  options: ResolverOptions,
  reader: Arc<dyn ResourceReader>,
  generators: Arc<dyn GeneratorRegistry>,
  snapshot: RwLock<Arc<Snapshot>>,
  fingerprints: FingerprintStore,
}

impl ResourceBundle {
  /// Build a bundle from its definition and resolve its mappings.
  pub fn from_definition(
    definition: BundleDefinition,
    options: ResolverOptions,
    reader: Arc<dyn ResourceReader>,
    generators: Arc<dyn GeneratorRegistry>,
  ) -> Result<Self> {
    let name = definition.display_name().to_string();
    let id = if generators.is_generated_path(&definition.id) {
      definition.id
    } else {
      as_path(&definition.id)
    };
    let file_extension = match definition.file_extension.as_str() {
      "" => String::new(),
      ext if ext.starts_with('.') => ext.to_string(),
      ext => format!(".{ext}"),
    };
    let variant_keys = definition.variants.all_variant_keys();

    let bundle = Self {
      id,
      name,
      bundle_prefix: definition.bundle_prefix.as_deref().map(as_dir_path),
      file_extension,
      policy: definition.inclusion,
      variants: definition.variants,
      variant_keys,
      dependencies: definition.dependencies,
      debug_url: definition.debug_url.filter(|url| !url.is_empty()),
      options,
      reader,
      generators,
      snapshot: RwLock::new(Arc::new(Snapshot {
        mappings: Arc::from(Vec::new()),
        paths: Arc::default(),
      })),
      fingerprints: FingerprintStore::new(),
    };
    bundle.set_mappings(definition.mappings)?;
    Ok(bundle)
  }

  /// Replace the mappings, re-resolving every resource list from scratch.
  ///
  /// On failure the previously published lists stay in place.
  pub fn set_mappings(&self, mappings: Vec<String>) -> Result<()> {
    let context = ResolveContext {
      bundle_name: &self.name,
      bundle_prefix: self.bundle_prefix.as_deref(),
      file_extension: &self.file_extension,
      policy: &self.policy,
      options: &self.options,
      reader: self.reader.as_ref(),
      generators: self.generators.as_ref(),
    };
    let paths = resolve_mappings(&context, &mappings)?;
    info!(
      bundle = %self.name,
      files = paths.production.len(),
      licenses = paths.licenses.len(),
      "resolved bundle mappings"
    );

    *self.snapshot.write() = Arc::new(Snapshot {
      mappings: mappings.into(),
      paths: Arc::new(paths),
    });
    Ok(())
  }

  /// Bundle identifier (its public path).
  pub fn id(&self) -> &str {
    &self.id
  }

  /// Bundle name.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Normalised bundle prefix.
  pub fn bundle_prefix(&self) -> Option<&str> {
    self.bundle_prefix.as_deref()
  }

  /// Resource file extension, with its leading `.`.
  pub fn file_extension(&self) -> &str {
    &self.file_extension
  }

  /// Inclusion flags.
  pub fn inclusion_policy(&self) -> &InclusionPolicy {
    &self.policy
  }

  /// Conditional-comment expression wrapped around the bundle's tags.
  pub fn conditional_comment(&self) -> Option<&str> {
    self.policy.conditional_comment.as_deref()
  }

  /// Static URL replacing the bundle in production.
  pub fn alternate_production_url(&self) -> Option<&str> {
    self.policy.alternate_production_url.as_deref()
  }

  /// Static URL served instead of the resources in debug mode.
  pub fn debug_url(&self) -> Option<&str> {
    self.debug_url.as_deref()
  }

  /// Declared variant axes.
  pub fn variants(&self) -> &VariantSets {
    &self.variants
  }

  /// Every variant key the bundle can be produced for.
  pub fn variant_keys(&self) -> &[String] {
    &self.variant_keys
  }

  /// Names of the bundles this bundle depends on, as declared.
  pub fn dependencies(&self) -> &[String] {
    &self.dependencies
  }

  /// Mappings the current lists were resolved from.
  pub fn mappings(&self) -> Arc<[String]> {
    Arc::clone(&self.snapshot.read().mappings)
  }

  /// The current snapshot of resolved lists.
  pub fn paths(&self) -> Arc<ResolvedPaths> {
    Arc::clone(&self.snapshot.read().paths)
  }

  /// Resources served in production.
  pub fn production_paths(&self) -> Arc<[ResourcePath]> {
    Arc::clone(&self.paths().production)
  }

  /// Resources served individually in debug mode.
  pub fn debug_paths(&self) -> Arc<[ResourcePath]> {
    Arc::clone(&self.paths().debug)
  }

  /// License files gathered while resolving.
  pub fn licenses(&self) -> Arc<BTreeSet<String>> {
    Arc::clone(&self.paths().licenses)
  }

  /// Production resources with generated paths rewritten for `context`.
  pub fn production_paths_for(&self, context: &VariantContext) -> Arc<[ResourcePath]> {
    resolve_variant_paths(&self.production_paths(), context, self.generators.as_ref())
  }

  /// Debug resources with generated paths rewritten for `context`.
  ///
  /// Bundles with a static debug URL return their debug list untouched.
  pub fn debug_paths_for(&self, context: &VariantContext) -> Arc<[ResourcePath]> {
    let debug = self.debug_paths();
    if self.debug_url.is_some() {
      return debug;
    }
    resolve_variant_paths(&debug, context, self.generators.as_ref())
  }

  /// Returns `true` when `path` was resolved into the production or debug list.
  ///
  /// Regular paths are normalised before comparison; generated paths must match verbatim.
  pub fn belongs_to_bundle(&self, path: &str) -> bool {
    if self.generators.is_generated_path(path) {
      self.paths().contains(path)
    } else {
      self.paths().contains(&as_path(path))
    }
  }

  /// The declared variant key best matching `context`.
  pub fn select_variant_key(&self, context: &VariantContext) -> Option<String> {
    select_bundle_variant_key(self.variants.iter(), context)
  }

  /// Record a content hash; `None` targets the primary hash.
  pub fn set_fingerprint(&self, variant_key: Option<&str>, hash: impl Into<String>) {
    self.fingerprints.set(variant_key, hash);
  }

  /// The content hash stored for a variant key, or the primary hash for `None`.
  pub fn fingerprint(&self, variant_key: Option<&str>) -> Option<String> {
    self.fingerprints.get(variant_key)
  }

  /// All fingerprints of the bundle.
  pub fn fingerprints(&self) -> &FingerprintStore {
    &self.fingerprints
  }

  /// Cache-busting URL prefix for a request.
  ///
  /// Fails with [`BundleError::FingerprintNotReady`] until the primary hash is set, whatever
  /// the variant context.
  pub fn url_prefix(&self, context: &VariantContext) -> Result<String> {
    let key = self.select_variant_key(context);
    self
      .fingerprints
      .url_prefix(key.as_deref())
      .ok_or_else(|| BundleError::FingerprintNotReady {
        bundle: self.name.clone(),
      })
  }
}

impl fmt::Debug for ResourceBundle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ResourceBundle")
      .field("id", &self.id)
      .field("name", &self.name)
      .field("bundle_prefix", &self.bundle_prefix)
      .field("file_extension", &self.file_extension)
      .field("policy", &self.policy)
      .field("dependencies", &self.dependencies)
      .finish_non_exhaustive()
  }
}

impl fmt::Display for ResourceBundle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "ResourceBundle [id={}, name={}]", self.id, self.name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::generator::{NoGenerators, PrefixGeneratorRegistry};
  use crate::reader::MemoryResourceReader;
  use crate::variant::VariantSet;

  fn reader() -> Arc<MemoryResourceReader> {
    Arc::new(
      MemoryResourceReader::new()
        .with_file("/lib/sorting.txt", "b.js\na.js\n")
        .with_file("/lib/b.js", "b")
        .with_file("/lib/a.js", "a")
        .with_file("/lib/c.js", "c")
        .with_file("/lib/sub/d.js", "d")
        .with_file("/lib/licenses.txt", "MIT")
        .with_file("/app.js", "app"),
    )
  }

  fn definition(mappings: &[&str]) -> BundleDefinition {
    BundleDefinition {
      name: "lib".into(),
      mappings: mappings.iter().map(|m| m.to_string()).collect(),
      ..BundleDefinition::new("bundles/lib.js", "js")
    }
  }

  fn bundle(definition: BundleDefinition) -> ResourceBundle {
    ResourceBundle::from_definition(
      definition,
      ResolverOptions::default(),
      reader(),
      Arc::new(NoGenerators),
    )
    .expect("bundle should resolve")
  }

  fn names(items: &[ResourcePath]) -> Vec<String> {
    items.iter().map(|item| item.path().to_string()).collect()
  }

  fn context(pairs: &[(&str, &str)]) -> VariantContext {
    pairs
      .iter()
      .map(|(axis, value)| (axis.to_string(), value.to_string()))
      .collect()
  }

  #[test]
  fn normalises_identity() {
    let bundle = bundle(BundleDefinition {
      bundle_prefix: Some("v2".into()),
      ..definition(&[])
    });
    assert_eq!(bundle.id(), "/bundles/lib.js");
    assert_eq!(bundle.file_extension(), ".js");
    assert_eq!(bundle.bundle_prefix(), Some("/v2/"));
    assert_eq!(bundle.to_string(), "ResourceBundle [id=/bundles/lib.js, name=lib]");
  }

  #[test]
  fn resolves_mappings_on_construction() {
    let bundle = bundle(definition(&["lib/**"]));
    assert_eq!(names(&bundle.production_paths()), vec![
      "/lib/b.js",
      "/lib/a.js",
      "/lib/c.js",
      "/lib/sub/d.js"
    ]);
    assert_eq!(
      bundle.licenses().iter().cloned().collect::<Vec<_>>(),
      vec!["/lib/licenses.txt".to_string()]
    );
    assert_eq!(&*bundle.mappings(), ["lib/**".to_string()]);
  }

  #[test]
  fn belongs_to_bundle_matches_normalised_paths_exactly() {
    let bundle = bundle(definition(&["lib/"]));
    assert!(bundle.belongs_to_bundle("/lib/a.js"));
    assert!(bundle.belongs_to_bundle("lib//a.js"));
    assert!(!bundle.belongs_to_bundle("/lib/"));
    assert!(!bundle.belongs_to_bundle("/lib/sub/d.js"));
    assert!(!bundle.belongs_to_bundle("/lib/licenses.txt"));
  }

  #[test]
  fn belongs_to_bundle_covers_debug_only_resources() {
    let bundle = bundle(BundleDefinition {
      inclusion: InclusionPolicy {
        debug_only: true,
        ..InclusionPolicy::default()
      },
      ..definition(&["app.js"])
    });
    assert!(bundle.production_paths().is_empty());
    assert!(bundle.belongs_to_bundle("/app.js"));
  }

  #[test]
  fn remapping_recomputes_from_scratch() {
    let bundle = bundle(definition(&["lib/**"]));
    bundle.set_mappings(vec!["app.js".into()]).unwrap();
    assert_eq!(names(&bundle.production_paths()), vec!["/app.js"]);
    assert!(bundle.licenses().is_empty());
    assert!(!bundle.belongs_to_bundle("/lib/a.js"));
  }

  #[test]
  fn resolution_is_repeatable() {
    let first = bundle(definition(&["lib/**", "app.js"]));
    let second = bundle(definition(&["lib/**", "app.js"]));
    assert_eq!(first.production_paths(), second.production_paths());
    assert_eq!(first.debug_paths(), second.debug_paths());

    first.set_mappings(first.mappings().to_vec()).unwrap();
    assert_eq!(first.production_paths(), second.production_paths());
  }

  #[test]
  fn failed_remapping_keeps_previous_lists() {
    let bundle = bundle(definition(&["lib/"]));
    let before = bundle.paths();
    let err = bundle
      .set_mappings(vec!["app.js".into(), "styles/site.css".into()])
      .unwrap_err();
    assert!(matches!(
      err,
      BundleError::InvalidMapping { ref mapping, .. } if mapping == "styles/site.css"
    ));
    assert!(Arc::ptr_eq(&before, &bundle.paths()));
    assert_eq!(&*bundle.mappings(), ["lib/".to_string()]);
  }

  #[test]
  fn invalid_mapping_fails_construction() {
    let err = ResourceBundle::from_definition(
      definition(&["lib/", "readme"]),
      ResolverOptions::default(),
      reader(),
      Arc::new(NoGenerators),
    )
    .unwrap_err();
    assert_eq!(
      err.to_string(),
      "wrong mapping [readme] for bundle [lib], please check configuration"
    );
  }

  #[test]
  fn readers_see_whole_snapshots_during_rebuilds() {
    let bundle = bundle(definition(&["lib/**"]));
    std::thread::scope(|scope| {
      scope.spawn(|| {
        for round in 0..200 {
          let mapping = if round % 2 == 0 { "app.js" } else { "lib/**" };
          bundle.set_mappings(vec![mapping.to_string()]).unwrap();
        }
      });
      scope.spawn(|| {
        for _ in 0..200 {
          let paths = bundle.paths();
          let len = paths.production.len();
          assert!(len == 1 || len == 4, "observed partial list of {len}");
          assert_eq!(paths.production.len(), paths.debug.len());
        }
      });
    });
  }

  #[test]
  fn url_prefix_requires_primary_fingerprint() {
    let bundle = bundle(BundleDefinition {
      variants: VariantSets::new().with_axis("locale", VariantSet::new(["en", "fr"])),
      ..definition(&["lib/"])
    });
    for request in [context(&[]), context(&[("locale", "fr")]), context(&[("browser", "ie")])] {
      assert!(matches!(
        bundle.url_prefix(&request),
        Err(BundleError::FingerprintNotReady { .. })
      ));
    }

    bundle.set_fingerprint(None, "abc123");
    assert_eq!(bundle.url_prefix(&context(&[])).unwrap(), "abc123/");
    assert_eq!(bundle.url_prefix(&context(&[("locale", "fr")])).unwrap(), "abc123/");

    bundle.set_fingerprint(Some("fr"), "f00d");
    assert_eq!(bundle.url_prefix(&context(&[("locale", "fr_CA")])).unwrap(), "f00d.fr/");
    assert_eq!(bundle.url_prefix(&context(&[("locale", "de")])).unwrap(), "abc123/");
    assert_eq!(bundle.fingerprint(Some("fr")).as_deref(), Some("f00d"));
    assert_eq!(bundle.variant_keys(), ["en".to_string(), "fr".to_string()]);
  }

  #[test]
  fn variant_paths_rewrite_generated_resources() {
    let generators = PrefixGeneratorRegistry::new()
      .register("messages", ["locale"])
      .expect("valid prefix");
    let bundle = ResourceBundle::from_definition(
      definition(&["app.js", "messages:app"]),
      ResolverOptions::default(),
      reader(),
      Arc::new(generators),
    )
    .unwrap();

    let request = context(&[("locale", "fr")]);
    assert_eq!(names(&bundle.production_paths_for(&request)), vec![
      "/app.js",
      "messages:app@fr"
    ]);
    assert!(bundle.belongs_to_bundle("messages:app"));
    assert!(Arc::ptr_eq(
      &bundle.production_paths(),
      &bundle.production_paths_for(&VariantContext::new())
    ));
  }

  #[test]
  fn static_debug_url_keeps_debug_list_untouched() {
    let generators = PrefixGeneratorRegistry::new()
      .register("messages", ["locale"])
      .expect("valid prefix");
    let bundle = ResourceBundle::from_definition(
      BundleDefinition {
        debug_url: Some("/debug/messages.js".into()),
        ..definition(&["messages:app"])
      },
      ResolverOptions::default(),
      reader(),
      Arc::new(generators),
    )
    .unwrap();

    let request = context(&[("locale", "fr")]);
    assert_eq!(names(&bundle.debug_paths_for(&request)), vec!["messages:app"]);
    assert_eq!(names(&bundle.production_paths_for(&request)), vec!["messages:app@fr"]);
    assert_eq!(bundle.debug_url(), Some("/debug/messages.js"));
  }
}
