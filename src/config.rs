//! Bundle configuration loader.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{BundleError, Result};
use crate::models::InclusionPolicy;
use crate::resolver::ResolverOptions;
use crate::variant::VariantSets;

const DEFAULT_CONFIG_FILES: [&str; 3] = [
  "bundles.config.json",
  "bundles.config.yaml",
  "bundles.config.yml",
];

/// Discoverable configuration listing every bundle and the resolver's special file names.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
  /// Special file names used during directory expansion.
  pub resolver: ResolverOptions,
  /// Bundle definitions in declaration order.
  pub bundles: Vec<BundleDefinition>,
}

/// Declarative description of one bundle.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BundleDefinition {
  /// Public identifier of the bundle, usually its URL path.
  pub id: String,
  /// Unique name used in configuration and error messages; defaults to the id.
  pub name: String,
  /// Prefix under which the bundle's resources are served.
  pub bundle_prefix: Option<String>,
  /// Extension of the resources collected by the bundle, such as `js` or `.css`.
  pub file_extension: String,
  /// Raw path mappings in declaration order.
  pub mappings: Vec<String>,
  /// Inclusion flags.
  pub inclusion: InclusionPolicy,
  /// Variant axes the bundle is produced for.
  pub variants: VariantSets,
  /// Names of bundles this bundle depends on, in order.
  pub dependencies: Vec<String>,
  /// Static URL served instead of the resources in debug mode.
  pub debug_url: Option<String>,
}

impl BundleDefinition {
  /// Create a definition with the given id and extension; the name defaults to the id.
  pub fn new(id: impl Into<String>, file_extension: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      file_extension: file_extension.into(),
      ..Self::default()
    }
  }

  /// The configured name, or the id when no name was given.
  pub fn display_name(&self) -> &str {
    if self.name.is_empty() {
      &self.id
    } else {
      &self.name
    }
  }
}

impl BundleConfig {
  /// Load the first default configuration file found in `dir`.
  ///
  /// When none exists an empty configuration is returned; a file that exists but cannot be
  /// read or parsed is an error.
  pub fn discover(dir: &Path) -> Result<Self> {
    match DEFAULT_CONFIG_FILES
      .iter()
      .map(|name| dir.join(name))
      .find(|candidate| candidate.is_file())
    {
      Some(path) => Self::from_path(&path),
      None => Ok(Self::default()),
    }
  }

  /// Read configuration from a JSON or YAML file, chosen by extension.
  pub fn from_path(path: &Path) -> Result<Self> {
    let content = fs::read_to_string(path).map_err(|source| BundleError::ConfigRead {
      path: path.to_path_buf(),
      source,
    })?;

    let parse_error = |message: String| BundleError::ConfigParse {
      path: path.to_path_buf(),
      message,
    };
    match path.extension().and_then(|ext| ext.to_str()) {
      Some("yaml" | "yml") => {
        serde_yaml::from_str(&content).map_err(|err| parse_error(err.to_string()))
      }
      _ => serde_json::from_str(&content).map_err(|err| parse_error(err.to_string())),
    }
  }

  /// Default configuration file locations searched by [`BundleConfig::discover`].
  pub fn default_locations(dir: &Path) -> Vec<PathBuf> {
    DEFAULT_CONFIG_FILES.iter().map(|name| dir.join(name)).collect()
  }
}
