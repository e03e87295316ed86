//! Error types surfaced while resolving bundles and serving fingerprints.

use std::path::PathBuf;

use thiserror::Error;

/// Failures produced by bundle resolution, configuration loading and fingerprint queries.
#[derive(Error, Debug)]
pub enum BundleError {
  /// A mapping matched none of the recognised forms.
  #[error("wrong mapping [{mapping}] for bundle [{bundle}], please check configuration")]
  InvalidMapping {
    /// Name of the bundle being resolved.
    bundle: String,
    /// The offending raw mapping string.
    mapping: String,
  },
  /// A sort file listed by the reader could not be read.
  #[error("failed to read sort file {path} for bundle [{bundle}]: {source}")]
  SortFile {
    /// Name of the bundle being resolved.
    bundle: String,
    /// Resource path of the sort file.
    path: String,
    /// Underlying reader error.
    source: std::io::Error,
  },
  /// The primary fingerprint was queried before the build step set it.
  #[error("the bundle data hash of [{bundle}] must be set before accessing the url prefix")]
  FingerprintNotReady {
    /// Name of the bundle.
    bundle: String,
  },
  /// A bundle declared a dependency on a bundle that does not exist.
  #[error("bundle [{bundle}] depends on unknown bundle [{dependency}]")]
  UnknownDependency {
    /// Name of the declaring bundle.
    bundle: String,
    /// Name of the missing dependency.
    dependency: String,
  },
  /// Two bundle definitions share a name.
  #[error("bundle [{name}] is defined more than once")]
  DuplicateBundle {
    /// The duplicated bundle name.
    name: String,
  },
  /// The configuration file could not be read.
  #[error("failed to read {}: {source}", path.display())]
  ConfigRead {
    /// Path of the configuration file.
    path: PathBuf,
    /// Underlying I/O error.
    source: std::io::Error,
  },
  /// The configuration file could not be parsed.
  #[error("failed to parse {}: {message}", path.display())]
  ConfigParse {
    /// Path of the configuration file.
    path: PathBuf,
    /// Parser message.
    message: String,
  },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BundleError>;
