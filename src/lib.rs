#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod builder;
pub mod bundle;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod generator;
pub mod models;
pub mod paths;
pub mod reader;
pub mod resolver;
pub mod variant;

pub use builder::{BundleSet, BundleSetBuilder};
pub use bundle::ResourceBundle;
pub use config::{BundleConfig, BundleDefinition};
pub use error::{BundleError, Result};
pub use fingerprint::FingerprintStore;
pub use generator::{GeneratorRegistry, NoGenerators, PrefixGeneratorRegistry};
pub use models::{InclusionPolicy, ResolvedPaths, ResourcePath};
pub use reader::{FsResourceReader, MemoryResourceReader, ResourceReader};
pub use resolver::{BundleMapping, ResolverOptions};
pub use variant::{VariantContext, VariantSet, VariantSets};
