//! Classification of raw mapping strings.

use crate::generator::GeneratorRegistry;
use crate::paths::{as_dir_path, as_path};

/// Suffix marking a recursive directory mapping.
pub const RECURSIVE_SUFFIX: &str = "/**";

/// A parsed bundle mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleMapping {
    /// Directory whose children are expanded; `recursive` for the `dir/**` form.
    Directory {
        /// Directory path in dir form (`/js/lib/`), verbatim when generated.
        path: String,
        /// Whether subdirectories are expanded too.
        recursive: bool,
    },
    /// A single resource with the bundle's file extension.
    File(String),
    /// A path produced by a generator, kept verbatim.
    Generated(String),
    /// A license file collected for license aggregation.
    License(String),
}

impl BundleMapping {
    /// Classify `raw`, returning `None` when it matches no recognised form.
    ///
    /// Forms are tested in a fixed order: plain directory, recursive directory, file with the
    /// bundle extension, generated path, license file.
    pub fn parse(
        raw: &str,
        file_extension: &str,
        licenses_file_name: &str,
        generators: &dyn GeneratorRegistry,
    ) -> Option<Self> {
        let generated = generators.is_generated_path(raw);
        let normalise = |path: &str| {
            if generated {
                path.to_string()
            } else {
                as_path(path)
            }
        };
        let normalise_dir = |path: &str| {
            if generated {
                path.to_string()
            } else {
                as_dir_path(path)
            }
        };

        if raw.ends_with('/') {
            return Some(Self::Directory {
                path: normalise_dir(raw),
                recursive: false,
            });
        }
        if let Some(dir) = raw.strip_suffix("**").filter(|_| raw.ends_with(RECURSIVE_SUFFIX)) {
            return Some(Self::Directory {
                path: normalise_dir(dir),
                recursive: true,
            });
        }
        if !file_extension.is_empty() && raw.ends_with(file_extension) {
            return Some(Self::File(normalise(raw)));
        }
        if generated {
            return Some(Self::Generated(raw.to_string()));
        }
        if !licenses_file_name.is_empty() && raw.ends_with(licenses_file_name) {
            return Some(Self::License(normalise(raw)));
        }
        None
    }
}
