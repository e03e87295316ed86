//! Expansion of bundle mappings into ordered resource lists.
//!
//! Mappings are processed in declaration order. Directory mappings list their children through
//! the [`ResourceReader`]; a sort file inside a directory forces the order of the resources it
//! names, remaining children follow in listing order, and subdirectories of recursive mappings
//! are expanded last, depth-first.

mod mapping;
mod sort_file;

use std::collections::BTreeSet;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{BundleError, Result};
use crate::generator::GeneratorRegistry;
use crate::models::{InclusionPolicy, ResolvedPaths, ResourcePath};
use crate::paths::join_paths;
use crate::reader::ResourceReader;

pub use mapping::{BundleMapping, RECURSIVE_SUFFIX};
pub use sort_file::parse_sort_file;

/// Default name of the directory-local sort file.
pub const DEFAULT_SORT_FILE_NAME: &str = "sorting.txt";
/// Default name of license files collected during resolution.
pub const DEFAULT_LICENSES_FILE_NAME: &str = "licenses.txt";

/// File names with special meaning during directory expansion.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResolverOptions {
    /// Name of the sort file forcing resource order within a directory.
    pub sort_file_name: String,
    /// Name of license files gathered into the license set.
    pub licenses_file_name: String,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            sort_file_name: DEFAULT_SORT_FILE_NAME.into(),
            licenses_file_name: DEFAULT_LICENSES_FILE_NAME.into(),
        }
    }
}

/// Everything a resolution pass needs to know about the bundle being resolved.
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Bundle name, used in error messages.
    pub bundle_name: &'a str,
    /// Normalised bundle prefix attached to every resource.
    pub bundle_prefix: Option<&'a str>,
    /// File extension (with leading `.`) resources must carry.
    pub file_extension: &'a str,
    /// Inclusion flags deciding which lists receive resources.
    pub policy: &'a InclusionPolicy,
    /// Special file names.
    pub options: &'a ResolverOptions,
    /// Storage access.
    pub reader: &'a dyn ResourceReader,
    /// Generated path recognition.
    pub generators: &'a dyn GeneratorRegistry,
}

/// Resolve `mappings` from scratch into a fresh snapshot.
///
/// The first unrecognised mapping aborts the whole pass.
pub fn resolve_mappings<S: AsRef<str>>(
    context: &ResolveContext<'_>,
    mappings: &[S],
) -> Result<ResolvedPaths> {
    debug!(bundle = context.bundle_name, "creating bundle path list");

    let mut pass = ResolutionPass::new(context);
    for raw in mappings {
        let raw = raw.as_ref();
        let mapping = BundleMapping::parse(
            raw,
            context.file_extension,
            &context.options.licenses_file_name,
            context.generators,
        )
        .ok_or_else(|| BundleError::InvalidMapping {
            bundle: context.bundle_name.to_string(),
            mapping: raw.to_string(),
        })?;

        match mapping {
            BundleMapping::Directory { path, recursive } => pass.add_items_from_dir(&path, recursive)?,
            BundleMapping::File(path) | BundleMapping::Generated(path) => pass.add_resource(path),
            BundleMapping::License(path) => {
                pass.licenses.insert(path);
            }
        }
    }

    debug!(
        bundle = context.bundle_name,
        resources = pass.production.len(),
        licenses = pass.licenses.len(),
        "finished creating bundle path list"
    );
    Ok(pass.finish())
}

struct ResolutionPass<'a> {
    context: &'a ResolveContext<'a>,
    production: Vec<ResourcePath>,
    debug: Vec<ResourcePath>,
    licenses: BTreeSet<String>,
}

impl<'a> ResolutionPass<'a> {
    fn new(context: &'a ResolveContext<'a>) -> Self {
        Self {
            context,
            production: Vec::new(),
            debug: Vec::new(),
            licenses: BTreeSet::new(),
        }
    }

    fn finish(self) -> ResolvedPaths {
        ResolvedPaths {
            production: self.production.into(),
            debug: self.debug.into(),
            licenses: self.licenses.into(),
        }
    }

    fn add_resource(&mut self, path: String) {
        let item = ResourcePath::new(self.context.bundle_prefix, path);
        if self.context.policy.includes_in_production() {
            self.production.push(item.clone());
        }
        if self.context.policy.includes_in_debug() {
            self.debug.push(item);
        }
    }

    fn is_bundle_resource(&self, path: &str) -> bool {
        let extension = self.context.file_extension;
        (!extension.is_empty() && path.ends_with(extension))
            || self.context.generators.is_generated_path(path)
    }

    fn add_items_from_dir(&mut self, dir: &str, add_sub_dirs: bool) -> Result<()> {
        let context = self.context;
        let generated = context.generators.is_generated_path(dir);
        let sort_file_name = context.options.sort_file_name.as_str();
        let licenses_file_name = context.options.licenses_file_name.as_str();

        let mut remaining: Vec<String> = context
            .reader
            .list_resources(dir)
            .into_iter()
            .map(|name| name.trim_matches('/').to_string())
            .filter(|name| !name.is_empty())
            .collect();
        debug!(
            bundle = context.bundle_name,
            dir,
            count = remaining.len(),
            "adding resources from directory"
        );

        if take_name(&mut remaining, sort_file_name) {
            let sort_path = join_paths(dir, sort_file_name, generated);
            let contents =
                context
                    .reader
                    .read_resource(&sort_path)
                    .map_err(|source| BundleError::SortFile {
                        bundle: context.bundle_name.to_string(),
                        path: sort_path.clone(),
                        source,
                    })?;

            for name in parse_sort_file(&contents) {
                if !take_name(&mut remaining, &name) {
                    warn!(
                        bundle = context.bundle_name,
                        sort_file = %sort_path,
                        resource = %name,
                        "sort file lists a resource missing from its directory"
                    );
                    continue;
                }

                let path = join_paths(dir, &name, generated);
                if self.is_bundle_resource(&path) {
                    debug!(bundle = context.bundle_name, %path, "added from sort file");
                    self.add_resource(path);
                } else if add_sub_dirs && context.reader.is_directory(&path) {
                    self.add_items_from_dir(&path, true)?;
                }
            }
        }

        if take_name(&mut remaining, licenses_file_name) {
            self.licenses
                .insert(join_paths(dir, licenses_file_name, generated));
        }

        let mut folders = Vec::new();
        for name in remaining {
            let path = join_paths(dir, &name, generated);
            let is_dir = context.reader.is_directory(&path);
            if is_dir {
                if add_sub_dirs {
                    folders.push(path);
                }
            } else if self.is_bundle_resource(&path) {
                debug!(bundle = context.bundle_name, %path, "added to item path list");
                self.add_resource(path);
            }
        }

        for folder in folders {
            self.add_items_from_dir(&folder, true)?;
        }
        Ok(())
    }
}

/// Remove `name` from the listing, returning whether it was present.
fn take_name(names: &mut Vec<String>, name: &str) -> bool {
    match names.iter().position(|candidate| candidate == name) {
        Some(index) => {
            names.remove(index);
            true
        }
        None => false,
    }
}
