//! Access to the resources a bundle is assembled from.

use std::collections::HashMap;
use std::fs;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::paths::as_path;

/// Read-only view over the storage that holds bundle resources.
///
/// Paths handed to a reader are bundle resource paths (`/js/lib/a.js`), never OS paths.
pub trait ResourceReader: Send + Sync {
  /// Names of the immediate children of `dir`, in the reader's listing order.
  ///
  /// A missing directory yields an empty listing.
  fn list_resources(&self, dir: &str) -> Vec<String>;

  /// Returns `true` when `path` names a directory.
  fn is_directory(&self, path: &str) -> bool;

  /// Read a text resource, failing with [`ErrorKind::NotFound`] when it is absent.
  fn read_resource(&self, path: &str) -> std::io::Result<String>;
}

/// Reader backed by a directory on the local filesystem.
///
/// Listings are sorted by name so that resolution does not depend on the platform's
/// `read_dir` ordering. Dot-files are skipped. Symbolic links are never treated as
/// directories, so a link back to an ancestor cannot make recursive expansion loop.
#[derive(Debug, Clone)]
pub struct FsResourceReader {
  root: PathBuf,
}

impl FsResourceReader {
  /// Create a reader rooted at `root`.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Root directory resources are resolved against.
  pub fn root(&self) -> &Path {
    &self.root
  }

  fn resolve(&self, path: &str) -> PathBuf {
    let relative = path.replace('\\', "/");
    let relative = relative.trim_matches('/');
    if relative.is_empty() {
      self.root.clone()
    } else {
      self.root.join(relative)
    }
  }
}

impl ResourceReader for FsResourceReader {
  fn list_resources(&self, dir: &str) -> Vec<String> {
    let entries = match fs::read_dir(self.resolve(dir)) {
      Ok(entries) => entries,
      Err(err) if err.kind() == ErrorKind::NotFound => return Vec::new(),
      Err(err) => {
        warn!(dir, error = %err, "failed to list resource directory");
        return Vec::new();
      }
    };

    let mut names: Vec<String> = entries
      .filter_map(|entry| match entry {
        Ok(entry) => Some(entry.file_name().to_string_lossy().to_string()),
        Err(err) => {
          warn!(dir, error = %err, "skipping unreadable directory entry");
          None
        }
      })
      .filter(|name| !name.starts_with('.'))
      .collect();
    names.sort();
    names
  }

  fn is_directory(&self, path: &str) -> bool {
    fs::symlink_metadata(self.resolve(path))
      .map(|metadata| metadata.file_type().is_dir())
      .unwrap_or(false)
  }

  fn read_resource(&self, path: &str) -> std::io::Result<String> {
    fs::read_to_string(self.resolve(path))
  }
}

/// In-memory reader that preserves insertion order in its listings.
///
/// Useful for resources embedded in the binary and for exercising resolution without touching
/// the filesystem.
#[derive(Debug, Clone, Default)]
pub struct MemoryResourceReader {
  files: HashMap<String, String>,
  dirs: HashMap<String, Vec<String>>,
}

impl MemoryResourceReader {
  /// Create an empty reader containing only the root directory.
  pub fn new() -> Self {
    let mut dirs = HashMap::new();
    dirs.insert("/".to_string(), Vec::new());
    Self {
      files: HashMap::new(),
      dirs,
    }
  }

  /// Add a file, registering every missing ancestor directory along the way.
  pub fn with_file(mut self, path: &str, contents: impl Into<String>) -> Self {
    let path = as_path(path);
    self.register_ancestors(&path);
    self.files.insert(path, contents.into());
    self
  }

  /// Add an (empty) directory.
  pub fn with_dir(mut self, path: &str) -> Self {
    let path = as_path(path);
    self.register_ancestors(&path);
    self.dirs.entry(path).or_default();
    self
  }

  fn register_ancestors(&mut self, path: &str) {
    let mut parent = String::from("/");
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    for (index, segment) in segments.iter().enumerate() {
      let children = self.dirs.entry(parent.clone()).or_default();
      if !children.iter().any(|child| child == segment) {
        children.push((*segment).to_string());
      }

      let child = if parent == "/" {
        format!("/{segment}")
      } else {
        format!("{parent}/{segment}")
      };
      if index + 1 < segments.len() {
        self.dirs.entry(child.clone()).or_default();
      }
      parent = child;
    }
  }
}

impl ResourceReader for MemoryResourceReader {
  fn list_resources(&self, dir: &str) -> Vec<String> {
    self.dirs.get(&as_path(dir)).cloned().unwrap_or_default()
  }

  fn is_directory(&self, path: &str) -> bool {
    self.dirs.contains_key(&as_path(path))
  }

  fn read_resource(&self, path: &str) -> std::io::Result<String> {
    self
      .files
      .get(&as_path(path))
      .cloned()
      .ok_or_else(|| Error::new(ErrorKind::NotFound, format!("resource {path} not found")))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn memory_reader_preserves_insertion_order() {
    let reader = MemoryResourceReader::new()
      .with_file("/lib/b.js", "b")
      .with_file("/lib/a.js", "a")
      .with_file("/lib/sub/c.js", "c");

    assert_eq!(reader.list_resources("/lib/"), vec!["b.js", "a.js", "sub"]);
    assert!(reader.is_directory("/lib/sub"));
    assert!(!reader.is_directory("/lib/a.js"));
    assert_eq!(reader.read_resource("lib/a.js").unwrap(), "a");
  }

  #[test]
  fn memory_reader_reports_missing_resources() {
    let reader = MemoryResourceReader::new().with_dir("/empty");
    assert!(reader.list_resources("/empty/").is_empty());
    assert!(reader.list_resources("/missing/").is_empty());
    let err = reader.read_resource("/missing.txt").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
  }

  #[test]
  fn fs_reader_lists_sorted_names_without_dot_files() -> std::io::Result<()> {
    let temp = tempdir()?;
    let lib = temp.path().join("lib");
    fs::create_dir_all(lib.join("sub"))?;
    fs::write(lib.join("b.js"), "b")?;
    fs::write(lib.join("a.js"), "a")?;
    fs::write(lib.join(".hidden"), "x")?;

    let reader = FsResourceReader::new(temp.path());
    assert_eq!(reader.list_resources("/lib/"), vec!["a.js", "b.js", "sub"]);
    assert!(reader.is_directory("/lib/sub"));
    assert_eq!(reader.read_resource("/lib/b.js")?, "b");
    assert!(reader.list_resources("/nope/").is_empty());
    Ok(())
  }

  #[test]
  fn fs_reader_lists_nothing_for_unlistable_paths() -> std::io::Result<()> {
    let temp = tempdir()?;
    fs::write(temp.path().join("app.js"), "app")?;

    let reader = FsResourceReader::new(temp.path());
    assert!(reader.list_resources("/app.js/").is_empty());
    assert!(!reader.is_directory("/app.js"));
    assert!(!reader.is_directory("/missing"));
    Ok(())
  }

  #[cfg(unix)]
  #[test]
  fn fs_reader_does_not_treat_symlinks_as_directories() -> std::io::Result<()> {
    let temp = tempdir()?;
    let lib = temp.path().join("lib");
    fs::create_dir_all(lib.join("real"))?;
    std::os::unix::fs::symlink(&lib, lib.join("loop"))?;

    let reader = FsResourceReader::new(temp.path());
    assert_eq!(reader.list_resources("/lib/"), vec!["loop", "real"]);
    assert!(reader.is_directory("/lib/real"));
    assert!(!reader.is_directory("/lib/loop"));
    Ok(())
  }
}
