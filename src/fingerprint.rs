//! Content fingerprints backing the cache-busting URL of each bundle version.

use dashmap::DashMap;
use parking_lot::RwLock;

/// Primary content hash plus optional per-variant hashes of one bundle.
///
/// Variant hashes live in a sharded concurrent map, so parallel build workers setting
/// different variants never contend on a single lock.
#[derive(Debug, Default)]
pub struct FingerprintStore {
  primary: RwLock<Option<String>>,
  variants: DashMap<String, String>,
}

impl FingerprintStore {
  /// Create a store with no fingerprint set.
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a hash; `None` (or an empty key) targets the primary hash.
  ///
  /// Setting the same key again overwrites the previous hash.
  pub fn set(&self, variant_key: Option<&str>, hash: impl Into<String>) {
    match variant_key.filter(|key| !key.is_empty()) {
      Some(key) => {
        self.variants.insert(key.to_string(), hash.into());
      }
      None => *self.primary.write() = Some(hash.into()),
    }
  }

  /// The hash stored for a key; `None` targets the primary hash.
  ///
  /// A missing primary hash means the bundle has not been built yet.
  pub fn get(&self, variant_key: Option<&str>) -> Option<String> {
    match variant_key.filter(|key| !key.is_empty()) {
      Some(key) => self.variants.get(key).map(|entry| entry.value().clone()),
      None => self.primary.read().clone(),
    }
  }

  /// Returns `true` once the primary hash is set.
  pub fn is_ready(&self) -> bool {
    self.primary.read().is_some()
  }

  /// URL prefix for an already selected variant key.
  ///
  /// Returns `None` when the primary hash is missing. A variant key without a stored hash falls
  /// back to the primary prefix.
  pub fn url_prefix(&self, variant_key: Option<&str>) -> Option<String> {
    let primary = self.primary.read().clone()?;
    let variant = variant_key
      .filter(|key| !key.is_empty())
      .and_then(|key| self.variants.get(key).map(|hash| format!("{}.{key}/", hash.value())));
    Some(variant.unwrap_or_else(|| format!("{primary}/")))
  }

  /// All stored variant hashes, sorted by key.
  pub fn variant_entries(&self) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = self
      .variants
      .iter()
      .map(|entry| (entry.key().clone(), entry.value().clone()))
      .collect();
    entries.sort();
    entries
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn primary_hash_is_absent_until_set() {
    let store = FingerprintStore::new();
    assert!(!store.is_ready());
    assert_eq!(store.get(None), None);
    assert_eq!(store.url_prefix(None), None);
    assert_eq!(store.url_prefix(Some("fr")), None);

    store.set(None, "abc123");
    assert!(store.is_ready());
    assert_eq!(store.get(Some("")).as_deref(), Some("abc123"));
    assert_eq!(store.url_prefix(None).as_deref(), Some("abc123/"));
  }

  #[test]
  fn variant_prefix_requires_a_stored_variant_hash() {
    let store = FingerprintStore::new();
    store.set(None, "abc123");
    store.set(Some("fr"), "f00d");

    assert_eq!(store.url_prefix(Some("fr")).as_deref(), Some("f00d.fr/"));
    assert_eq!(store.url_prefix(Some("de")).as_deref(), Some("abc123/"));
  }

  #[test]
  fn later_sets_overwrite_earlier_ones() {
    let store = FingerprintStore::new();
    store.set(None, "one");
    store.set(None, "two");
    store.set(Some("en"), "a");
    store.set(Some("en"), "b");
    assert_eq!(store.get(None).as_deref(), Some("two"));
    assert_eq!(store.get(Some("en")).as_deref(), Some("b"));
  }

  #[test]
  fn concurrent_variant_writers_do_not_lose_entries() {
    let store = FingerprintStore::new();
    std::thread::scope(|scope| {
      for (key, hash) in [("fr", "hash-fr"), ("en", "hash-en")] {
        let store = &store;
        scope.spawn(move || {
          for _ in 0..100 {
            store.set(Some(key), hash);
          }
        });
      }
    });

    assert_eq!(store.get(Some("fr")).as_deref(), Some("hash-fr"));
    assert_eq!(store.get(Some("en")).as_deref(), Some("hash-en"));
    assert_eq!(store.variant_entries(), vec![
      ("en".to_string(), "hash-en".to_string()),
      ("fr".to_string(), "hash-fr".to_string()),
    ]);
  }
}
