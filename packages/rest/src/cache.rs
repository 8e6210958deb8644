//! Content-addressed disk cache for GET response bodies.
//!
//! Entries are flat files named by the lowercase-hex SHA-1 of the
//! fully-qualified endpoint plus its parameter set, written in enumeration
//! order. There is no manifest and no expiry; file existence is the only
//! metadata, and `clear` is the only purge mechanism.

use std::fs;
use std::io;
use std::path::PathBuf;

use sha1::{Digest, Sha1};
use url::form_urlencoded;

use crate::request::Params;

/// How a GET request interacts with the local disk cache.
///
/// Consulted once per dispatched request; write/mutate methods never read or
/// write the cache regardless of the configured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Network only, nothing read or written.
    #[default]
    IgnoreCache,
    /// Deliver the cached result immediately if present, then the network
    /// result when it arrives. The success callback may fire twice.
    CacheThenNetwork,
    /// Network only, nothing read or written.
    NetworkOnly,
    /// Serve from cache on a hit; call the network (and cache the result)
    /// only on a miss.
    CacheElseNetwork,
    /// Refresh the cache from the network without delivering the result.
    UpdateCache,
}

impl CachePolicy {
    /// Whether dispatch starts with a cache lookup.
    pub(crate) fn reads_cache(self) -> bool {
        matches!(self, CachePolicy::CacheThenNetwork | CachePolicy::CacheElseNetwork)
    }

    /// Whether a 2xx network body is persisted.
    pub(crate) fn writes_cache(self) -> bool {
        matches!(
            self,
            CachePolicy::CacheThenNetwork | CachePolicy::CacheElseNetwork | CachePolicy::UpdateCache
        )
    }

    /// Whether a successful network result reaches the success callback.
    pub(crate) fn delivers_network_success(self) -> bool {
        self != CachePolicy::UpdateCache
    }
}

/// Flat-directory store keyed by request hash.
///
/// All operations are synchronous local-filesystem ones. `save` is
/// best-effort: an IO failure is logged and dropped, never surfaced, so
/// caching can never break the primary network path. Concurrent writers for
/// the same key are tolerated as last-writer-wins; entries are
/// content-addressed and idempotent.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Derive the cache key for an endpoint and its parameter set.
    ///
    /// The digest preimage is the endpoint string followed by one
    /// `name=value&` fragment per parameter, percent-encoded, in enumeration
    /// order. Parameter order is not canonicalized: logically-identical sets
    /// inserted in a different order hash to different keys.
    pub fn key_for(endpoint: &str, params: &Params) -> String {
        let mut preimage = String::from(endpoint);
        for (name, value) in params.iter() {
            preimage.extend(form_urlencoded::byte_serialize(name.as_bytes()));
            preimage.push('=');
            preimage.extend(form_urlencoded::byte_serialize(value.as_bytes()));
            preimage.push('&');
        }
        hex::encode(Sha1::digest(preimage.as_bytes()))
    }

    pub fn exists(&self, key: &str) -> bool {
        self.entry_path(key).is_file()
    }

    /// Read an entry's raw body. Missing or unreadable entries are misses.
    pub fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.entry_path(key)).ok()
    }

    /// Persist a raw body under `key`. IO failures are logged and dropped.
    pub fn save(&self, key: &str, body: &str) {
        if let Err(error) = self.try_save(key, body) {
            tracing::warn!(%key, %error, "dropping cache write");
        }
    }

    /// Delete every entry in the cache directory.
    pub fn clear(&self) -> io::Result<()> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(error) => return Err(error),
        };
        for entry in entries {
            let path = entry?.path();
            if path.is_file() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn try_save(&self, key: &str, body: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.entry_path(key), body)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_cache() -> (DiskCache, TempDir) {
        let temp_dir = TempDir::new().expect("create temp dir");
        let cache = DiskCache::new(temp_dir.path().to_path_buf());
        (cache, temp_dir)
    }

    #[test]
    fn key_is_lowercase_hex_sha1() {
        let key = DiskCache::key_for("https://example.com/api/apps/42", &Params::new());
        assert_eq!(key.len(), 40);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn key_is_deterministic() {
        let params = Params::new().with("message", "hi").with("email", "a@b.com");
        let first = DiskCache::key_for("https://example.com/submit", &params);
        let second = DiskCache::key_for("https://example.com/submit", &params);
        assert_eq!(first, second);
    }

    #[test]
    fn key_depends_on_parameter_order() {
        // Documented non-canonical property: identical contents inserted in a
        // different order produce a different key.
        let forward = Params::new().with("a", 1).with("b", 2);
        let reversed = Params::new().with("b", 2).with("a", 1);
        assert_ne!(
            DiskCache::key_for("https://example.com/x", &forward),
            DiskCache::key_for("https://example.com/x", &reversed)
        );
    }

    #[test]
    fn key_depends_on_endpoint() {
        let params = Params::new().with("a", 1);
        assert_ne!(
            DiskCache::key_for("https://example.com/x", &params),
            DiskCache::key_for("https://example.com/y", &params)
        );
    }

    #[test]
    fn save_then_get_roundtrips() {
        let (cache, _dir) = create_test_cache();
        cache.save("abc123", r#"{"status":"ok"}"#);
        assert!(cache.exists("abc123"));
        assert_eq!(cache.get("abc123").as_deref(), Some(r#"{"status":"ok"}"#));
    }

    #[test]
    fn get_missing_key_is_none() {
        let (cache, _dir) = create_test_cache();
        assert!(!cache.exists("missing"));
        assert!(cache.get("missing").is_none());
    }

    #[test]
    fn save_twice_is_last_writer_wins() {
        let (cache, _dir) = create_test_cache();
        cache.save("k", "first");
        cache.save("k", "second");
        assert_eq!(cache.get("k").as_deref(), Some("second"));
    }

    #[test]
    fn save_creates_cache_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("cache");
        let cache = DiskCache::new(nested.clone());
        cache.save("k", "body");
        assert!(nested.join("k").is_file());
    }

    #[test]
    fn save_failure_is_swallowed() {
        // Point the cache at a path whose parent is a regular file, so the
        // directory can never be created.
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        let cache = DiskCache::new(blocker.join("cache"));
        cache.save("k", "body");
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn clear_removes_all_entries() {
        let (cache, _dir) = create_test_cache();
        cache.save("one", "1");
        cache.save("two", "2");
        cache.clear().unwrap();
        assert!(!cache.exists("one"));
        assert!(!cache.exists("two"));
    }

    #[test]
    fn clear_on_missing_directory_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCache::new(temp_dir.path().join("never-created"));
        assert!(cache.clear().is_ok());
    }

    #[test]
    fn policy_decision_table() {
        use CachePolicy::*;
        assert!(!IgnoreCache.reads_cache() && !IgnoreCache.writes_cache());
        assert!(!NetworkOnly.reads_cache() && !NetworkOnly.writes_cache());
        assert!(CacheElseNetwork.reads_cache() && CacheElseNetwork.writes_cache());
        assert!(CacheThenNetwork.reads_cache() && CacheThenNetwork.writes_cache());
        assert!(!UpdateCache.reads_cache() && UpdateCache.writes_cache());
        assert!(!UpdateCache.delivers_network_success());
        assert!(NetworkOnly.delivers_network_success());
    }
}
