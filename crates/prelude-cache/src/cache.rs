//! Versioned JSON cache of materialised prelude specs.

use serde::{Deserialize, Serialize};
use shared_crypto::{sha256_file, sha256_hex};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// The only cache file schema version this store understands. Any other
/// value (or a missing/malformed file) is treated as "no cache".
pub const CACHE_VERSION: &str = "1.0.0";

/// One materialised spec recorded in the cache.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CachedSpec {
    pub name: String,
    pub uri: String,
    pub checksum: String,
    pub local_path: PathBuf,
}

/// One prelude's cache entry.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    pub checksum: String,
    pub downloaded_at: i64,
    pub specs: Vec<CachedSpec>,
}

/// The on-disk `.cache.json` document.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PreludeCacheFile {
    pub version: String,
    pub entries: HashMap<String, CacheEntry>,
}

impl PreludeCacheFile {
    /// An empty, current-version cache.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            version: CACHE_VERSION.to_string(),
            entries: HashMap::new(),
        }
    }
}

/// Age/identity summary of one cache entry, for [`CacheStore::stats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheAgeInfo {
    pub name: String,
    pub downloaded_at: i64,
    pub age_days: i64,
}

/// Aggregate cache statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_size: u64,
    pub oldest_entry: Option<CacheAgeInfo>,
    pub newest_entry: Option<CacheAgeInfo>,
}

/// Reads and writes `<preludes_dir>/.cache.json`.
pub struct CacheStore {
    preludes_dir: PathBuf,
}

impl CacheStore {
    /// Open (but do not yet read) the cache under `preludes_dir`.
    pub fn new(preludes_dir: impl Into<PathBuf>) -> Self {
        Self {
            preludes_dir: preludes_dir.into(),
        }
    }

    fn cache_path(&self) -> PathBuf {
        self.preludes_dir.join(".cache.json")
    }

    /// Load the cache. Never fails: a missing file, malformed JSON, or a
    /// version mismatch all silently yield an empty, current cache.
    #[must_use]
    pub fn load(&self) -> PreludeCacheFile {
        let Ok(contents) = std::fs::read_to_string(self.cache_path()) else {
            return PreludeCacheFile::empty();
        };
        match serde_json::from_str::<PreludeCacheFile>(&contents) {
            Ok(cache) if cache.version == CACHE_VERSION => cache,
            _ => PreludeCacheFile::empty(),
        }
    }

    /// Persist the cache atomically (write to a temp file, `fsync`, then
    /// rename over the target). Failures are logged and swallowed: the
    /// cache is an optimisation, never a correctness requirement.
    pub fn save(&self, cache: &PreludeCacheFile) {
        if let Err(e) = self.try_save(cache) {
            tracing::warn!(error = %e, "failed to persist prelude cache");
        }
    }

    fn try_save(&self, cache: &PreludeCacheFile) -> std::io::Result<()> {
        let path = self.cache_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(cache)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        {
            let mut file = std::fs::File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp_path, &path)
    }

    /// Merge-replace `name`'s cache entry. Any spec whose `checksum` isn't
    /// already set has it computed from `local_path` (empty string if the
    /// file is unreadable).
    pub fn update_prelude(&self, name: &str, version: Option<String>, specs: &[CachedSpec]) {
        let mut cache = self.load();

        let resolved_specs: Vec<CachedSpec> = specs
            .iter()
            .map(|spec| {
                if spec.checksum.is_empty() {
                    let checksum = sha256_file(&spec.local_path).unwrap_or_default();
                    CachedSpec {
                        checksum,
                        ..spec.clone()
                    }
                } else {
                    spec.clone()
                }
            })
            .collect();

        let digest_input = resolved_specs
            .iter()
            .map(|s| s.checksum.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let prelude_checksum = sha256_hex(digest_input.as_bytes());

        cache.entries.insert(
            name.to_string(),
            CacheEntry {
                name: name.to_string(),
                version,
                checksum: prelude_checksum,
                downloaded_at: now_epoch_ms(),
                specs: resolved_specs,
            },
        );

        self.save(&cache);
    }

    /// Whether `name` (and, if given, `version`) is fully cached: present,
    /// every spec's file exists, and (unless `skip_checksum`) every spec's
    /// recomputed checksum matches what's recorded.
    #[must_use]
    pub fn is_prelude_cached(&self, name: &str, version: Option<&str>, skip_checksum: bool) -> bool {
        let cache = self.load();
        let Some(entry) = cache.entries.get(name) else {
            return false;
        };
        if let Some(expected) = version {
            if entry.version.as_deref() != Some(expected) {
                return false;
            }
        }
        for spec in &entry.specs {
            if !spec.local_path.exists() {
                return false;
            }
            if !skip_checksum {
                match sha256_file(&spec.local_path) {
                    Ok(actual) if actual == spec.checksum => {}
                    _ => return false,
                }
            }
        }
        true
    }

    /// True iff any of `names` is not fully cached.
    #[must_use]
    pub fn should_download_preludes<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> bool {
        names
            .into_iter()
            .any(|name| !self.is_prelude_cached(name, None, false))
    }

    /// Reset the cache to empty.
    pub fn clear(&self) {
        self.save(&PreludeCacheFile::empty());
    }

    /// Remove one prelude's entry, leaving the rest of the cache intact.
    pub fn remove_prelude(&self, name: &str) {
        let mut cache = self.load();
        cache.entries.remove(name);
        self.save(&cache);
    }

    /// Aggregate statistics over the current cache.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let cache = self.load();
        let total_size = std::fs::metadata(self.cache_path())
            .map(|m| m.len())
            .unwrap_or(0);
        let now = now_epoch_ms();

        let mut entries: Vec<&CacheEntry> = cache.entries.values().collect();
        entries.sort_by_key(|e| e.downloaded_at);

        let oldest = entries.first().map(|e| age_info(e, now));
        let newest = entries.last().map(|e| age_info(e, now));

        CacheStats {
            total_entries: cache.entries.len(),
            total_size,
            oldest_entry: oldest,
            newest_entry: newest,
        }
    }
}

fn age_info(entry: &CacheEntry, now_ms: i64) -> CacheAgeInfo {
    const MS_PER_DAY: i64 = 1000 * 60 * 60 * 24;
    CacheAgeInfo {
        name: entry.name.clone(),
        downloaded_at: entry.downloaded_at,
        age_days: (now_ms - entry.downloaded_at).max(0) / MS_PER_DAY,
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_file(path: &Path, contents: &[u8]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(contents).unwrap();
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let cache = store.load();
        assert_eq!(cache.version, CACHE_VERSION);
        assert!(cache.entries.is_empty());
    }

    #[test]
    fn test_load_version_mismatch_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            &dir.path().join(".cache.json"),
            br#"{"version":"0.9.0","entries":{}}"#,
        );
        let store = CacheStore::new(dir.path());
        assert!(store.load().entries.is_empty());
    }

    #[test]
    fn test_load_malformed_json_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        write_file(&dir.path().join(".cache.json"), b"{ not json");
        let store = CacheStore::new(dir.path());
        assert_eq!(store.load().version, CACHE_VERSION);
    }

    #[test]
    fn test_update_then_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let spec_path = dir.path().join("coin").join("root").join("coin.pact");
        write_file(&spec_path, b"(module coin ...)");

        let store = CacheStore::new(dir.path());
        store.update_prelude(
            "coin",
            None,
            &[CachedSpec {
                name: "coin".into(),
                uri: "github:kadena-io/coin.pact".into(),
                checksum: String::new(),
                local_path: spec_path,
            }],
        );

        assert!(store.is_prelude_cached("coin", None, false));
    }

    #[test]
    fn test_tampered_file_invalidates_unless_checksum_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let spec_path = dir.path().join("coin").join("root").join("coin.pact");
        write_file(&spec_path, b"(module coin ...)");

        let store = CacheStore::new(dir.path());
        store.update_prelude(
            "coin",
            None,
            &[CachedSpec {
                name: "coin".into(),
                uri: "github:kadena-io/coin.pact".into(),
                checksum: String::new(),
                local_path: spec_path.clone(),
            }],
        );

        write_file(&spec_path, b"(module coin tampered)");

        assert!(!store.is_prelude_cached("coin", None, false));
        assert!(store.is_prelude_cached("coin", None, true));
    }

    #[test]
    fn test_clear_then_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let spec_path = dir.path().join("coin.pact");
        write_file(&spec_path, b"(module coin ...)");

        let store = CacheStore::new(dir.path());
        store.update_prelude(
            "coin",
            None,
            &[CachedSpec {
                name: "coin".into(),
                uri: "github:kadena-io/coin.pact".into(),
                checksum: String::new(),
                local_path: spec_path,
            }],
        );
        store.clear();

        assert!(!store.is_prelude_cached("coin", None, false));
    }

    #[test]
    fn test_missing_file_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        store.update_prelude(
            "coin",
            None,
            &[CachedSpec {
                name: "coin".into(),
                uri: "github:kadena-io/coin.pact".into(),
                checksum: "deadbeef".into(),
                local_path: dir.path().join("nonexistent.pact"),
            }],
        );
        assert!(!store.is_prelude_cached("coin", None, false));
    }

    #[test]
    fn test_remove_prelude_leaves_others() {
        let dir = tempfile::tempdir().unwrap();
        let a_path = dir.path().join("a.pact");
        let b_path = dir.path().join("b.pact");
        write_file(&a_path, b"a");
        write_file(&b_path, b"b");

        let store = CacheStore::new(dir.path());
        store.update_prelude(
            "a",
            None,
            &[CachedSpec {
                name: "a".into(),
                uri: "github:o/r/a.pact".into(),
                checksum: String::new(),
                local_path: a_path,
            }],
        );
        store.update_prelude(
            "b",
            None,
            &[CachedSpec {
                name: "b".into(),
                uri: "github:o/r/b.pact".into(),
                checksum: String::new(),
                local_path: b_path,
            }],
        );

        store.remove_prelude("a");

        assert!(!store.is_prelude_cached("a", None, false));
        assert!(store.is_prelude_cached("b", None, false));
    }

    #[test]
    fn test_stats_reports_entry_count_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let spec_path = dir.path().join("a.pact");
        write_file(&spec_path, b"a");

        let store = CacheStore::new(dir.path());
        store.update_prelude(
            "a",
            None,
            &[CachedSpec {
                name: "a".into(),
                uri: "github:o/r/a.pact".into(),
                checksum: String::new(),
                local_path: spec_path,
            }],
        );

        let stats = store.stats();
        assert_eq!(stats.total_entries, 1);
        assert!(stats.total_size > 0);
        assert!(stats.oldest_entry.is_some());
        assert_eq!(stats.oldest_entry, stats.newest_entry);
    }

    #[test]
    fn test_should_download_preludes_true_when_any_uncached() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        assert!(store.should_download_preludes(["coin", "marmalade"]));
    }
}
