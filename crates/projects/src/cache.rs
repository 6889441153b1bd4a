//! TTL cache for worktree validity checks.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::RwLock,
    time::{Duration, Instant},
};

use tracing::debug;

use crate::paths::{is_path_under, normalize_path};

/// Upper bound on the TTL; longer values are clamped.
const MAX_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct CacheEntry {
    valid: bool,
    expires_at: Instant,
}

/// Caches whether a canonical worktree root is a genuine linked worktree.
///
/// Lookups take the read lock; inserts, invalidation and clearing take the
/// write lock, so an invalidation is visible to every later lookup.
pub struct ValidityCache {
    ttl: Duration,
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
}

impl ValidityCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: ttl.min(MAX_TTL),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cached validity for `root`, or `None` on a miss or expired entry.
    pub fn get(&self, root: &Path) -> Option<bool> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(root)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.valid)
    }

    pub fn insert(&self, root: PathBuf, valid: bool) {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(root, CacheEntry {
            valid,
            expires_at: now + self.ttl,
        });
    }

    /// Drop every entry whose key lies under `repo_path`. Returns how many
    /// entries were removed.
    pub fn invalidate_under(&self, repo_path: &Path) -> usize {
        let Ok(repo_path) = normalize_path(repo_path) else {
            return 0;
        };
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|key, _| !is_path_under(&repo_path, key).unwrap_or(false));
        let removed = before - entries.len();
        debug!(repo = %repo_path.display(), removed, "invalidated worktree cache");
        removed
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_then_expire() {
        let cache = ValidityCache::new(Duration::from_millis(30));
        let root = PathBuf::from("/w/acme/feature");
        assert_eq!(cache.get(&root), None);

        cache.insert(root.clone(), true);
        assert_eq!(cache.get(&root), Some(true));

        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(cache.get(&root), None);
    }

    #[test]
    fn zero_ttl_never_hits() {
        let cache = ValidityCache::new(Duration::ZERO);
        cache.insert(PathBuf::from("/w/a/b"), false);
        assert_eq!(cache.get(Path::new("/w/a/b")), None);
    }

    #[test]
    fn insert_evicts_expired_entries() {
        let cache = ValidityCache::new(Duration::from_millis(20));
        cache.insert(PathBuf::from("/w/a/one"), true);
        std::thread::sleep(Duration::from_millis(40));
        cache.insert(PathBuf::from("/w/a/two"), true);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_only_touches_repo_subtree() {
        let cache = ValidityCache::new(Duration::from_secs(60));
        cache.insert(PathBuf::from("/w/acme/one"), true);
        cache.insert(PathBuf::from("/w/acme/two"), false);
        cache.insert(PathBuf::from("/w/acme-tools/one"), true);
        cache.insert(PathBuf::from("/w/other/one"), true);

        assert_eq!(cache.invalidate_under(Path::new("/w/acme")), 2);
        assert_eq!(cache.get(Path::new("/w/acme/one")), None);
        assert_eq!(cache.get(Path::new("/w/acme-tools/one")), Some(true));
        assert_eq!(cache.get(Path::new("/w/other/one")), Some(true));
    }

    #[test]
    fn clear_empties_cache() {
        let cache = ValidityCache::new(Duration::from_secs(60));
        cache.insert(PathBuf::from("/w/a/b"), true);
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_readers_and_writers() {
        let cache = std::sync::Arc::new(ValidityCache::new(Duration::from_secs(60)));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = std::sync::Arc::clone(&cache);
                std::thread::spawn(move || {
                    let key = PathBuf::from(format!("/w/p/b{i}"));
                    cache.insert(key.clone(), i % 2 == 0);
                    assert_eq!(cache.get(&key), Some(i % 2 == 0));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 8);
    }
}
