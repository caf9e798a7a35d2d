use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Tracks what was last written to each declaration file and serializes
/// writers of the same file.
#[derive(Default)]
pub struct DeclarationCache {
    hashes: Mutex<HashMap<PathBuf, String>>,
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

/// Outcome of [`DeclarationCache::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Written,
    Unchanged,
}

impl DeclarationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compute_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(path.to_path_buf()).or_default().clone()
    }

    fn hashes(&self) -> MutexGuard<'_, HashMap<PathBuf, String>> {
        self.hashes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether `content` is what this cache last wrote to `path`.
    pub fn is_current(&self, path: &Path, content: &str) -> bool {
        let hash = Self::compute_hash(content);
        self.hashes().get(path).is_some_and(|h| *h == hash) && path.exists()
    }

    /// Write `content` to `path` through a sibling temp file and a rename, so
    /// readers never see a torn file. With `skip_unchanged`, content identical
    /// to the last write is not written again.
    pub fn write(&self, path: &Path, content: &str, skip_unchanged: bool) -> io::Result<WriteStatus> {
        let lock = self.lock_for(path);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if skip_unchanged && self.is_current(path, content) {
            return Ok(WriteStatus::Unchanged);
        }

        let tmp_path = temp_sibling(path);
        fs::write(&tmp_path, content)?;
        if let Err(e) = fs::rename(&tmp_path, path) {
            fs::remove_file(&tmp_path).ok();
            return Err(e);
        }

        self.hashes()
            .insert(path.to_path_buf(), Self::compute_hash(content));
        Ok(WriteStatus::Written)
    }

    /// Forget a path, e.g. after its style file was removed. The write lock
    /// goes too unless a writer still holds it.
    pub fn invalidate(&self, path: &Path) {
        self.hashes().remove(path);
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(path).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(path);
        }
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.{}.tmp", name, std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_unchanged_only_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.css.d.ts");
        let cache = DeclarationCache::new();

        assert_eq!(cache.write(&path, "x", true).unwrap(), WriteStatus::Written);
        assert_eq!(cache.write(&path, "x", true).unwrap(), WriteStatus::Unchanged);
        assert_eq!(cache.write(&path, "x", false).unwrap(), WriteStatus::Written);
        assert_eq!(cache.write(&path, "y", true).unwrap(), WriteStatus::Written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "y");
    }

    #[test]
    fn test_removed_file_is_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.css.d.ts");
        let cache = DeclarationCache::new();

        cache.write(&path, "x", true).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(cache.write(&path, "x", true).unwrap(), WriteStatus::Written);
    }

    #[test]
    fn test_invalidate_drops_idle_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.css.d.ts");
        let cache = DeclarationCache::new();

        cache.write(&path, "x", true).unwrap();
        assert_eq!(cache.locks.lock().unwrap().len(), 1);

        let held = cache.lock_for(&path);
        cache.invalidate(&path);
        assert_eq!(cache.locks.lock().unwrap().len(), 1);
        drop(held);

        cache.invalidate(&path);
        assert!(cache.locks.lock().unwrap().is_empty());
        assert!(!cache.is_current(&path, "x"));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.css.d.ts");
        DeclarationCache::new().write(&path, "x", false).unwrap();
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
