// src/compile/image_cache.rs

use std::path::{Path, PathBuf};

use anyhow::Result;
use blake3::Hasher;
use tracing::{debug, warn};

use crate::fs::FileSystem;

/// Subdirectory of the cache directory holding optimized image blobs.
pub const IMAGE_CACHE_DIR: &str = "images";

/// Hex blake3 digest of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}

/// Content-addressed store of optimized images, keyed by the hash of the
/// unoptimized input.
///
/// Lives under the cache directory, which CleanStage never touches, so it
/// survives across runs. An unreadable entry counts as a miss.
#[derive(Debug, Clone)]
pub struct ImageCache {
    dir: PathBuf,
}

impl ImageCache {
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            dir: cache_dir.join(IMAGE_CACHE_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, hash: &str) -> PathBuf {
        self.dir.join(hash)
    }

    pub fn get(&self, fs: &dyn FileSystem, hash: &str) -> Option<Vec<u8>> {
        let path = self.blob_path(hash);
        if !fs.is_file(&path) {
            return None;
        }
        match fs.read(&path) {
            Ok(bytes) => {
                debug!(hash = %hash, "image cache hit");
                Some(bytes)
            }
            Err(err) => {
                warn!(hash = %hash, error = %err, "unreadable image cache entry; treating as miss");
                None
            }
        }
    }

    pub fn put(&self, fs: &dyn FileSystem, hash: &str, bytes: &[u8]) -> Result<()> {
        fs.write(&self.blob_path(hash), bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn hash_depends_only_on_content() {
        assert_eq!(content_hash(b"abc"), content_hash(b"abc"));
        assert_ne!(content_hash(b"abc"), content_hash(b"abd"));
    }

    #[test]
    fn put_then_get() {
        let fs = MockFileSystem::new();
        let cache = ImageCache::new(Path::new(".assetpipe"));
        let hash = content_hash(b"raw");

        assert!(cache.get(&fs, &hash).is_none());
        cache.put(&fs, &hash, b"optimized").unwrap();
        assert_eq!(cache.get(&fs, &hash).as_deref(), Some(&b"optimized"[..]));
    }
}
