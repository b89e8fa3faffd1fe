// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};

pub mod mock;

/// Abstract filesystem interface.
///
/// Every stage goes through this trait so ordering and side effects can be
/// asserted against [`mock::MockFileSystem`] in tests.
pub trait FileSystem: Send + Sync + Debug {
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Write a file, creating parent directories as needed.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Remove a directory tree. A missing directory is not an error.
    fn remove_dir_all(&self, path: &Path) -> Result<()>;

    /// Copy a file, creating the destination's parent directories.
    fn copy(&self, from: &Path, to: &Path) -> Result<()>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("reading file {:?}", path))
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading file {:?}", path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        replace_file(path, |tmp| {
            let mut file = fs::File::create(tmp).with_context(|| format!("creating file {:?}", tmp))?;
            file.write_all(contents).with_context(|| format!("writing to file {:?}", tmp))
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).with_context(|| format!("creating dir {:?}", path))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing dir {:?}", path)),
        }
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        replace_file(to, |tmp| {
            fs::copy(from, tmp).with_context(|| format!("copying {:?} to {:?}", from, to))?;
            Ok(())
        })
    }
}

/// Produce `path` through a sibling temp file and a rename, so readers (the
/// dev server, a concurrent stage) see either the old file or the new one.
fn replace_file(path: &Path, fill: impl FnOnce(&Path) -> Result<()>) -> Result<()> {
    static NEXT: AtomicU64 = AtomicU64::new(0);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
    }

    let name = path
        .file_name()
        .with_context(|| format!("{:?} has no file name", path))?
        .to_string_lossy();
    let tmp = path.with_file_name(format!(
        ".{name}.{}-{}.tmp",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    ));

    let result = fill(&tmp).and_then(|()| {
        fs::rename(&tmp, path).with_context(|| format!("renaming {:?} to {:?}", tmp, path))
    });
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

/// Recursively collect every file below `root`, sorted by path.
///
/// A missing `root` yields an empty list.
pub fn walk_files(fs: &dyn FileSystem, root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !fs.is_dir(root) {
        return Ok(files);
    }

    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_writes_replace_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("site/index.html");
        let fs = RealFileSystem;

        fs.write(&target, b"<h1>one</h1>").unwrap();
        fs.write(&target, b"<h1>two</h1>").unwrap();
        let source = dir.path().join("page.html");
        std::fs::write(&source, "<h1>three</h1>").unwrap();
        fs.copy(&source, &target).unwrap();

        assert_eq!(fs.read_to_string(&target).unwrap(), "<h1>three</h1>");
        let names: Vec<PathBuf> = fs.read_dir(&dir.path().join("site")).unwrap();
        assert_eq!(names, vec![target]);
    }

    #[test]
    fn failed_copy_leaves_target_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("index.html");
        let fs = RealFileSystem;
        fs.write(&target, b"old").unwrap();

        assert!(fs.copy(&dir.path().join("missing.html"), &target).is_err());
        assert_eq!(fs.read(&target).unwrap(), b"old");
        assert_eq!(fs.read_dir(dir.path()).unwrap().len(), 1);
    }
}
