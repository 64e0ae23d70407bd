//! In-memory filesystem implementation.
//!
//! Used for tests and for views declared in configuration. Contents are
//! fixed once built; directories are implied by the files beneath them.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;

use crate::error::{FsError, FsResult};
use crate::path::{self, ROOT};
use crate::sub::SubFs;
use crate::traits::{DirEntry, File, FileMode, Filesystem, Metadata};

/// A file stored in a [`MemoryFs`].
#[derive(Debug, Clone)]
pub struct MemoryFile {
    pub data: Arc<[u8]>,
    pub mode: FileMode,
    pub modified: Option<SystemTime>,
}

impl MemoryFile {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Arc::from(data.into()),
            mode: FileMode::from_bits(0o644),
            modified: None,
        }
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = FileMode::from_bits(mode & FileMode::PERM);
        self
    }

    pub fn with_modified(mut self, modified: SystemTime) -> Self {
        self.modified = Some(modified);
        self
    }
}

/// Entry in the memory filesystem.
#[derive(Debug, Clone)]
enum Entry {
    File(MemoryFile),
    Directory,
}

/// Read-only in-memory filesystem.
///
/// Keys are well-formed paths. A directory exists if it was added
/// explicitly or if any file lies beneath it; the root always exists.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    entries: BTreeMap<String, Entry>,
}

impl MemoryFs {
    /// Create a new empty in-memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with default mode `0o644`.
    pub fn with_file(self, path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.with_entry(path, MemoryFile::new(data))
    }

    /// Add a file with explicit metadata.
    pub fn with_entry(mut self, path: impl Into<String>, file: MemoryFile) -> Self {
        self.entries.insert(path.into(), Entry::File(file));
        self
    }

    /// Add an (empty) directory.
    pub fn with_dir(mut self, path: impl Into<String>) -> Self {
        self.entries.insert(path.into(), Entry::Directory);
        self
    }

    /// Number of explicit entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, name: &str) -> FsResult<Entry> {
        path::check(name)?;
        if name == ROOT {
            return Ok(Entry::Directory);
        }
        if let Some(entry) = self.entries.get(name) {
            return Ok(entry.clone());
        }
        let dir_prefix = format!("{name}/");
        if self
            .entries
            .range(dir_prefix.clone()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(&dir_prefix))
        {
            return Ok(Entry::Directory);
        }
        Err(FsError::not_found(name))
    }

    /// Direct children of a directory, sorted by name.
    fn children(&self, name: &str) -> Vec<DirEntry> {
        let dir_prefix = if name == ROOT {
            String::new()
        } else {
            format!("{name}/")
        };

        let mut children: BTreeMap<&str, DirEntry> = BTreeMap::new();
        for (key, entry) in self.entries.range(dir_prefix.clone()..) {
            let Some(rest) = key.strip_prefix(&dir_prefix) else {
                break;
            };
            if rest.is_empty() {
                continue;
            }
            let child = path::first_segment(rest);
            let entry = match entry {
                Entry::File(_) if child.len() == rest.len() => DirEntry::file(child),
                _ => DirEntry::directory(child),
            };
            children.entry(child).or_insert(entry);
        }
        children.into_values().collect()
    }

    fn metadata(name: &str, entry: &Entry) -> Metadata {
        let base = path::base_name(name);
        match entry {
            Entry::File(file) => Metadata {
                name: base.to_string(),
                size: file.data.len() as u64,
                mode: file.mode,
                modified: file.modified,
                sys: None,
            },
            Entry::Directory => Metadata::directory(base),
        }
    }
}

#[async_trait]
impl Filesystem for MemoryFs {
    async fn open(&self, name: &str) -> FsResult<Box<dyn File>> {
        let entry = self.lookup(name)?;
        let meta = Self::metadata(name, &entry);
        Ok(match entry {
            Entry::File(file) => Box::new(OpenFile {
                meta,
                data: file.data,
                offset: 0,
            }),
            Entry::Directory => Box::new(OpenDir {
                meta,
                entries: Some(self.children(name)),
            }),
        })
    }

    fn sub(self: Arc<Self>, dir: &str) -> FsResult<Arc<dyn Filesystem>> {
        SubFs::wrap(self, dir)
    }

    async fn stat(&self, name: &str) -> FsResult<Metadata> {
        let entry = self.lookup(name)?;
        Ok(Self::metadata(name, &entry))
    }

    async fn read_dir(&self, name: &str) -> FsResult<Vec<DirEntry>> {
        match self.lookup(name)? {
            Entry::Directory => Ok(self.children(name)),
            Entry::File(_) => Err(FsError::NotADirectory {
                path: name.to_string(),
            }),
        }
    }

    async fn read_file(&self, name: &str) -> FsResult<Vec<u8>> {
        match self.lookup(name)? {
            Entry::File(file) => Ok(file.data.to_vec()),
            Entry::Directory => Err(FsError::IsADirectory {
                path: name.to_string(),
            }),
        }
    }
}

struct OpenFile {
    meta: Metadata,
    data: Arc<[u8]>,
    offset: usize,
}

#[async_trait]
impl File for OpenFile {
    async fn stat(&self) -> FsResult<Metadata> {
        Ok(self.meta.clone())
    }

    async fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        let remaining = &self.data[self.offset..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.offset += n;
        Ok(n)
    }
}

struct OpenDir {
    meta: Metadata,
    entries: Option<Vec<DirEntry>>,
}

#[async_trait]
impl File for OpenDir {
    async fn stat(&self) -> FsResult<Metadata> {
        Ok(self.meta.clone())
    }

    async fn read(&mut self, _buf: &mut [u8]) -> FsResult<usize> {
        Err(FsError::IsADirectory {
            path: self.meta.name.clone(),
        })
    }

    async fn read_dir(&mut self) -> FsResult<Vec<DirEntry>> {
        Ok(self.entries.take().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_file() {
        let fs = MemoryFs::new().with_file("test.txt", "hello world");
        let data = fs.read_file("test.txt").await.unwrap();
        assert_eq!(data, b"hello world");
    }

    #[tokio::test]
    async fn test_read_not_found() {
        let fs = MemoryFs::new();
        let err = fs.read_file("nonexistent.txt").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_implied_directories() {
        let fs = MemoryFs::new().with_file("a/b/c/file.txt", "nested");

        for dir in ["a", "a/b", "a/b/c"] {
            let meta = fs.stat(dir).await.unwrap();
            assert!(meta.is_dir(), "{dir} should be a directory");
        }

        let data = fs.read_file("a/b/c/file.txt").await.unwrap();
        assert_eq!(data, b"nested");
    }

    #[tokio::test]
    async fn test_sibling_prefix_is_not_a_directory() {
        let fs = MemoryFs::new().with_file("ab/c", "x");
        assert!(fs.stat("a").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_directory() {
        let fs = MemoryFs::new()
            .with_file("b.txt", "b")
            .with_file("a.txt", "a")
            .with_dir("subdir")
            .with_file("nested/x", "x");

        let entries = fs.read_dir(".").await.unwrap();
        assert_eq!(
            entries,
            vec![
                DirEntry::file("a.txt"),
                DirEntry::file("b.txt"),
                DirEntry::directory("nested"),
                DirEntry::directory("subdir"),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_file_fails() {
        let fs = MemoryFs::new().with_file("f", "x");
        let err = fs.read_dir("f").await.unwrap_err();
        assert!(matches!(err, FsError::NotADirectory { .. }));
    }

    #[tokio::test]
    async fn test_read_directory_fails() {
        let fs = MemoryFs::new().with_file("d/f", "x");
        let err = fs.read_file("d").await.unwrap_err();
        assert!(matches!(err, FsError::IsADirectory { .. }));
    }

    #[tokio::test]
    async fn test_open_file_and_dir() {
        let fs = MemoryFs::new().with_file("d/f", "xyz");

        let file = fs.open("d/f").await.unwrap();
        let meta = file.stat().await.unwrap();
        assert_eq!(meta.name, "f");
        assert_eq!(meta.size, 3);
        assert!(!meta.is_dir());

        let mut dir = fs.open("d").await.unwrap();
        assert!(dir.stat().await.unwrap().is_dir());
        assert_eq!(dir.read_dir().await.unwrap(), vec![DirEntry::file("f")]);
    }

    #[tokio::test]
    async fn test_file_metadata() {
        let when = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000);
        let fs = MemoryFs::new().with_entry(
            "bin/run",
            MemoryFile::new("#!").with_mode(0o755).with_modified(when),
        );
        let meta = fs.stat("bin/run").await.unwrap();
        assert_eq!(meta.mode.perm(), 0o755);
        assert_eq!(meta.modified, Some(when));
    }

    #[tokio::test]
    async fn test_invalid_path() {
        let fs = MemoryFs::new().with_file("a", "x");
        let err = fs.stat("/a").await.unwrap_err();
        assert!(err.is_invalid_path());
    }

    #[tokio::test]
    async fn test_root_always_exists() {
        let fs = MemoryFs::new();
        assert!(fs.stat(".").await.unwrap().is_dir());
        assert!(fs.read_dir(".").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exists() {
        let fs = MemoryFs::new().with_file("yes.txt", "here");
        assert!(!fs.exists("nope.txt").await);
        assert!(fs.exists("yes.txt").await);
    }
}
