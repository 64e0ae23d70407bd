//! Core filesystem traits and types.

use std::any::Any;
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;

use crate::error::{FsError, FsResult};
use crate::walk;

/// File mode bits: the directory flag plus Unix permission bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FileMode(u32);

impl FileMode {
    /// The directory type bit. Carries no permissions on its own.
    pub const DIR: FileMode = FileMode(1 << 31);

    /// Permission bits mask.
    pub const PERM: u32 = 0o777;

    pub const fn from_bits(bits: u32) -> Self {
        FileMode(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_dir(self) -> bool {
        self.0 & Self::DIR.0 != 0
    }

    /// Unix permission bits, e.g. `0o644`.
    pub const fn perm(self) -> u32 {
        self.0 & Self::PERM
    }
}

impl BitOr<u32> for FileMode {
    type Output = FileMode;

    fn bitor(self, rhs: u32) -> FileMode {
        FileMode(self.0 | rhs)
    }
}

impl fmt::Display for FileMode {
    /// `ls`-style rendering: `drwxr-xr-x`, `-rw-r--r--`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_dir() { 'd' } else { '-' };
        let mut s = String::with_capacity(10);
        s.push(kind);
        for shift in [6, 3, 0] {
            let bits = (self.perm() >> shift) & 0o7;
            s.push(if bits & 0o4 != 0 { 'r' } else { '-' });
            s.push(if bits & 0o2 != 0 { 'w' } else { '-' });
            s.push(if bits & 0o1 != 0 { 'x' } else { '-' });
        }
        f.write_str(&s)
    }
}

impl fmt::Debug for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileMode({self})")
    }
}

/// Opaque backend-specific payload attached to [`Metadata`].
pub type SysPayload = Arc<dyn Any + Send + Sync>;

/// Metadata for a file or directory, as returned by `stat`.
#[derive(Clone)]
pub struct Metadata {
    /// Base name of the entry (not a full path).
    pub name: String,
    /// Length in bytes for regular files; 0 for directories.
    pub size: u64,
    pub mode: FileMode,
    /// Last modification time. `None` is the zero time.
    pub modified: Option<SystemTime>,
    /// Underlying data source, if the backend exposes one.
    pub sys: Option<SysPayload>,
}

impl Metadata {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            mode: FileMode::from_bits(0o644),
            modified: None,
            sys: None,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: 0,
            mode: FileMode::DIR | 0o755,
            modified: None,
            sys: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.mode.is_dir()
    }

    pub fn is_file(&self) -> bool {
        !self.is_dir()
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metadata")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("mode", &self.mode)
            .field("modified", &self.modified)
            .field("sys", &self.sys.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Kind of directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirEntryKind {
    File,
    Directory,
}

/// An entry read from a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Name of the entry (not full path).
    pub name: String,
    pub kind: DirEntryKind,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DirEntryKind::File,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DirEntryKind::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == DirEntryKind::Directory
    }
}

impl From<&Metadata> for DirEntry {
    fn from(meta: &Metadata) -> Self {
        if meta.is_dir() {
            DirEntry::directory(meta.name.clone())
        } else {
            DirEntry::file(meta.name.clone())
        }
    }
}

/// An open file or directory.
#[async_trait]
pub trait File: Send + Sync {
    /// Metadata for the opened entry.
    async fn stat(&self) -> FsResult<Metadata>;

    /// Read up to `buf.len()` bytes. Returns 0 at end of file.
    async fn read(&mut self, buf: &mut [u8]) -> FsResult<usize>;

    /// List the remaining entries of an opened directory.
    ///
    /// Regular files report [`FsError::NotADirectory`].
    async fn read_dir(&mut self) -> FsResult<Vec<DirEntry>> {
        let meta = self.stat().await?;
        Err(FsError::NotADirectory { path: meta.name })
    }
}

/// Abstract read-only filesystem.
///
/// Paths are slash-separated and relative to the filesystem root; see
/// [`crate::path`] for the exact rules. Only [`open`](Filesystem::open) and
/// [`sub`](Filesystem::sub) are required: the other operations fall back
/// to generic implementations built on `open`, and backends override them
/// when they can answer more directly.
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Open a file or directory.
    async fn open(&self, path: &str) -> FsResult<Box<dyn File>>;

    /// A view of the subtree rooted at `dir`.
    ///
    /// Takes the receiver by `Arc` so views can share it. Backends with no
    /// native notion of a subtree return [`SubFs::wrap`](crate::SubFs::wrap).
    fn sub(self: Arc<Self>, dir: &str) -> FsResult<Arc<dyn Filesystem>>;

    /// Get metadata for a file or directory.
    async fn stat(&self, path: &str) -> FsResult<Metadata> {
        let file = self.open(path).await?;
        file.stat().await
    }

    /// List entries in a directory, sorted by name.
    async fn read_dir(&self, path: &str) -> FsResult<Vec<DirEntry>> {
        let mut dir = self.open(path).await?;
        let mut entries = dir.read_dir().await?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Read the entire contents of a file.
    async fn read_file(&self, path: &str) -> FsResult<Vec<u8>> {
        let mut file = self.open(path).await?;
        walk::read_to_end(file.as_mut()).await
    }

    /// Paths of all entries matching `pattern`.
    ///
    /// Malformed patterns fail with [`FsError::BadPattern`]; unreadable
    /// directories along the way are skipped.
    async fn glob(&self, pattern: &str) -> FsResult<Vec<String>> {
        walk::glob(self, pattern).await
    }

    /// Check if a path exists.
    async fn exists(&self, path: &str) -> bool {
        self.stat(path).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_mode_display() {
        assert_eq!(FileMode::DIR.to_string(), "d---------");
        assert_eq!((FileMode::DIR | 0o755).to_string(), "drwxr-xr-x");
        assert_eq!(FileMode::from_bits(0o644).to_string(), "-rw-r--r--");
    }

    #[test]
    fn directory_only_mode_has_no_permissions() {
        assert!(FileMode::DIR.is_dir());
        assert_eq!(FileMode::DIR.perm(), 0);
        assert!(!FileMode::from_bits(0o777).is_dir());
    }

    #[test]
    fn dir_entry_from_metadata() {
        let entry = DirEntry::from(&Metadata::directory("a"));
        assert_eq!(entry, DirEntry::directory("a"));
        let entry = DirEntry::from(&Metadata::file("f", 3));
        assert_eq!(entry, DirEntry::file("f"));
    }
}
