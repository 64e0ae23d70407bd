//! Synthetic directories: entries that exist only because a view says so.
//!
//! A synthetic directory has zero size, a directory-only mode, the zero
//! modification time and no payload. Reading it as a file succeeds with
//! zero bytes.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::FsResult;
use crate::path::ROOT;
use crate::traits::{DirEntry, File, FileMode, Filesystem, Metadata};

/// Metadata for a synthetic directory named `name`.
pub fn dir_metadata(name: impl Into<String>) -> Metadata {
    Metadata {
        name: name.into(),
        size: 0,
        mode: FileMode::DIR,
        modified: None,
        sys: None,
    }
}

enum Listing {
    /// The directory holds exactly one subdirectory.
    Child(String),
    /// The directory stands in for the root of a real filesystem.
    Backed(Arc<dyn Filesystem>),
    Consumed,
}

/// Open handle on a synthetic directory.
pub struct SyntheticDir {
    name: String,
    listing: Listing,
}

impl SyntheticDir {
    /// A directory whose single entry is the subdirectory `child`.
    pub fn with_child(name: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            listing: Listing::Child(child.into()),
        }
    }

    /// A directory whose entries are those of `fs`'s root.
    pub fn backed_by(name: impl Into<String>, fs: Arc<dyn Filesystem>) -> Self {
        Self {
            name: name.into(),
            listing: Listing::Backed(fs),
        }
    }
}

#[async_trait]
impl File for SyntheticDir {
    async fn stat(&self) -> FsResult<Metadata> {
        Ok(dir_metadata(self.name.clone()))
    }

    async fn read(&mut self, _buf: &mut [u8]) -> FsResult<usize> {
        Ok(0)
    }

    async fn read_dir(&mut self) -> FsResult<Vec<DirEntry>> {
        match std::mem::replace(&mut self.listing, Listing::Consumed) {
            Listing::Child(child) => Ok(vec![DirEntry::directory(child)]),
            Listing::Backed(fs) => fs.read_dir(ROOT).await,
            Listing::Consumed => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryFs;

    #[tokio::test]
    async fn synthetic_metadata_is_bare() {
        let meta = dir_metadata("b");
        assert_eq!(meta.name, "b");
        assert!(meta.is_dir());
        assert_eq!(meta.size, 0);
        assert_eq!(meta.mode, FileMode::DIR);
        assert!(meta.modified.is_none());
        assert!(meta.sys.is_none());
    }

    #[tokio::test]
    async fn reading_a_synthetic_dir_yields_nothing() {
        let mut dir = SyntheticDir::with_child("a", "b");
        let mut buf = [0u8; 16];
        assert_eq!(dir.read(&mut buf).await.unwrap(), 0);
        assert_eq!(dir.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn listing_is_drained_once() {
        let mut dir = SyntheticDir::with_child("a", "b");
        assert_eq!(dir.read_dir().await.unwrap(), vec![DirEntry::directory("b")]);
        assert!(dir.read_dir().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn backed_listing_reads_the_real_root() {
        let fs: Arc<dyn Filesystem> = Arc::new(MemoryFs::new().with_file("c/d", "data"));
        let mut dir = SyntheticDir::backed_by("b", fs);
        assert_eq!(dir.stat().await.unwrap().name, "b");
        assert_eq!(dir.read_dir().await.unwrap(), vec![DirEntry::directory("c")]);
    }
}
