//! Local filesystem backend.
//!
//! Read-only access to a directory on the host. Every path is resolved
//! relative to the root and must stay beneath it after symlinks are
//! followed.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncReadExt;

use crate::error::{FsError, FsResult};
use crate::path::{self, ROOT};
use crate::sub::SubFs;
use crate::traits::{DirEntry, File, FileMode, Filesystem, Metadata};

/// Local filesystem backend.
///
/// All operations are relative to `root`. For example, if `root` is
/// `/srv/site`, then `read_file("css/main.css")` reads
/// `/srv/site/css/main.css`. Stat results carry the host
/// [`std::fs::Metadata`] as their payload.
#[derive(Debug, Clone)]
pub struct LocalFs {
    root: PathBuf,
}

impl LocalFs {
    /// Create a local filesystem rooted at the given directory.
    ///
    /// The root is not checked here; a missing root makes every lookup
    /// report NotFound.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a validated path to a canonical host path within the root.
    async fn resolve(&self, name: &str) -> FsResult<PathBuf> {
        path::check(name)?;
        let full = if name == ROOT {
            self.root.clone()
        } else {
            self.root.join(name)
        };

        let canonical = fs::canonicalize(&full)
            .await
            .map_err(|e| host_error(name, e))?;

        // Verify a symlink hasn't taken us out of the root
        let canonical_root = fs::canonicalize(&self.root)
            .await
            .unwrap_or_else(|_| self.root.clone());
        if !canonical.starts_with(&canonical_root) {
            tracing::warn!(path = name, root = %self.root.display(), "path escapes root");
            return Err(FsError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!(
                    "path escapes root: {} is not under {}",
                    canonical.display(),
                    canonical_root.display()
                ),
            )));
        }

        Ok(canonical)
    }

    /// Extract permissions from std::fs::Metadata (unix only).
    #[cfg(unix)]
    fn extract_permissions(meta: &std::fs::Metadata) -> Option<u32> {
        use std::os::unix::fs::PermissionsExt;
        Some(meta.permissions().mode())
    }

    #[cfg(not(unix))]
    fn extract_permissions(_meta: &std::fs::Metadata) -> Option<u32> {
        None
    }

    fn metadata(name: &str, meta: std::fs::Metadata) -> Metadata {
        let is_dir = meta.is_dir();
        let default_perm = if is_dir { 0o755 } else { 0o644 };
        let perm = Self::extract_permissions(&meta).unwrap_or(default_perm) & FileMode::PERM;
        Metadata {
            name: path::base_name(name).to_string(),
            size: if is_dir { 0 } else { meta.len() },
            mode: if is_dir {
                FileMode::DIR | perm
            } else {
                FileMode::from_bits(perm)
            },
            modified: meta.modified().ok(),
            sys: Some(Arc::new(meta)),
        }
    }
}

/// Missing host files become [`FsError::NotFound`] under the requested name.
fn host_error(name: &str, e: io::Error) -> FsError {
    if e.kind() == io::ErrorKind::NotFound {
        FsError::not_found(name)
    } else {
        FsError::Io(e)
    }
}

/// List a host directory, sorted by name. Symlinks are classified by target.
async fn list(name: &str, dir: &Path) -> FsResult<Vec<DirEntry>> {
    let mut entries = Vec::new();
    let mut reader = fs::read_dir(dir).await.map_err(|e| host_error(name, e))?;

    while let Some(entry) = reader.next_entry().await? {
        let entry_name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = match fs::metadata(entry.path()).await {
            Ok(meta) => meta.is_dir(),
            Err(_) => false,
        };
        entries.push(if is_dir {
            DirEntry::directory(entry_name)
        } else {
            DirEntry::file(entry_name)
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

#[async_trait]
impl Filesystem for LocalFs {
    async fn open(&self, name: &str) -> FsResult<Box<dyn File>> {
        let full = self.resolve(name).await?;
        let host_meta = fs::metadata(&full).await.map_err(|e| host_error(name, e))?;
        let meta = Self::metadata(name, host_meta);

        if meta.is_dir() {
            return Ok(Box::new(LocalDir {
                meta,
                path: full,
                listed: false,
            }));
        }
        let file = fs::File::open(&full).await.map_err(|e| host_error(name, e))?;
        Ok(Box::new(LocalFile { meta, file }))
    }

    fn sub(self: Arc<Self>, dir: &str) -> FsResult<Arc<dyn Filesystem>> {
        SubFs::wrap(self, dir)
    }

    async fn stat(&self, name: &str) -> FsResult<Metadata> {
        let full = self.resolve(name).await?;
        let meta = fs::metadata(&full).await.map_err(|e| host_error(name, e))?;
        Ok(Self::metadata(name, meta))
    }

    async fn read_dir(&self, name: &str) -> FsResult<Vec<DirEntry>> {
        let full = self.resolve(name).await?;
        if !fs::metadata(&full).await?.is_dir() {
            return Err(FsError::NotADirectory {
                path: name.to_string(),
            });
        }
        list(name, &full).await
    }

    async fn read_file(&self, name: &str) -> FsResult<Vec<u8>> {
        let full = self.resolve(name).await?;
        if fs::metadata(&full).await?.is_dir() {
            return Err(FsError::IsADirectory {
                path: name.to_string(),
            });
        }
        fs::read(&full).await.map_err(|e| host_error(name, e))
    }
}

struct LocalFile {
    meta: Metadata,
    file: fs::File,
}

#[async_trait]
impl File for LocalFile {
    async fn stat(&self) -> FsResult<Metadata> {
        Ok(self.meta.clone())
    }

    async fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        Ok(self.file.read(buf).await?)
    }
}

struct LocalDir {
    meta: Metadata,
    path: PathBuf,
    listed: bool,
}

#[async_trait]
impl File for LocalDir {
    async fn stat(&self) -> FsResult<Metadata> {
        Ok(self.meta.clone())
    }

    async fn read(&mut self, _buf: &mut [u8]) -> FsResult<usize> {
        Err(FsError::IsADirectory {
            path: self.meta.name.clone(),
        })
    }

    async fn read_dir(&mut self) -> FsResult<Vec<DirEntry>> {
        if self.listed {
            return Ok(Vec::new());
        }
        self.listed = true;
        list(&self.meta.name, &self.path).await
    }
}
