//! Generic subtree view for filesystems without a native `sub`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::FsResult;
use crate::path::{self, ROOT};
use crate::traits::{DirEntry, File, Filesystem, Metadata};

/// A view of `fs` rooted at `dir`.
///
/// Every call validates its path, joins it under `dir` and delegates.
/// Whether `dir` exists is only discovered by the first lookup.
pub struct SubFs {
    fs: Arc<dyn Filesystem>,
    dir: String,
}

impl SubFs {
    /// Restrict `fs` to `dir`. The root (`.` or `""`) returns `fs` itself.
    pub fn wrap(fs: Arc<dyn Filesystem>, dir: &str) -> FsResult<Arc<dyn Filesystem>> {
        let dir = path::sub_dir(dir);
        path::check(dir)?;
        if dir == ROOT {
            return Ok(fs);
        }
        Ok(Arc::new(SubFs {
            fs,
            dir: dir.to_string(),
        }))
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }

    fn full_name(&self, name: &str) -> FsResult<String> {
        path::check(name)?;
        Ok(path::join(&self.dir, name))
    }
}

#[async_trait]
impl Filesystem for SubFs {
    async fn open(&self, name: &str) -> FsResult<Box<dyn File>> {
        let full = self.full_name(name)?;
        self.fs.open(&full).await
    }

    fn sub(self: Arc<Self>, dir: &str) -> FsResult<Arc<dyn Filesystem>> {
        let dir = path::sub_dir(dir);
        path::check(dir)?;
        if dir == ROOT {
            return Ok(self);
        }
        SubFs::wrap(self.fs.clone(), &path::join(&self.dir, dir))
    }

    async fn stat(&self, name: &str) -> FsResult<Metadata> {
        let full = self.full_name(name)?;
        self.fs.stat(&full).await
    }

    async fn read_dir(&self, name: &str) -> FsResult<Vec<DirEntry>> {
        let full = self.full_name(name)?;
        self.fs.read_dir(&full).await
    }

    async fn read_file(&self, name: &str) -> FsResult<Vec<u8>> {
        let full = self.full_name(name)?;
        self.fs.read_file(&full).await
    }

    async fn glob(&self, pattern: &str) -> FsResult<Vec<String>> {
        fsview_glob::Pattern::new(pattern)?;
        let full = format!("{}/{}", escape_meta(&self.dir), pattern);
        let matches = self.fs.glob(&full).await?;
        Ok(matches
            .into_iter()
            .filter_map(|m| path::trim_prefix(&self.dir, &m).map(str::to_string))
            .filter(|m| !m.is_empty())
            .collect())
    }
}

/// Backslash-escape glob metacharacters so `dir` matches only itself.
fn escape_meta(dir: &str) -> String {
    let mut escaped = String::with_capacity(dir.len());
    for c in dir.chars() {
        if matches!(c, '*' | '?' | '[' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
