//! Prefix overlay: relocate a filesystem beneath a path prefix.
//!
//! With prefix `foo/bar`, a file at `baz` in the wrapped filesystem is
//! visible at `foo/bar/baz`. Every path falls in one of three territories:
//!
//! ```text
//! .            synthetic  (root, named `.`; lists `foo`)
//! foo          synthetic  (lists `bar`)
//! foo/bar      boundary   (opens/stats synthetically, lists the real root)
//! foo/bar/baz  real       (delegated as `baz`)
//! fo, foo/ba   outside    (not found)
//! ```
//!
//! Synthetic territory never touches the wrapped filesystem.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{FsError, FsResult};
use crate::path::{self, ROOT};
use crate::synthetic::{self, SyntheticDir};
use crate::traits::{DirEntry, File, Filesystem, Metadata};

/// Where an `open` or `stat` lands.
#[derive(Debug, PartialEq, Eq)]
enum Territory<'a> {
    /// Strictly above the prefix. The synthetic entry is called `name` and
    /// its only child is `next`. Below the root the two coincide.
    Ancestor { name: &'a str, next: &'a str },
    /// Exactly the prefix.
    Boundary,
    /// Inside the wrapped filesystem, prefix stripped.
    Real(&'a str),
}

/// A filesystem relocated beneath `prefix`.
///
/// The prefix is stored as given; requested paths are validated per call.
/// A prefix of `""` or `.` makes the overlay a pass-through.
#[derive(Clone)]
pub struct PrefixFs {
    fs: Arc<dyn Filesystem>,
    prefix: String,
}

impl std::fmt::Debug for PrefixFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefixFs")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl PrefixFs {
    /// Present `fs` beneath `prefix`. For example, with prefix `foo` a file
    /// `bar` in `fs` is available at `foo/bar`.
    pub fn new(fs: Arc<dyn Filesystem>, prefix: impl Into<String>) -> Self {
        Self {
            fs,
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The wrapped filesystem.
    pub fn inner(&self) -> &Arc<dyn Filesystem> {
        &self.fs
    }

    fn is_passthrough(&self) -> bool {
        self.prefix.is_empty() || self.prefix == ROOT
    }

    /// Territory split shared by `open` and `stat`.
    fn locate<'a>(&'a self, name: &'a str) -> FsResult<Territory<'a>> {
        if self.is_passthrough() {
            return Ok(Territory::Real(name));
        }
        if name == ROOT {
            return Ok(Territory::Ancestor {
                name: ROOT,
                next: path::first_segment(&self.prefix),
            });
        }
        if name.len() <= self.prefix.len() {
            let rest = path::trim_prefix(name, &self.prefix)
                .ok_or_else(|| FsError::not_found(name))?;
            return Ok(if rest.is_empty() {
                Territory::Boundary
            } else {
                let next = path::first_segment(rest);
                Territory::Ancestor { name: next, next }
            });
        }
        path::trim_prefix(&self.prefix, name)
            .map(Territory::Real)
            .ok_or_else(|| FsError::not_found(name))
    }

    /// Strip the prefix for operations with no synthetic answer. A fully
    /// consumed prefix becomes the root.
    fn strip<'a>(&self, name: &'a str) -> FsResult<&'a str> {
        if self.is_passthrough() {
            return Ok(name);
        }
        match path::trim_prefix(&self.prefix, name) {
            Some("") => Ok(ROOT),
            Some(rest) => Ok(rest),
            None => Err(FsError::not_found(name)),
        }
    }
}

#[async_trait]
impl Filesystem for PrefixFs {
    async fn open(&self, name: &str) -> FsResult<Box<dyn File>> {
        path::check(name)?;
        match self.locate(name)? {
            Territory::Ancestor { name: entry, next } => {
                tracing::debug!(path = name, prefix = %self.prefix, "open: synthetic ancestor");
                Ok(Box::new(SyntheticDir::with_child(entry, next)))
            }
            Territory::Boundary => {
                tracing::debug!(path = name, "open: prefix boundary");
                Ok(Box::new(SyntheticDir::backed_by(
                    path::base_name(&self.prefix),
                    self.fs.clone(),
                )))
            }
            Territory::Real(rest) => self.fs.open(rest).await,
        }
    }

    fn sub(self: Arc<Self>, dir: &str) -> FsResult<Arc<dyn Filesystem>> {
        let dir = path::sub_dir(dir);
        path::check(dir)?;
        if dir == ROOT {
            return Ok(self);
        }
        if self.is_passthrough() {
            return self.fs.clone().sub(dir);
        }

        if dir.len() < self.prefix.len() {
            // Narrow the view into the prefix itself
            let rest = path::trim_prefix(dir, &self.prefix)
                .ok_or_else(|| FsError::not_found(dir))?;
            tracing::debug!(dir, prefix = %self.prefix, remaining = rest, "sub: shorter prefix");
            return Ok(Arc::new(PrefixFs::new(self.fs.clone(), rest)));
        }

        match path::trim_prefix(&self.prefix, dir) {
            Some("") => Ok(self.fs.clone()),
            Some(rest) => self.fs.clone().sub(rest),
            None => Err(FsError::not_found(dir)),
        }
    }

    async fn stat(&self, name: &str) -> FsResult<Metadata> {
        path::check(name)?;
        match self.locate(name)? {
            Territory::Ancestor { name: entry, .. } => Ok(synthetic::dir_metadata(entry)),
            Territory::Boundary => Ok(synthetic::dir_metadata(path::base_name(&self.prefix))),
            Territory::Real(rest) => self.fs.stat(rest).await,
        }
    }

    async fn read_dir(&self, name: &str) -> FsResult<Vec<DirEntry>> {
        path::check(name)?;
        if self.is_passthrough() {
            return self.fs.read_dir(name).await;
        }
        if name == ROOT {
            return Ok(vec![DirEntry::directory(path::first_segment(&self.prefix))]);
        }
        if name.len() < self.prefix.len() {
            let rest = path::trim_prefix(name, &self.prefix)
                .ok_or_else(|| FsError::not_found(name))?;
            tracing::debug!(path = name, "read_dir: synthetic ancestor");
            return Ok(vec![DirEntry::directory(path::first_segment(rest))]);
        }
        let rest = self.strip(name)?;
        self.fs.read_dir(rest).await
    }

    async fn read_file(&self, name: &str) -> FsResult<Vec<u8>> {
        path::check(name)?;
        let rest = self.strip(name)?;
        self.fs.read_file(rest).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryFs;
    use rstest::rstest;

    fn overlay(prefix: &str) -> PrefixFs {
        let fs = MemoryFs::new().with_file("c/d", "data");
        PrefixFs::new(Arc::new(fs), prefix)
    }

    #[rstest]
    #[case::root(".", Territory::Ancestor { name: ".", next: "aa" })]
    #[case::first_segment("aa", Territory::Ancestor { name: "b", next: "b" })]
    #[case::boundary("aa/b", Territory::Boundary)]
    #[case::real("aa/b/c", Territory::Real("c"))]
    #[case::real_nested("aa/b/c/d", Territory::Real("c/d"))]
    fn territories(#[case] name: &str, #[case] expected: Territory<'static>) {
        let p = overlay("aa/b");
        assert_eq!(p.locate(name).unwrap(), expected);
    }

    #[rstest]
    #[case::partial_first("a")]
    #[case::unrelated("b")]
    #[case::partial_last("aa/bc")]
    #[case::sibling("aa/c")]
    #[case::unprefixed_real("c/d")]
    fn outside_is_not_found(#[case] name: &str) {
        let p = overlay("aa/b");
        assert!(p.locate(name).unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn passthrough_prefixes() {
        for prefix in ["", "."] {
            let p = overlay(prefix);
            assert_eq!(p.read_file("c/d").await.unwrap(), b"data");
            assert_eq!(p.read_dir(".").await.unwrap(), vec![DirEntry::directory("c")]);
        }
    }

    #[tokio::test]
    async fn synthetic_stat_names() {
        let p = overlay("aa/b");
        assert_eq!(p.stat("aa").await.unwrap().name, "b");
        assert_eq!(p.stat("aa/b").await.unwrap().name, "b");
        assert_eq!(p.stat("aa/b/c").await.unwrap().name, "c");
    }

    #[tokio::test]
    async fn root_is_named_dot_and_lists_first_segment() {
        let p = overlay("aa/b");
        assert_eq!(p.stat(".").await.unwrap().name, ".");

        let mut root = p.open(".").await.unwrap();
        assert_eq!(root.stat().await.unwrap().name, ".");
        assert_eq!(root.read_dir().await.unwrap(), vec![DirEntry::directory("aa")]);
    }

    #[tokio::test]
    async fn boundary_handle_lists_real_root() {
        let p = overlay("aa/b");
        let mut dir = p.open("aa/b").await.unwrap();
        assert_eq!(dir.read_dir().await.unwrap(), vec![DirEntry::directory("c")]);
    }

    #[tokio::test]
    async fn read_file_on_synthetic_is_not_found() {
        let p = overlay("aa/b");
        assert!(p.read_file("aa").await.unwrap_err().is_not_found());
        assert!(p.read_file(".").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn read_file_at_boundary_reaches_real_root() {
        let p = overlay("aa/b");
        let err = p.read_file("aa/b").await.unwrap_err();
        assert!(matches!(err, FsError::IsADirectory { .. }));
    }
}
