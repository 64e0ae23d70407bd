//! Union overlay: several filesystems presented as one.
//!
//! Members are consulted in order. Single-entity lookups (`open`, `stat`,
//! `read_file`) stop at the first member whose answer is anything other
//! than NotFound, so earlier members shadow later ones. Listings (`read_dir`,
//! `glob`) and `sub` ask every member and fail if any member fails.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{FsError, FsResult};
use crate::path::{self, ROOT};
use crate::traits::{DirEntry, File, Filesystem, Metadata};

/// An ordered union of filesystems. The first member has the highest priority.
///
/// Listings and glob results keep member order. A name or path already
/// produced by an earlier member is shadowed, so later duplicates are dropped.
#[derive(Clone, Default)]
pub struct UnionFs {
    members: Vec<Arc<dyn Filesystem>>,
}

impl std::fmt::Debug for UnionFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnionFs")
            .field("members", &self.members.len())
            .finish()
    }
}

impl UnionFs {
    pub fn new(members: impl IntoIterator<Item = Arc<dyn Filesystem>>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }

    pub fn members(&self) -> &[Arc<dyn Filesystem>] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Return the first member answer that is not NotFound.
    async fn first_found<'a, T, F, Fut>(&'a self, op: &'static str, name: &str, f: F) -> FsResult<T>
    where
        F: Fn(&'a Arc<dyn Filesystem>) -> Fut,
        Fut: Future<Output = FsResult<T>>,
    {
        path::check(name)?;
        for (index, member) in self.members.iter().enumerate() {
            tracing::trace!(op, path = name, member = index, "union: consulting member");
            match f(member).await {
                Err(e) if e.is_not_found() => continue,
                result => {
                    tracing::debug!(op, path = name, member = index, ok = result.is_ok(), "union: resolved");
                    return result;
                }
            }
        }
        Err(FsError::not_found(name))
    }
}

#[async_trait]
impl Filesystem for UnionFs {
    async fn open(&self, name: &str) -> FsResult<Box<dyn File>> {
        self.first_found("open", name, |m| m.open(name)).await
    }

    fn sub(self: Arc<Self>, dir: &str) -> FsResult<Arc<dyn Filesystem>> {
        let dir = path::sub_dir(dir);
        path::check(dir)?;
        if dir == ROOT {
            return Ok(self);
        }
        let members = self
            .members
            .iter()
            .map(|member| member.clone().sub(dir))
            .collect::<FsResult<Vec<_>>>()?;
        tracing::debug!(dir, members = members.len(), "union: sub");
        Ok(Arc::new(UnionFs { members }))
    }

    async fn stat(&self, name: &str) -> FsResult<Metadata> {
        self.first_found("stat", name, |m| m.stat(name)).await
    }

    async fn read_dir(&self, name: &str) -> FsResult<Vec<DirEntry>> {
        path::check(name)?;
        let mut seen = HashSet::new();
        let mut listing = Vec::new();
        for (index, member) in self.members.iter().enumerate() {
            let entries = member.read_dir(name).await.inspect_err(|e| {
                tracing::warn!(path = name, member = index, error = %e, "union: listing aborted");
            })?;
            // Names already listed by an earlier member are shadowed
            listing.extend(entries.into_iter().filter(|e| seen.insert(e.name.clone())));
        }
        Ok(listing)
    }

    async fn read_file(&self, name: &str) -> FsResult<Vec<u8>> {
        self.first_found("read_file", name, |m| m.read_file(name)).await
    }

    async fn glob(&self, pattern: &str) -> FsResult<Vec<String>> {
        fsview_glob::Pattern::new(pattern)?;
        let mut seen = HashSet::new();
        let mut matches = Vec::new();
        for (index, member) in self.members.iter().enumerate() {
            let found = member.glob(pattern).await.inspect_err(|e| {
                tracing::warn!(pattern, member = index, error = %e, "union: glob aborted");
            })?;
            matches.extend(found.into_iter().filter(|m| seen.insert(m.clone())));
        }
        Ok(matches)
    }
}
