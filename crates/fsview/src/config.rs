//! Declarative view configuration.
//!
//! A [`ViewSpec`] describes a stack of views as JSON and builds it:
//!
//! ```json
//! {
//!   "type": "union",
//!   "members": [
//!     { "type": "prefix", "prefix": "static", "inner": { "type": "local", "root": "./public" } },
//!     { "type": "memory", "files": { "static/robots.txt": "User-agent: *" } }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{FsError, FsResult};
use crate::local::LocalFs;
use crate::memory::MemoryFs;
use crate::path::{self, ROOT};
use crate::prefix::PrefixFs;
use crate::traits::Filesystem;
use crate::union::UnionFs;

/// One layer of a view stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewSpec {
    /// Fixed in-memory files, keyed by path.
    Memory {
        #[serde(default)]
        files: BTreeMap<String, String>,
    },
    /// A directory on the host.
    Local { root: PathBuf },
    /// `inner` relocated beneath `prefix`.
    Prefix { prefix: String, inner: Box<ViewSpec> },
    /// Members in priority order.
    Union { members: Vec<ViewSpec> },
    /// The subtree of `inner` at `dir`.
    Sub { dir: String, inner: Box<ViewSpec> },
}

impl ViewSpec {
    /// Parse a view stack from JSON.
    pub fn from_json(json: &str) -> FsResult<Self> {
        serde_json::from_str(json).map_err(|e| FsError::Config(e.to_string()))
    }

    pub fn to_json(&self) -> FsResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| FsError::Config(e.to_string()))
    }

    /// Build the described filesystem.
    ///
    /// Paths are validated up front so a bad stack fails here rather than
    /// on first use.
    pub fn build(&self) -> FsResult<Arc<dyn Filesystem>> {
        match self {
            ViewSpec::Memory { files } => {
                let mut fs = MemoryFs::new();
                for (name, data) in files {
                    if name == ROOT || !path::valid_path(name) {
                        return Err(FsError::Config(format!("memory file path {name:?} is not valid")));
                    }
                    fs = fs.with_file(name.clone(), data.as_bytes());
                }
                Ok(Arc::new(fs))
            }
            ViewSpec::Local { root } => {
                if root.as_os_str().is_empty() {
                    return Err(FsError::Config("local root is empty".to_string()));
                }
                Ok(Arc::new(LocalFs::new(root.clone())))
            }
            ViewSpec::Prefix { prefix, inner } => {
                if !prefix.is_empty() && !path::valid_path(prefix) {
                    return Err(FsError::Config(format!("prefix {prefix:?} is not valid")));
                }
                Ok(Arc::new(PrefixFs::new(inner.build()?, prefix.clone())))
            }
            ViewSpec::Union { members } => {
                let members = members
                    .iter()
                    .map(ViewSpec::build)
                    .collect::<FsResult<Vec<_>>>()?;
                Ok(Arc::new(UnionFs::new(members)))
            }
            ViewSpec::Sub { dir, inner } => {
                if !dir.is_empty() && !path::valid_path(dir) {
                    return Err(FsError::Config(format!("sub directory {dir:?} is not valid")));
                }
                inner.build()?.sub(dir)
            }
        }
    }
}
