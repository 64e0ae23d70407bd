//! fsview: composable read-only filesystem views.
//!
//! Everything here implements one capability, [`Filesystem`], so views stack
//! freely on top of backends and on top of each other:
//!
//! - **PrefixFs**: relocates a filesystem beneath a path prefix, inventing
//!   the directories above it
//! - **UnionFs**: layers filesystems in priority order
//! - **SubFs**: restricts a filesystem to one of its subtrees
//! - **MemoryFs** / **LocalFs**: backends holding actual files
//!
//! ```text
//! UnionFs
//! ├── PrefixFs("static") ── LocalFs(./public)
//! └── MemoryFs { static/robots.txt }
//! ```
//!
//! Paths are slash-separated, relative and clean; [`path::check`] is the
//! gate every layer applies before looking anything up. Stacks can also be
//! declared as JSON through [`ViewSpec`].

pub mod config;
pub mod error;
mod local;
mod memory;
pub mod path;
mod prefix;
mod sub;
pub mod synthetic;
mod traits;
mod union;
pub mod walk;

pub use config::ViewSpec;
pub use error::{FsError, FsResult};
pub use local::LocalFs;
pub use memory::{MemoryFile, MemoryFs};
pub use prefix::PrefixFs;
pub use sub::SubFs;
pub use traits::{DirEntry, DirEntryKind, File, FileMode, Filesystem, Metadata, SysPayload};
pub use union::UnionFs;

pub use fsview_glob::{Pattern, PatternError};
