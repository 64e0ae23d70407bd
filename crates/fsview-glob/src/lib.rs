//! fsview-glob: path-style glob patterns.
//!
//! Patterns match one slash-separated path at a time:
//! - `*` matches any run of characters except `/`
//! - `?` matches exactly one character except `/`
//! - `[abc]`, `[a-z]` match one character from the class; `[^a-z]` or
//!   `[!a-z]` negate it. Classes never match `/`.
//! - `\c` matches `c` literally, inside or outside a class.
//!
//! A pattern is compiled once with [`Pattern::new`], which rejects
//! malformed syntax up front. Callers that walk a filesystem rely on that:
//! a bad pattern is an error even when nothing would have been matched.

pub mod glob;

pub use glob::{Pattern, glob_match};

use thiserror::Error;

/// Errors from compiling a glob pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("syntax error in pattern {pattern:?}: unclosed character class")]
    UnclosedClass { pattern: String },
    #[error("syntax error in pattern {pattern:?}: empty character class")]
    EmptyClass { pattern: String },
    #[error("syntax error in pattern {pattern:?}: trailing backslash")]
    TrailingEscape { pattern: String },
    #[error("syntax error in pattern {pattern:?}: bad range {lo:?}-{hi:?}")]
    BadRange { pattern: String, lo: char, hi: char },
}

/// Check if a string contains glob metacharacters (`*`, `?`, `[`, `\`).
///
/// A path segment without metacharacters can be looked up directly
/// instead of listed and matched.
///
/// ```
/// use fsview_glob::has_meta;
/// assert!(has_meta("*.rs"));
/// assert!(has_meta("src/[ab]*.txt"));
/// assert!(!has_meta("src/main.rs"));
/// ```
pub fn has_meta(s: &str) -> bool {
    s.contains(['*', '?', '[', '\\'])
}
