//! Path well-formedness and slash-path arithmetic.
//!
//! Every path crossing a [`Filesystem`](crate::Filesystem) boundary is
//! slash-separated and relative: non-empty, no leading or trailing `/`, no
//! empty segments and no `.` or `..` segments. The root is spelled `.`.

use crate::error::{FsError, FsResult};

/// The root path.
pub const ROOT: &str = ".";

/// Returns true if `name` is a well-formed path.
pub fn valid_path(name: &str) -> bool {
    if name == ROOT {
        return true;
    }
    !name.is_empty() && name.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != "..")
}

/// Validate a path before any lookup proceeds.
///
/// Fails with [`FsError::InvalidPath`] tagged with the `open` operation.
pub fn check(name: &str) -> FsResult<()> {
    if valid_path(name) {
        Ok(())
    } else {
        Err(FsError::InvalidPath {
            op: "open",
            path: name.to_string(),
        })
    }
}

/// Strip `prefix` from `name` at a segment boundary.
///
/// Returns `None` unless `name` starts with `prefix` and the match ends on
/// a `/` or at the end of `name`; a partial segment such as prefix `aa`
/// against `aab` is rejected. An exact match returns `""`.
pub fn trim_prefix<'a>(prefix: &str, name: &'a str) -> Option<&'a str> {
    let rest = name.strip_prefix(prefix)?;
    if rest.is_empty() {
        return Some("");
    }
    rest.strip_prefix('/')
}

/// The first segment of a path: `a` for `a/b/c`.
pub fn first_segment(path: &str) -> &str {
    match path.find('/') {
        Some(i) if i > 0 => &path[..i],
        _ => path,
    }
}

/// The last segment of a path: `c` for `a/b/c`, `.` for an empty path.
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { ROOT } else { "/" };
    }
    match trimmed.rfind('/') {
        Some(i) => &trimmed[i + 1..],
        None => trimmed,
    }
}

/// Join two well-formed paths, treating `.` as the identity.
pub fn join(dir: &str, name: &str) -> String {
    match (dir, name) {
        (ROOT, _) | ("", _) => name.to_string(),
        (_, ROOT) | (_, "") => dir.to_string(),
        _ => format!("{dir}/{name}"),
    }
}

/// Normalize the spellings of the root accepted by `sub`.
pub(crate) fn sub_dir(dir: &str) -> &str {
    if dir.is_empty() { ROOT } else { dir }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case::root(".", true)]
    #[case::single("a", true)]
    #[case::nested("a/b/c", true)]
    #[case::dotfile(".hidden/x", true)]
    #[case::dots_in_name("a/..b/c.", true)]
    #[case::empty("", false)]
    #[case::leading_slash("/a", false)]
    #[case::trailing_slash("a/", false)]
    #[case::double_slash("a//b", false)]
    #[case::dot_segment("a/./b", false)]
    #[case::dotdot_segment("a/../b", false)]
    #[case::leading_dot("./a", false)]
    #[case::dotdot("..", false)]
    #[case::slash("/", false)]
    fn validity(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(valid_path(name), expected, "{name:?}");
    }

    #[test]
    fn check_reports_open_and_path() {
        match check("a//b") {
            Err(FsError::InvalidPath { op, path }) => {
                assert_eq!(op, "open");
                assert_eq!(path, "a//b");
            }
            other => panic!("expected InvalidPath, got {other:?}"),
        }
        assert!(check("a/b").is_ok());
    }

    #[rstest]
    #[case::exact("aa/b", "aa/b", Some(""))]
    #[case::under("aa/b", "aa/b/c/d", Some("c/d"))]
    #[case::partial_segment("aa", "aab", None)]
    #[case::partial_nested("aa/b", "aa/bc", None)]
    #[case::unrelated("aa", "b", None)]
    #[case::shorter("aa/b", "aa", None)]
    #[case::ancestor_strip("aa", "aa/b", Some("b"))]
    fn trimming(#[case] prefix: &str, #[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(trim_prefix(prefix, name), expected);
    }

    #[rstest]
    #[case("a/b/c", "a")]
    #[case("abc", "abc")]
    #[case("", "")]
    fn first_segments(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(first_segment(path), expected);
    }

    #[rstest]
    #[case("a/b/c", "c")]
    #[case("abc", "abc")]
    #[case("", ".")]
    #[case(".", ".")]
    fn base_names(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(base_name(path), expected);
    }

    #[rstest]
    #[case(".", "a/b", "a/b")]
    #[case("a", ".", "a")]
    #[case("a", "b/c", "a/b/c")]
    fn joining(#[case] dir: &str, #[case] name: &str, #[case] expected: &str) {
        assert_eq!(join(dir, name), expected);
    }

    proptest! {
        #[test]
        fn joined_valid_paths_stay_valid(
            a in "[a-z]{1,4}(/[a-z]{1,4}){0,3}",
            b in "[a-z]{1,4}(/[a-z]{1,4}){0,3}",
        ) {
            let joined = join(&a, &b);
            prop_assert!(valid_path(&joined));
            prop_assert_eq!(trim_prefix(&a, &joined), Some(b.as_str()));
        }

        #[test]
        fn trim_never_splits_a_segment(prefix in "[a-c]{1,3}", name in "[a-c]{1,6}") {
            if let Some(rest) = trim_prefix(&prefix, &name) {
                prop_assert!(rest.is_empty());
                prop_assert_eq!(prefix, name);
            }
        }
    }
}
