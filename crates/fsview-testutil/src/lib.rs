//! Test utilities for fsview.
//!
//! [`check_fs`] walks a filesystem from its root and cross-checks the
//! operations against each other, collecting every disagreement into a
//! [`CheckReport`] rather than stopping at the first. The `assert_*`
//! helpers panic with a readable message and are meant for `#[tokio::test]`
//! bodies.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use fsview::{DirEntry, Filesystem, walk};

/// A single check that did not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    /// Path the check was run against.
    pub path: String,
    /// Which check failed, e.g. `"stat"` or `"sub"`.
    pub check: &'static str,
    pub message: String,
}

/// Outcome of a conformance walk.
#[derive(Debug, Default)]
pub struct CheckReport {
    /// Every path reached from the root, root excluded.
    pub visited: BTreeSet<String>,
    pub passed: usize,
    pub failures: Vec<CheckFailure>,
}

impl CheckReport {
    pub fn new() -> Self {
        Self::default()
    }

    fn pass(&mut self) {
        self.passed += 1;
    }

    fn fail(&mut self, path: &str, check: &'static str, message: impl Into<String>) {
        self.failures.push(CheckFailure {
            path: path.to_string(),
            check,
            message: message.into(),
        });
    }

    fn verify(&mut self, ok: bool, path: &str, check: &'static str, message: impl FnOnce() -> String) {
        if ok {
            self.pass();
        } else {
            self.fail(path, check, message());
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failures.len()
    }

    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "fs check: {} checks over {} paths, {} failed",
            self.total(),
            self.visited.len(),
            self.failures.len()
        )?;
        for failure in &self.failures {
            writeln!(f, "  {} [{}]: {}", failure.path, failure.check, failure.message)?;
        }
        Ok(())
    }
}

/// Walk `fs` from `.` and check that its operations agree with each other.
///
/// For every entry reached:
/// - `stat`, `open` then `stat`, and the listing agree on directory-ness
/// - a file's `read_file` equals what its open handle yields
/// - a directory's `sub` view lists what `read_dir` lists
/// - globbing the entry's parent with `*` finds it
///
/// Every path in `expected` must be reached by the walk.
pub async fn check_fs(fs: Arc<dyn Filesystem>, expected: &[&str]) -> CheckReport {
    let mut report = CheckReport::new();

    match fs.stat(".").await {
        Ok(meta) => report.verify(meta.is_dir(), ".", "stat", || "root is not a directory".into()),
        Err(e) => report.fail(".", "stat", e.to_string()),
    }

    let mut pending = vec![".".to_string()];
    let mut seen = HashSet::new();
    while let Some(dir) = pending.pop() {
        if !seen.insert(dir.clone()) {
            continue;
        }
        let entries = match fs.read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                report.fail(&dir, "read_dir", e.to_string());
                continue;
            }
        };

        check_glob(fs.as_ref(), &dir, &entries, &mut report).await;
        if dir != "." {
            check_sub(&fs, &dir, &entries, &mut report).await;
        }

        for entry in &entries {
            let child = join(&dir, &entry.name);
            report.visited.insert(child.clone());
            check_entry(fs.as_ref(), &child, entry, &mut report).await;
            if entry.is_dir() {
                pending.push(child);
            }
        }
    }

    for want in expected {
        report.verify(report.visited.contains(*want), want, "expected", || {
            "not reached from the root".into()
        });
    }
    report
}

async fn check_entry(fs: &dyn Filesystem, name: &str, entry: &DirEntry, report: &mut CheckReport) {
    match fs.stat(name).await {
        Ok(meta) => report.verify(meta.is_dir() == entry.is_dir(), name, "stat", || {
            format!("stat says dir={}, listing says dir={}", meta.is_dir(), entry.is_dir())
        }),
        Err(e) => report.fail(name, "stat", e.to_string()),
    }

    let mut file = match fs.open(name).await {
        Ok(file) => file,
        Err(e) => {
            report.fail(name, "open", e.to_string());
            return;
        }
    };
    match file.stat().await {
        Ok(meta) => report.verify(meta.is_dir() == entry.is_dir(), name, "open", || {
            format!("handle says dir={}, listing says dir={}", meta.is_dir(), entry.is_dir())
        }),
        Err(e) => report.fail(name, "open", e.to_string()),
    }

    if entry.is_dir() {
        return;
    }
    let via_handle = walk::read_to_end(file.as_mut()).await;
    let via_read_file = fs.read_file(name).await;
    match (via_handle, via_read_file) {
        (Ok(a), Ok(b)) => report.verify(a == b, name, "read_file", || {
            format!("handle read {} bytes, read_file {} bytes", a.len(), b.len())
        }),
        (Err(e), _) | (_, Err(e)) => report.fail(name, "read_file", e.to_string()),
    }
}

async fn check_sub(fs: &Arc<dyn Filesystem>, dir: &str, entries: &[DirEntry], report: &mut CheckReport) {
    let sub = match fs.clone().sub(dir) {
        Ok(sub) => sub,
        Err(e) => {
            report.fail(dir, "sub", e.to_string());
            return;
        }
    };
    match sub.read_dir(".").await {
        Ok(listed) => report.verify(names(&listed) == names(entries), dir, "sub", || {
            format!("sub lists {:?}, read_dir lists {:?}", names(&listed), names(entries))
        }),
        Err(e) => report.fail(dir, "sub", e.to_string()),
    }
}

async fn check_glob(fs: &dyn Filesystem, dir: &str, entries: &[DirEntry], report: &mut CheckReport) {
    let pattern = if dir == "." {
        "*".to_string()
    } else {
        format!("{}/*", escape(dir))
    };
    let found: HashSet<String> = match fs.glob(&pattern).await {
        Ok(found) => found.into_iter().collect(),
        Err(e) => {
            report.fail(dir, "glob", e.to_string());
            return;
        }
    };
    for entry in entries {
        let child = join(dir, &entry.name);
        report.verify(found.contains(&child), &child, "glob", || {
            format!("glob({pattern:?}) did not find it")
        });
    }
}

fn names(entries: &[DirEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}

fn join(dir: &str, name: &str) -> String {
    if dir == "." {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

fn escape(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if matches!(c, '*' | '?' | '[' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Assert that `path` reads back as `want`.
pub async fn assert_content(fs: &dyn Filesystem, path: &str, want: &str) {
    match fs.read_file(path).await {
        Ok(data) => assert_eq!(
            String::from_utf8_lossy(&data),
            want,
            "unexpected content at {path}"
        ),
        Err(e) => panic!("read_file({path}) failed: {e}"),
    }
}

/// Assert that both `open` and `stat` report `path` as not found.
pub async fn assert_not_exists(fs: &dyn Filesystem, path: &str) {
    let opened = fs.open(path).await.map(|_| ());
    let stated = fs.stat(path).await.map(|_| ());
    for (op, result) in [("open", opened), ("stat", stated)] {
        match result {
            Err(e) if e.is_not_found() => {}
            Err(e) => panic!("{op}({path}) failed with {e}, expected not found"),
            Ok(()) => panic!("{op}({path}) succeeded, expected not found"),
        }
    }
}
