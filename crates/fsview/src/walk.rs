//! Generic traversal helpers behind the provided `Filesystem` methods.

use fsview_glob::{Pattern, has_meta};

use crate::error::FsResult;
use crate::path::{self, ROOT};
use crate::traits::{File, Filesystem};

const READ_CHUNK: usize = 8 * 1024;

/// Drain an open file into memory.
pub async fn read_to_end(file: &mut dyn File) -> FsResult<Vec<u8>> {
    let mut data = Vec::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Ok(data);
        }
        data.extend_from_slice(&buf[..n]);
    }
}

/// Expand `pattern` against `fs` one path segment at a time.
///
/// Literal segments are appended without a lookup; segments with
/// metacharacters list the candidate directory and keep matching names.
/// Directories that cannot be listed are skipped, as are literal tails that
/// do not exist. The whole pattern is compiled first so a malformed one
/// fails even when no directory is ever listed.
pub async fn glob<F>(fs: &F, pattern: &str) -> FsResult<Vec<String>>
where
    F: Filesystem + ?Sized,
{
    Pattern::new(pattern)?;

    if !has_meta(pattern) {
        return Ok(match fs.stat(pattern).await {
            Ok(_) => vec![pattern.to_string()],
            Err(_) => Vec::new(),
        });
    }

    let mut candidates = vec![ROOT.to_string()];
    let mut last_literal = false;

    for segment in pattern.split('/') {
        let mut next = Vec::new();
        if has_meta(segment) {
            let matcher = Pattern::new(segment)?;
            for dir in &candidates {
                let Ok(entries) = fs.read_dir(dir).await else {
                    continue;
                };
                for entry in entries {
                    if matcher.matches(&entry.name) {
                        next.push(path::join(dir, &entry.name));
                    }
                }
            }
            last_literal = false;
        } else {
            next.extend(candidates.iter().map(|dir| path::join(dir, segment)));
            last_literal = true;
        }
        candidates = next;
        if candidates.is_empty() {
            break;
        }
    }

    if last_literal {
        let mut existing = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if fs.stat(&candidate).await.is_ok() {
                existing.push(candidate);
            }
        }
        candidates = existing;
    }

    Ok(candidates)
}
