//! Pattern-driven directory walking.
//!
//! The walker only descends into directories a pattern can still match, so a
//! lookup like `/guide/*.md` reads one directory regardless of tree size.

use std::fs;
use std::path::{Path, PathBuf};

use quire_content::Segment;

/// One directory entry with its file type resolved.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

impl Entry {
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }
}

/// What a walk step matched.
#[derive(Debug, Clone)]
pub(crate) struct Match {
    /// Content path: `/a/b.md` for files, `/a/` for directories.
    pub url_path: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Read a directory, sorted by name.
///
/// Unreadable or missing directories yield no entries. Symlinks are reported
/// as files when they resolve to one and are never descended into.
pub(crate) fn read_sorted(dir: &Path) -> Vec<Entry> {
    let Ok(entries) = fs::read_dir(dir) else {
        tracing::trace!(dir = %dir.display(), "directory not readable");
        return Vec::new();
    };

    let mut entries: Vec<Entry> = entries
        .filter_map(Result::ok)
        .filter_map(|e| {
            let file_type = e.file_type().ok()?;
            let path = e.path();
            let is_dir = file_type.is_dir();
            let is_file = file_type.is_file() || (file_type.is_symlink() && path.is_file());
            (is_dir || is_file).then(|| Entry {
                name: e.file_name().to_string_lossy().into_owned(),
                path,
                is_dir,
            })
        })
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

/// Collect every file and directory under `dir` matching `segments`.
///
/// `url_prefix` is the content path of `dir` without a trailing slash
/// (empty for the root).
pub(crate) fn walk(dir: &Path, url_prefix: &str, segments: &[Segment], out: &mut Vec<Match>) {
    let Some((first, rest)) = segments.split_first() else {
        out.push(Match {
            url_path: format!("{url_prefix}/"),
            path: dir.to_path_buf(),
            is_dir: true,
        });
        return;
    };

    if first.is_recursive() {
        walk(dir, url_prefix, rest, out);
        for entry in read_sorted(dir) {
            if entry.is_dir && first.matches(&entry.name) {
                let prefix = format!("{url_prefix}/{}", entry.name);
                walk(&entry.path, &prefix, segments, out);
            }
        }
        return;
    }

    for entry in read_sorted(dir) {
        if !first.matches(&entry.name) {
            continue;
        }
        let url_path = format!("{url_prefix}/{}", entry.name);
        if rest.is_empty() {
            out.push(Match {
                url_path: if entry.is_dir { format!("{url_path}/") } else { url_path },
                path: entry.path,
                is_dir: entry.is_dir,
            });
        } else if entry.is_dir {
            walk(&entry.path, &url_path, rest, out);
        }
    }
}

/// Every visible entry below `dir`, depth first, sorted per directory.
pub(crate) fn descendants(dir: &Path, out: &mut Vec<Entry>) {
    for entry in read_sorted(dir) {
        if entry.is_hidden() {
            continue;
        }
        let recurse = entry.is_dir.then(|| entry.path.clone());
        out.push(entry);
        if let Some(sub) = recurse {
            descendants(&sub, out);
        }
    }
}
