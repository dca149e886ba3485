//! Source file discovery
//!
//! Global invariants enforced:
//! - Order is lexical by file name at each directory level
//! - Ignored directories are never entered
//! - Hidden entries (names starting with `.`) below a directory root are skipped
//! - A file named explicitly is always scanned
//! - Symlinks are not followed

use crate::ignore::{IgnoreMatcher, IgnoreRuleSet};
use crate::language::Language;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// List the candidate source files under `root`
///
/// A file root is returned as-is, bypassing ignore rules and the extension
/// check. A directory is walked recursively for recognized extensions, with
/// hidden entries skipped and ignore rules matched against paths relative to
/// the root. Anything else yields an empty list.
pub fn discover_files(root: &Path, rules: &IgnoreRuleSet) -> Vec<PathBuf> {
    let metadata = match std::fs::metadata(root) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::warn!(root = %root.display(), error = %e, "skipping scan root");
            return Vec::new();
        }
    };

    if metadata.is_file() {
        return vec![root.to_path_buf()];
    }
    if !metadata.is_dir() {
        tracing::warn!(root = %root.display(), "scan root is neither a file nor a directory");
        return Vec::new();
    }

    let matcher = rules.compile(root);
    let files = walk_dir(root, &matcher);
    tracing::debug!(root = %root.display(), files = files.len(), "discovered source files");
    files
}

fn walk_dir(root: &Path, matcher: &IgnoreMatcher) -> Vec<PathBuf> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_pruned(root, entry, matcher));

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };

        if !entry.file_type().is_file()
            || is_hidden(&entry)
            || Language::from_path(entry.path()).is_none()
        {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if matcher.is_ignored(relative) {
            continue;
        }
        files.push(entry.into_path());
    }
    files
}

fn is_pruned(root: &Path, entry: &DirEntry, matcher: &IgnoreMatcher) -> bool {
    // The root itself is never pruned
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    if is_hidden(entry) {
        return true;
    }
    let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
    matcher.is_ignored_dir(relative)
}

/// Dot-prefixed name, such as `.git`, `.cache` or `.eslintrc.js`
fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}
