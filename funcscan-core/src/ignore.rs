//! Ignore rules for file discovery
//!
//! A scan root's rule set is the union of:
//! 1. Built-in exclusions (dependencies, build output, minified bundles,
//!    tests, demos and samples)
//! 2. Extra excludes from configuration
//! 3. Entries of `.eslintignore`, `.npmignore`, `.gitignore` and
//!    `.dockerignore` found at the root
//!
//! Built-in and configured excludes are globs matched against paths relative
//! to the scan root, where `*` never crosses a directory boundary and `**`
//! does. Ignore-file entries keep full gitignore semantics, negations and
//! escapes included.

use ::ignore::gitignore::{Gitignore, GitignoreBuilder};
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use std::path::Path;

/// Ignore files read from a scan root, in reading order
pub const IGNORE_FILE_NAMES: &[&str] = &[".eslintignore", ".npmignore", ".gitignore", ".dockerignore"];

/// Exclusions applied to every scan
pub const BUILTIN_PATTERNS: &[&str] = &[
    "**/node_modules/**",
    "**/bower_components/**",
    "**/vendor/**",
    "**/java/**",
    "**/min/**",
    "**/dist/**",
    "**/build/**",
    "**/doc/**",
    "**/docs/**",
    "**/assets/**",
    "**/static/**",
    "**/spec/**",
    "**/*demo*/**",
    "**/*sample*/**",
    "**/*test*/**",
    "**/*.min.js",
    "**/demo.*",
    "**/*test*.*",
    "**/*jquery*.*",
];

const DESCENDANTS: &str = "/**";

/// Ignore rules for one scan root
///
/// Globs are kept sorted since their order is irrelevant. Ignore-file lines
/// keep the order they were first seen in, because a later `!` entry only
/// re-includes what an earlier entry excluded. Both collapse duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRuleSet {
    patterns: BTreeSet<String>,
    lines: Vec<String>,
    seen_lines: BTreeSet<String>,
}

impl IgnoreRuleSet {
    /// Rule set holding only the built-in exclusions
    pub fn builtin() -> Self {
        let mut rules = IgnoreRuleSet::default();
        for pattern in BUILTIN_PATTERNS {
            rules.insert(*pattern);
        }
        rules
    }

    /// Add one glob; returns `false` for blank or duplicate patterns
    pub fn insert(&mut self, pattern: impl Into<String>) -> bool {
        let pattern = pattern.into();
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return false;
        }
        self.patterns.insert(pattern.to_string())
    }

    /// Add one gitignore line; returns `false` for no-op or duplicate lines
    pub fn insert_line(&mut self, line: &str) -> bool {
        let Some(line) = significant_line(line) else {
            return false;
        };
        if !self.seen_lines.insert(line.to_string()) {
            return false;
        }
        self.lines.push(line.to_string());
        true
    }

    /// Add the entries of an ignore file, returning how many lines were new
    pub fn extend_from_ignore_file(&mut self, contents: &str) -> usize {
        contents.lines().filter(|line| self.insert_line(line)).count()
    }

    pub fn union(&self, other: &IgnoreRuleSet) -> IgnoreRuleSet {
        let mut merged = self.clone();
        merged.patterns.extend(other.patterns.iter().cloned());
        for line in &other.lines {
            merged.insert_line(line);
        }
        merged
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }

    /// Ignore-file lines in the order they apply
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.patterns.len() + self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.lines.is_empty()
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.patterns.contains(pattern)
    }

    pub fn contains_line(&self, line: &str) -> bool {
        self.seen_lines.contains(line)
    }

    /// Compile into a matcher for paths under `root`
    ///
    /// Invalid globs and ignore lines are logged and skipped.
    pub fn compile(&self, root: &Path) -> IgnoreMatcher {
        let mut paths = GlobSetBuilder::new();
        let mut dirs = GlobSetBuilder::new();

        for pattern in &self.patterns {
            let glob = match build_glob(pattern) {
                Ok(glob) => glob,
                Err(e) => {
                    tracing::warn!(pattern = %pattern, error = %e, "skipping invalid ignore pattern");
                    continue;
                }
            };
            paths.add(glob);

            // `<dir>/**` also prunes the directory itself during the walk
            if let Some(dir) = pattern.strip_suffix(DESCENDANTS) {
                if let Ok(glob) = build_glob(dir) {
                    dirs.add(glob);
                }
            }
        }

        IgnoreMatcher {
            paths: build_set(paths),
            dirs: build_set(dirs),
            gitignore: build_gitignore(root, &self.lines),
        }
    }
}

fn build_glob(pattern: &str) -> Result<Glob, globset::Error> {
    GlobBuilder::new(pattern).literal_separator(true).build()
}

fn build_set(builder: GlobSetBuilder) -> GlobSet {
    builder.build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to compile ignore patterns");
        GlobSet::empty()
    })
}

fn build_gitignore(root: &Path, lines: &[String]) -> Gitignore {
    let mut builder = GitignoreBuilder::new(root);
    for line in lines {
        if let Err(e) = builder.add_line(None, line) {
            tracing::warn!(line = %line, error = %e, "skipping invalid ignore entry");
        }
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to compile ignore file entries");
        Gitignore::empty()
    })
}

/// The part of an ignore-file line that carries a rule
///
/// Blank lines and `#` comments carry none. Leading whitespace is part of
/// the entry in gitignore syntax, so only the line ending is trimmed.
fn significant_line(line: &str) -> Option<&str> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.starts_with('#') {
        return None;
    }
    Some(line)
}

/// Compiled ignore rules
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    paths: GlobSet,
    dirs: GlobSet,
    gitignore: Gitignore,
}

impl IgnoreMatcher {
    /// Check a file path relative to the scan root
    pub fn is_ignored(&self, relative: &Path) -> bool {
        self.paths.is_match(relative)
            || self
                .gitignore
                .matched_path_or_any_parents(relative, false)
                .is_ignore()
    }

    /// Check whether a directory, relative to the scan root, is pruned
    pub fn is_ignored_dir(&self, relative: &Path) -> bool {
        self.dirs.is_match(relative)
            || self.paths.is_match(relative)
            || self.gitignore.matched(relative, true).is_ignore()
    }
}

/// Resolve the rule set for a scan root
///
/// Missing ignore files contribute nothing; unreadable ones are logged.
pub fn resolve(root: &Path, extra: &[String]) -> IgnoreRuleSet {
    let mut rules = IgnoreRuleSet::builtin();
    for pattern in extra {
        rules.insert(pattern.as_str());
    }

    for name in IGNORE_FILE_NAMES {
        let path = root.join(name);
        if !path.is_file() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let added = rules.extend_from_ignore_file(&contents);
                tracing::debug!(file = %path.display(), added, "read ignore file");
            }
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "could not read ignore file");
            }
        }
    }

    tracing::debug!(root = %root.display(), rules = rules.len(), "resolved ignore rules");
    rules
}
