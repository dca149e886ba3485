//! Language detection
//!
//! Maps file extensions onto the grammar used by the tolerant parser.

pub mod span;

use std::path::Path;

pub use span::SourceSpan;

/// Extensions picked up when scanning a directory
pub const SOURCE_EXTENSIONS: &[&str] = &["js", "mjs", "ts", "mts"];

/// Supported source languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// JavaScript (.js, .mjs)
    JavaScript,
    /// TypeScript (.ts, .mts)
    TypeScript,
}

impl Language {
    /// Detect language from file extension
    ///
    /// Returns `None` if the extension is not recognized.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "js" | "mjs" => Some(Language::JavaScript),
            "ts" | "mts" => Some(Language::TypeScript),
            _ => None,
        }
    }

    /// Detect language from file path
    ///
    /// Returns `None` if the file has no extension or the extension is not recognized.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Language used for a file that was named explicitly
    ///
    /// Explicit files are always scanned, so an unknown extension falls back
    /// to the JavaScript grammar.
    pub fn for_explicit_file(path: &Path) -> Self {
        Self::from_path(path).unwrap_or(Language::JavaScript)
    }

    /// Get the canonical name of the language
    pub fn name(&self) -> &'static str {
        match self {
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
        }
    }

    /// Get file extensions for this language (without the dot)
    pub fn extensions(&self) -> &[&'static str] {
        match self {
            Language::JavaScript => &["js", "mjs"],
            Language::TypeScript => &["ts", "mts"],
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(Language::from_extension("js"), Some(Language::JavaScript));
        assert_eq!(Language::from_extension("mjs"), Some(Language::JavaScript));
        assert_eq!(Language::from_extension("ts"), Some(Language::TypeScript));
        assert_eq!(Language::from_extension("mts"), Some(Language::TypeScript));
    }

    #[test]
    fn test_from_extension_unknown() {
        assert_eq!(Language::from_extension("jsx"), None);
        assert_eq!(Language::from_extension("cjs"), None);
        assert_eq!(Language::from_extension("py"), None);
        assert_eq!(Language::from_extension(""), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            Language::from_path(Path::new("src/main.ts")),
            Some(Language::TypeScript)
        );
        assert_eq!(
            Language::from_path(Path::new("lib/index.mjs")),
            Some(Language::JavaScript)
        );
        assert_eq!(Language::from_path(Path::new("README.md")), None);
        assert_eq!(Language::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn test_explicit_file_falls_back_to_javascript() {
        assert_eq!(
            Language::for_explicit_file(Path::new("snippet.txt")),
            Language::JavaScript
        );
        assert_eq!(
            Language::for_explicit_file(Path::new("types.mts")),
            Language::TypeScript
        );
    }

    #[test]
    fn test_extensions_cover_source_extensions() {
        let mut all: Vec<&str> = Language::JavaScript
            .extensions()
            .iter()
            .chain(Language::TypeScript.extensions())
            .copied()
            .collect();
        all.sort_unstable();
        let mut expected = SOURCE_EXTENSIONS.to_vec();
        expected.sort_unstable();
        assert_eq!(all, expected);
    }
}
