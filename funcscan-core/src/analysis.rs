//! Per-file analysis: read, parse, extract, and collect into a report

use crate::extract::{extract_functions, ExtractedFunction, FunctionOrder};
use crate::language::Language;
use crate::parser::ToleranceParser;
use crate::report::{FileReport, Report};
use crate::RunError;
use std::path::Path;

/// One reusable parser per language
pub struct ParserSet {
    javascript: ToleranceParser,
    typescript: ToleranceParser,
}

impl ParserSet {
    pub fn new() -> Result<Self, RunError> {
        Ok(ParserSet {
            javascript: parser(Language::JavaScript)?,
            typescript: parser(Language::TypeScript)?,
        })
    }

    pub fn parser_for(&mut self, language: Language) -> &mut ToleranceParser {
        match language {
            Language::JavaScript => &mut self.javascript,
            Language::TypeScript => &mut self.typescript,
        }
    }
}

fn parser(language: Language) -> Result<ToleranceParser, RunError> {
    ToleranceParser::new(language).map_err(|source| RunError::Parser { language, source })
}

/// Builds a [`Report`] one file at a time
///
/// Each file's tree is dropped as soon as its functions are extracted.
pub struct ReportAssembler {
    parsers: ParserSet,
    order: FunctionOrder,
    report: Report,
}

impl ReportAssembler {
    pub fn new(order: FunctionOrder) -> Result<Self, RunError> {
        Ok(ReportAssembler {
            parsers: ParserSet::new()?,
            order,
            report: Report::new(),
        })
    }

    /// Analyze one file and return how many functions it contributed
    ///
    /// Unreadable files are logged and contribute nothing. Bytes that are
    /// not UTF-8 are replaced before parsing.
    pub fn add_file(&mut self, path: &Path) -> usize {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "skipping unreadable file");
                return 0;
            }
        };
        let source = String::from_utf8_lossy(&bytes);
        let language = Language::for_explicit_file(path);

        let functions = self.extract_source(&source, language);
        let count = functions.len();
        tracing::debug!(file = %path.display(), %language, functions = count, "analyzed file");

        if let Some(file) = FileReport::new(path, functions) {
            self.report.push(file);
        }
        count
    }

    /// Parse and extract source text that is already in memory
    pub fn extract_source(&mut self, source: &str, language: Language) -> Vec<ExtractedFunction> {
        let tree = self.parsers.parser_for(language).parse(source);
        extract_functions(&tree, self.order)
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn finish(self) -> Report {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FunctionKind;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_add_file_collects_functions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.js");
        fs::write(&path, "function foo(){}\nconst bar = () => {}\n").unwrap();

        let mut assembler = ReportAssembler::new(FunctionOrder::SourceLine).unwrap();
        assert_eq!(assembler.add_file(&path), 2);

        let report = assembler.finish();
        assert_eq!(report.len(), 1);
        assert_eq!(report.files()[0].file_path, path.display().to_string());
        assert_eq!(report.files()[0].functions[1].kind, FunctionKind::Arrow);
    }

    #[test]
    fn test_files_without_functions_are_dropped() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty.js");
        let constants = dir.path().join("constants.ts");
        fs::write(&empty, "").unwrap();
        fs::write(&constants, "export const LIMIT: number = 10;\n").unwrap();

        let mut assembler = ReportAssembler::new(FunctionOrder::SourceLine).unwrap();
        assert_eq!(assembler.add_file(&empty), 0);
        assert_eq!(assembler.add_file(&constants), 0);
        assert!(assembler.finish().is_empty());
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let mut assembler = ReportAssembler::new(FunctionOrder::SourceLine).unwrap();
        assert_eq!(assembler.add_file(&dir.path().join("gone.js")), 0);
        assert!(assembler.report().is_empty());
    }

    #[test]
    fn test_non_utf8_source_is_decoded_lossily() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latin1.js");
        let mut bytes = b"// caf".to_vec();
        bytes.push(0xe9);
        bytes.extend_from_slice(b"\nfunction ok() { return 1; }\n");
        fs::write(&path, bytes).unwrap();

        let mut assembler = ReportAssembler::new(FunctionOrder::SourceLine).unwrap();
        assert_eq!(assembler.add_file(&path), 1);
    }

    #[test]
    fn test_typescript_grammar_selected_by_extension() {
        let mut assembler = ReportAssembler::new(FunctionOrder::SourceLine).unwrap();
        let functions = assembler.extract_source(
            "function typed(x: number): number { return x; }",
            Language::TypeScript,
        );
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].kind, FunctionKind::Declaration);
    }
}
