//! Integration tests for funcscan extraction over fixture files

use funcscan_core::ast::FunctionKind;
use funcscan_core::extract::{walk_tree, NodeOutcome};
use funcscan_core::ignore;
use funcscan_core::language::Language;
use funcscan_core::parser::ToleranceParser;
use funcscan_core::{build_report, plan_scan, Report, ScanOptions, ScanRequest};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn scan(roots: Vec<PathBuf>) -> Report {
    let request = ScanRequest::new(roots, None).unwrap();
    build_report(&request, &ScanOptions::default()).unwrap()
}

fn relative_to_project(path: &str) -> String {
    let root = fixture_path("project");
    PathBuf::from(path)
        .strip_prefix(&root)
        .unwrap()
        .to_string_lossy()
        .replace('\\', "/")
}

#[test]
fn test_declaration_and_arrow() {
    let report = scan(vec![fixture_path("declaration-and-arrow.js")]);
    assert_eq!(report.len(), 1);

    let functions = &report.files()[0].functions;
    assert_eq!(functions.len(), 2);
    assert_eq!(functions[0].kind, FunctionKind::Declaration);
    assert_eq!(functions[0].source_text, "function foo(){}");
    assert_eq!(functions[1].kind, FunctionKind::Arrow);
    assert_eq!(functions[1].source_text, "() => {}");
}

#[test]
fn test_nested_function_yields_two_entries() {
    let report = scan(vec![fixture_path("nested.js")]);
    let functions = &report.files()[0].functions;
    assert_eq!(functions.len(), 2);
    assert_eq!((functions[0].start_line, functions[0].end_line), (1, 6));
    assert_eq!((functions[1].start_line, functions[1].end_line), (2, 4));
    assert!(functions[1].source_text.starts_with("function inner(item)"));
}

#[test]
fn test_malformed_file_is_still_reported() {
    let report = scan(vec![fixture_path("malformed.js")]);
    assert_eq!(report.len(), 1);
    assert!(report.function_count() >= 1);
}

#[test]
fn test_empty_file_is_not_reported() {
    let report = scan(vec![fixture_path("empty.js")]);
    assert!(report.is_empty());
}

#[test]
fn test_typescript_members() {
    let report = scan(vec![fixture_path("methods.ts")]);
    let kinds: Vec<FunctionKind> = report.files()[0].functions.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![
            FunctionKind::Method,
            FunctionKind::Method,
            FunctionKind::AsyncMethod,
            FunctionKind::AsyncArrow,
            FunctionKind::Generator,
            FunctionKind::Expression,
        ]
    );
}

#[test]
fn test_every_function_node_appears_exactly_once() {
    for name in ["declaration-and-arrow.js", "nested.js", "methods.ts", "malformed.js"] {
        let path = fixture_path(name);
        let source = std::fs::read_to_string(&path).unwrap();
        let mut parser = ToleranceParser::new(Language::for_explicit_file(&path)).unwrap();
        let tree = parser.parse(&source);

        let captured: Vec<(u32, FunctionKind)> = walk_tree(&tree)
            .into_iter()
            .filter_map(|outcome| match outcome {
                NodeOutcome::Captured(f) => Some((f.start_line, f.kind)),
                NodeOutcome::Skipped(_) => None,
            })
            .collect();

        let report = scan(vec![path.clone()]);
        let mut reported: Vec<(u32, FunctionKind)> = report
            .files()
            .iter()
            .flat_map(|file| file.functions.iter().map(|f| (f.start_line, f.kind)))
            .collect();

        let mut expected = captured.clone();
        expected.sort_by_key(|(line, _)| *line);
        reported.sort_by_key(|(line, _)| *line);
        assert_eq!(reported, expected, "mismatch in {}", name);

        for file in report.files() {
            for function in &file.functions {
                assert!(function.start_line >= 1);
                assert!(function.start_line <= function.end_line);
            }
        }
    }
}

#[test]
fn test_project_scan_respects_ignore_rules() {
    let request = ScanRequest::new(vec![fixture_path("project")], None).unwrap();
    let files: Vec<String> = plan_scan(&request, &ScanOptions::default())
        .iter()
        .map(|path| relative_to_project(&path.display().to_string()))
        .collect();
    assert_eq!(
        files,
        vec![
            "src/app.js",
            "src/constants.js",
            "src/shapes.mts",
            "src/util/format.mjs"
        ]
    );
}

#[test]
fn test_project_report_drops_files_without_functions() {
    let report = scan(vec![fixture_path("project")]);
    let files: Vec<String> = report
        .files()
        .iter()
        .map(|file| relative_to_project(&file.file_path))
        .collect();
    assert_eq!(files, vec!["src/app.js", "src/shapes.mts", "src/util/format.mjs"]);
    assert_eq!(report.function_count(), 4);
}

#[test]
fn test_explicit_file_bypasses_ignore_rules() {
    let minified = fixture_path("project/public/app.min.js");
    let bundled = fixture_path("project/dist/bundle.js");
    let report = scan(vec![minified, bundled]);
    assert_eq!(report.len(), 2);
    assert_eq!(report.function_count(), 2);
}

#[test]
fn test_missing_root_does_not_stop_other_roots() {
    let report = scan(vec![
        fixture_path("does-not-exist"),
        fixture_path("nested.js"),
    ]);
    assert_eq!(report.len(), 1);
    assert_eq!(report.function_count(), 2);
}

#[test]
fn test_roots_are_processed_in_request_order() {
    let report = scan(vec![fixture_path("nested.js"), fixture_path("declaration-and-arrow.js")]);
    assert_eq!(report.len(), 2);
    assert!(report.files()[0].file_path.ends_with("nested.js"));
    assert!(report.files()[1].file_path.ends_with("declaration-and-arrow.js"));
}

#[test]
fn test_resolved_rules_are_idempotent() {
    let root = fixture_path("project");
    let first = ignore::resolve(&root, &[]);
    let second = ignore::resolve(&root, &[]);
    assert_eq!(first, second);
    assert_eq!(first.union(&second), first);
    assert!(first.contains_line("generated/"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_run_hands_persisted_report_to_command() {
    use funcscan_core::dispatch::{CommandDispatcher, InferenceResult};

    let dir = tempfile::TempDir::new().unwrap();
    let destination = dir.path().join("result.json");
    let request = ScanRequest::new(vec![fixture_path("nested.js")], Some(destination.clone())).unwrap();
    let dispatcher = CommandDispatcher::new(
        "sh",
        vec![
            "-c".to_string(),
            "cat \"$1\"".to_string(),
            "sh".to_string(),
            "{input}".to_string(),
        ],
        None,
    );

    let outcome = funcscan_core::run(&request, &ScanOptions::default(), &dispatcher)
        .await
        .unwrap();
    assert_eq!(outcome.functions, 2);

    let persisted: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&destination).unwrap()).unwrap();
    assert_eq!(outcome.inference, InferenceResult::Json(persisted.clone()));
    assert_eq!(persisted[0]["messages"][1]["nodeType"], "FunctionDeclaration");
    assert_eq!(persisted[0]["messages"][1]["startLine"], 2);
}
