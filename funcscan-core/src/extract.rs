//! Generic function extraction
//!
//! Walks a [`SyntaxValue`] tree without knowing anything about the grammar
//! and collects every node whose tag carries a [`FunctionKind`].
//!
//! Global invariants enforced:
//! - Every function-like node is visited exactly once, at any depth
//! - The walk always descends into captured functions
//! - A node that cannot be printed is skipped, never fatal
//! - Every record has `start_line <= end_line`

use crate::ast::{FunctionKind, SyntaxNode, SyntaxValue};
use crate::printer::{print_node, PrintError};
use serde::{Deserialize, Serialize};

/// One captured function-like node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFunction {
    #[serde(rename = "functionBody")]
    pub source_text: String,
    #[serde(rename = "startLine")]
    pub start_line: u32,
    #[serde(rename = "endLine")]
    pub end_line: u32,
    #[serde(rename = "nodeType")]
    pub kind: FunctionKind,
}

/// Function-like node that was found but could not be printed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFunction {
    pub kind: FunctionKind,
    /// Line range when the node carries a span
    pub lines: Option<(u32, u32)>,
    pub error: PrintError,
}

/// Result of visiting one function-like node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutcome {
    Captured(ExtractedFunction),
    Skipped(SkippedFunction),
}

/// Order of the functions extracted from one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FunctionOrder {
    /// Stable sort on start line
    #[default]
    SourceLine,
    /// Depth-first pre-order over field order
    Traversal,
}

/// Visit every function-like node reachable from `value`, in pre-order
pub fn walk(value: &SyntaxValue) -> Vec<NodeOutcome> {
    let mut outcomes = Vec::new();
    visit_value(value, &mut outcomes);
    outcomes
}

/// Visit every function-like node in a tree, root included
pub fn walk_tree(root: &SyntaxNode) -> Vec<NodeOutcome> {
    let mut outcomes = Vec::new();
    visit_node(root, &mut outcomes);
    outcomes
}

fn visit_value(value: &SyntaxValue, outcomes: &mut Vec<NodeOutcome>) {
    match value {
        SyntaxValue::Node(node) => visit_node(node, outcomes),
        SyntaxValue::Sequence(items) => {
            for item in items {
                visit_value(item, outcomes);
            }
        }
        SyntaxValue::Leaf(_) | SyntaxValue::Absent => {}
    }
}

fn visit_node(node: &SyntaxNode, outcomes: &mut Vec<NodeOutcome>) {
    if let Some(kind) = node.function_kind() {
        outcomes.push(capture(node, kind));
    }

    // Nested functions are reported separately from their parent
    for (_, value) in &node.fields {
        visit_value(value, outcomes);
    }
}

fn capture(node: &SyntaxNode, kind: FunctionKind) -> NodeOutcome {
    match print_node(node) {
        Ok(printed) => {
            let (start_line, end_line) = node.span.unwrap_or(printed.span).lines();
            NodeOutcome::Captured(ExtractedFunction {
                source_text: printed.text,
                start_line,
                end_line,
                kind,
            })
        }
        Err(error) => NodeOutcome::Skipped(SkippedFunction {
            kind,
            lines: node.span.map(|span| span.lines()),
            error,
        }),
    }
}

/// Extract the printable functions of a tree
///
/// Skipped nodes are logged and dropped. With [`FunctionOrder::SourceLine`]
/// functions sharing a start line keep their traversal order.
pub fn extract_functions(root: &SyntaxNode, order: FunctionOrder) -> Vec<ExtractedFunction> {
    let mut functions: Vec<ExtractedFunction> = walk_tree(root)
        .into_iter()
        .filter_map(|outcome| match outcome {
            NodeOutcome::Captured(function) => Some(function),
            NodeOutcome::Skipped(skipped) => {
                tracing::warn!(
                    kind = %skipped.kind,
                    start_line = skipped.lines.map(|(start, _)| start),
                    error = %skipped.error,
                    "skipping function that could not be printed"
                );
                None
            }
        })
        .collect();

    if order == FunctionOrder::SourceLine {
        functions.sort_by_key(|function| function.start_line);
    }

    functions
}
