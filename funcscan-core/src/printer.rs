//! Canonical source printer for syntax subtrees
//!
//! Re-serializes a node from the tokens held in the tree instead of slicing
//! the original file, so nodes synthesized by error recovery print the same
//! way as regular ones.
//!
//! Layout rules:
//! - tokens adjacent in the source stay adjacent
//! - tokens on the same line are separated by a single space
//! - line breaks are kept, runs of blank lines collapse to one
//! - each line is indented by two spaces per open bracket

use crate::ast::{Leaf, SyntaxNode, SyntaxValue};
use crate::language::SourceSpan;
use thiserror::Error;

const INDENT: &str = "  ";

/// Reasons a node cannot be printed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrintError {
    #[error("recovered {kind} at line {line} has no source text")]
    MissingNode { kind: String, line: u32 },
    #[error("node has no printable tokens")]
    Empty,
}

/// Printed source of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Printed {
    pub text: String,
    /// Span from the first to the last printed token
    pub span: SourceSpan,
}

struct Token<'a> {
    text: &'a str,
    span: SourceSpan,
}

/// Print a node's subtree
pub fn print_node(node: &SyntaxNode) -> Result<Printed, PrintError> {
    let mut tokens = Vec::new();
    collect_node(node, &mut tokens)?;
    render(&tokens)
}

fn collect_node<'a>(node: &'a SyntaxNode, tokens: &mut Vec<Token<'a>>) -> Result<(), PrintError> {
    node.fields
        .iter()
        .try_for_each(|(_, value)| collect_value(value, tokens))
}

fn collect_value<'a>(value: &'a SyntaxValue, tokens: &mut Vec<Token<'a>>) -> Result<(), PrintError> {
    match value {
        SyntaxValue::Node(node) => collect_node(node, tokens),
        SyntaxValue::Sequence(items) => items
            .iter()
            .try_for_each(|item| collect_value(item, tokens)),
        SyntaxValue::Leaf(Leaf::Token { text, span, .. }) => {
            if !text.is_empty() {
                tokens.push(Token {
                    text: text.as_str(),
                    span: *span,
                });
            }
            Ok(())
        }
        // Anonymous tokens are named by their own text
        SyntaxValue::Leaf(Leaf::Missing {
            kind,
            named: false,
            span,
        }) => {
            tokens.push(Token {
                text: kind.as_str(),
                span: *span,
            });
            Ok(())
        }
        SyntaxValue::Leaf(Leaf::Missing {
            kind,
            named: true,
            span,
        }) => Err(PrintError::MissingNode {
            kind: kind.clone(),
            line: span.start_line,
        }),
        SyntaxValue::Absent => Ok(()),
    }
}

fn opens(text: &str) -> bool {
    matches!(text, "{" | "(" | "[" | "${")
}

fn closes(text: &str) -> bool {
    matches!(text, "}" | ")" | "]")
}

fn render(tokens: &[Token<'_>]) -> Result<Printed, PrintError> {
    let (first, last) = match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(PrintError::Empty),
    };

    let mut out = String::new();
    let mut depth = 0usize;
    let mut previous: Option<&Token<'_>> = None;

    for token in tokens {
        if closes(token.text) {
            depth = depth.saturating_sub(1);
        }

        if let Some(previous) = previous {
            if token.span.start_line > previous.span.end_line {
                out.push('\n');
                if token.span.start_line - previous.span.end_line > 1 {
                    out.push('\n');
                }
                out.push_str(&INDENT.repeat(depth));
            } else if token.span.start > previous.span.end {
                out.push(' ');
            }
        }

        out.push_str(token.text);

        if opens(token.text) {
            depth += 1;
        }
        previous = Some(token);
    }

    let span = SourceSpan::new(
        first.span.start,
        last.span.end,
        first.span.start_line,
        last.span.end_line,
        first.span.start_col,
    );
    Ok(Printed { text: out, span })
}
