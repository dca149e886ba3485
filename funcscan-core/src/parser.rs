//! Tolerant JavaScript and TypeScript parser using tree-sitter
//!
//! Global invariants enforced:
//! - Parsing never fails on malformed input
//! - Every node and token carries a 1-indexed span
//! - Grammar tag vocabulary does not leak past this module
//!
//! Error recovery maps onto the generic tree as follows:
//! - `ERROR` nodes become untagged placeholder nodes holding whatever
//!   tokens the parser skipped
//! - `MISSING` nodes become [`Leaf::Missing`]
//! - a parse that yields no tree at all becomes an empty placeholder root
//!
//! Subtrees nested deeper than [`MAX_NESTING`] are flattened into a
//! placeholder holding their tokens in source order. The tokens still print
//! as part of any enclosing function, but functions inside the flattened
//! subtree are not reported.

use crate::ast::{FunctionKind, Leaf, NodeTag, SyntaxNode, SyntaxValue};
use crate::language::{Language, SourceSpan};
use tree_sitter::{LanguageError, Node, Parser};

/// Keyword shared by the grammar's function-like tags
const FUNCTION_KEYWORD: &str = "function";

/// Method tag whose function expression is folded into the node itself
const METHOD_TAG: &str = "method_definition";

/// Deepest node nesting kept as structure
pub const MAX_NESTING: usize = 512;

/// Classify a grammar tag as function-like
///
/// Any tag containing `function` is a candidate, plus methods. Candidates
/// are then mapped onto the closed [`FunctionKind`] set; type-level tags
/// such as `function_type` describe a signature shape rather than a
/// callable unit and are rejected.
pub fn classify_tag(kind: &str) -> Option<FunctionKind> {
    if !kind.contains(FUNCTION_KEYWORD) && kind != METHOD_TAG {
        return None;
    }

    match kind {
        "function_declaration" => Some(FunctionKind::Declaration),
        // `function` is the expression tag of older grammar releases
        "function_expression" | "function" => Some(FunctionKind::Expression),
        "arrow_function" => Some(FunctionKind::Arrow),
        "generator_function_declaration" | "generator_function" => Some(FunctionKind::Generator),
        METHOD_TAG => Some(FunctionKind::Method),
        "function_signature" => Some(FunctionKind::Signature),
        _ => None,
    }
}

fn grammar(language: Language) -> tree_sitter::Language {
    match language {
        Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
        Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
    }
}

/// Error-tolerant parser for one language
pub struct ToleranceParser {
    parser: Parser,
    language: Language,
}

impl ToleranceParser {
    /// Create a parser for the given language
    ///
    /// Fails only if the grammar is incompatible with the linked tree-sitter
    /// runtime.
    pub fn new(language: Language) -> Result<Self, LanguageError> {
        let mut parser = Parser::new();
        parser.set_language(&grammar(language))?;
        Ok(ToleranceParser { parser, language })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Parse source text into a generic syntax tree
    pub fn parse(&mut self, source: &str) -> SyntaxNode {
        match self.parser.parse(source, None) {
            Some(tree) => convert_node(tree.root_node(), source.as_bytes(), 0),
            None => {
                tracing::warn!(
                    language = self.language.name(),
                    "parser produced no tree, using an empty placeholder"
                );
                SyntaxNode::placeholder()
            }
        }
    }
}

/// Convert a composite tree-sitter node
fn convert_node(node: Node<'_>, source: &[u8], depth: usize) -> SyntaxNode {
    let tag = if node.is_error() {
        None
    } else {
        Some(tag_for(node))
    };
    let mut converted = SyntaxNode::new(tag, Some(SourceSpan::from(node)));

    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            let field = cursor.field_name().unwrap_or(SyntaxNode::CHILDREN);
            let value = convert_value(cursor.node(), source, depth + 1);
            push_field(&mut converted.fields, field, value);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }

    converted
}

/// Convert any tree-sitter node into a syntax value
fn convert_value(node: Node<'_>, source: &[u8], depth: usize) -> SyntaxValue {
    if let Some(leaf) = convert_leaf(node, source) {
        return leaf.into();
    }
    if depth >= MAX_NESTING {
        tracing::warn!(
            line = node.start_position().row + 1,
            "nesting too deep, keeping tokens only"
        );
        return flatten(node, source).into();
    }
    convert_node(node, source, depth).into()
}

fn convert_leaf(node: Node<'_>, source: &[u8]) -> Option<Leaf> {
    let span = SourceSpan::from(node);

    if node.is_missing() {
        return Some(Leaf::Missing {
            kind: node.kind().to_string(),
            named: node.is_named(),
            span,
        });
    }
    if node.child_count() > 0 {
        return None;
    }

    let text = source
        .get(node.start_byte()..node.end_byte())
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default();
    Some(Leaf::Token {
        kind: node.kind().to_string(),
        text,
        span,
    })
}

/// Untagged placeholder holding every token of `node`, collected without
/// recursion
fn flatten(node: Node<'_>, source: &[u8]) -> SyntaxNode {
    let mut tokens = Vec::new();
    let mut cursor = node.walk();
    'walk: loop {
        let current = cursor.node();
        match convert_leaf(current, source) {
            Some(leaf) => tokens.push(SyntaxValue::from(leaf)),
            None => {
                if cursor.goto_first_child() {
                    continue;
                }
            }
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }

    SyntaxNode::new(None, Some(SourceSpan::from(node)))
        .with_field(SyntaxNode::CHILDREN, SyntaxValue::Sequence(tokens))
}

fn tag_for(node: Node<'_>) -> NodeTag {
    let kind = node.kind();
    let Some(mut function) = classify_tag(kind) else {
        return NodeTag::plain(kind);
    };
    if function == FunctionKind::Method && has_token(node, "*") {
        function = FunctionKind::Generator;
    }
    if has_token(node, "async") {
        function = function.into_async();
    }
    NodeTag::function(kind, function)
}

/// Whether an anonymous `token` is a direct child of `node`
fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let result = node
        .children(&mut cursor)
        .any(|child| !child.is_named() && child.kind() == token);
    result
}

/// Append a child, folding consecutive children of one field into a sequence
fn push_field(fields: &mut Vec<(String, SyntaxValue)>, name: &str, value: SyntaxValue) {
    if let Some((last_name, existing)) = fields.last_mut() {
        if last_name == name {
            match existing {
                SyntaxValue::Sequence(items) => items.push(value),
                single => {
                    let first = std::mem::replace(single, SyntaxValue::Absent);
                    *single = SyntaxValue::Sequence(vec![first, value]);
                }
            }
            return;
        }
    }
    fields.push((name.to_string(), value));
}
