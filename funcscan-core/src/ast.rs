//! Generic syntax tree produced by the tolerant parser
//!
//! The extractor never looks at grammar-specific structure. It only sees
//! this small tagged union: nodes with ordered named fields, sequences,
//! leaves and absent values. Grammar vocabulary is confined to the parser
//! adapter, which attaches a [`FunctionKind`] to tags it recognizes.

use crate::language::SourceSpan;
use serde::{Deserialize, Serialize};

/// Closed set of function-like node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionKind {
    #[serde(rename = "FunctionDeclaration")]
    Declaration,
    #[serde(rename = "AsyncFunctionDeclaration")]
    AsyncDeclaration,
    #[serde(rename = "FunctionExpression")]
    Expression,
    #[serde(rename = "AsyncFunctionExpression")]
    AsyncExpression,
    #[serde(rename = "ArrowFunctionExpression")]
    Arrow,
    #[serde(rename = "AsyncArrowFunctionExpression")]
    AsyncArrow,
    #[serde(rename = "GeneratorFunction")]
    Generator,
    #[serde(rename = "AsyncGeneratorFunction")]
    AsyncGenerator,
    #[serde(rename = "MethodDefinition")]
    Method,
    #[serde(rename = "AsyncMethodDefinition")]
    AsyncMethod,
    #[serde(rename = "FunctionSignature")]
    Signature,
}

impl FunctionKind {
    /// Report name of the kind (the `nodeType` field)
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionKind::Declaration => "FunctionDeclaration",
            FunctionKind::AsyncDeclaration => "AsyncFunctionDeclaration",
            FunctionKind::Expression => "FunctionExpression",
            FunctionKind::AsyncExpression => "AsyncFunctionExpression",
            FunctionKind::Arrow => "ArrowFunctionExpression",
            FunctionKind::AsyncArrow => "AsyncArrowFunctionExpression",
            FunctionKind::Generator => "GeneratorFunction",
            FunctionKind::AsyncGenerator => "AsyncGeneratorFunction",
            FunctionKind::Method => "MethodDefinition",
            FunctionKind::AsyncMethod => "AsyncMethodDefinition",
            FunctionKind::Signature => "FunctionSignature",
        }
    }

    /// Async counterpart of this kind
    ///
    /// Kinds without an async form are returned unchanged.
    pub fn into_async(self) -> Self {
        match self {
            FunctionKind::Declaration => FunctionKind::AsyncDeclaration,
            FunctionKind::Expression => FunctionKind::AsyncExpression,
            FunctionKind::Arrow => FunctionKind::AsyncArrow,
            FunctionKind::Generator => FunctionKind::AsyncGenerator,
            FunctionKind::Method => FunctionKind::AsyncMethod,
            other => other,
        }
    }

    pub fn is_async(&self) -> bool {
        matches!(
            self,
            FunctionKind::AsyncDeclaration
                | FunctionKind::AsyncExpression
                | FunctionKind::AsyncArrow
                | FunctionKind::AsyncGenerator
                | FunctionKind::AsyncMethod
        )
    }
}

impl std::fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type tag of a node: the raw grammar kind plus its function classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTag {
    pub kind: String,
    pub function: Option<FunctionKind>,
}

impl NodeTag {
    /// Tag for a node that is not function-like
    pub fn plain(kind: impl Into<String>) -> Self {
        NodeTag {
            kind: kind.into(),
            function: None,
        }
    }

    /// Tag for a function-like node
    pub fn function(kind: impl Into<String>, function: FunctionKind) -> Self {
        NodeTag {
            kind: kind.into(),
            function: Some(function),
        }
    }
}

/// Terminal value of the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Leaf {
    /// Token present in the source
    Token {
        kind: String,
        text: String,
        span: SourceSpan,
    },
    /// Token the parser expected but did not find
    ///
    /// Anonymous tokens (punctuation, keywords) carry their own text as
    /// `kind`; named ones (identifiers, literals) have no recoverable text.
    Missing {
        kind: String,
        named: bool,
        span: SourceSpan,
    },
}

impl Leaf {
    pub fn span(&self) -> SourceSpan {
        match self {
            Leaf::Token { span, .. } | Leaf::Missing { span, .. } => *span,
        }
    }
}

/// Composite node with ordered named fields
///
/// Fields keep source order. Children without a grammar field name are
/// stored under [`SyntaxNode::CHILDREN`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    /// `None` for placeholders synthesized by error recovery
    pub tag: Option<NodeTag>,
    pub span: Option<SourceSpan>,
    pub fields: Vec<(String, SyntaxValue)>,
}

impl SyntaxNode {
    /// Field name used for children the grammar does not name
    pub const CHILDREN: &'static str = "children";

    pub fn new(tag: Option<NodeTag>, span: Option<SourceSpan>) -> Self {
        SyntaxNode {
            tag,
            span,
            fields: Vec::new(),
        }
    }

    /// Builder-style field append
    pub fn with_field(mut self, name: impl Into<String>, value: SyntaxValue) -> Self {
        self.fields.push((name.into(), value));
        self
    }

    /// Empty placeholder standing in for a tree the parser could not build
    pub fn placeholder() -> Self {
        SyntaxNode::new(None, None).with_field(Self::CHILDREN, SyntaxValue::Absent)
    }

    pub fn function_kind(&self) -> Option<FunctionKind> {
        self.tag.as_ref().and_then(|tag| tag.function)
    }

    pub fn is_placeholder(&self) -> bool {
        self.tag.is_none()
    }

    /// First value stored under `name`
    pub fn field(&self, name: &str) -> Option<&SyntaxValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}

/// Any value reachable from a syntax tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxValue {
    Node(SyntaxNode),
    Sequence(Vec<SyntaxValue>),
    Leaf(Leaf),
    Absent,
}

impl From<SyntaxNode> for SyntaxValue {
    fn from(node: SyntaxNode) -> Self {
        SyntaxValue::Node(node)
    }
}

impl From<Leaf> for SyntaxValue {
    fn from(leaf: Leaf) -> Self {
        SyntaxValue::Leaf(leaf)
    }
}
