//! Source files and the flattened syntax tree rules walk over
//!
//! A [`SourceFile`] stores its nodes in pre-order, so the node slice doubles as
//! the flattened AST: a rule that only needs to look at every node once can
//! iterate it front to back without recursion.
//!
//! Every node has two starts: `pos` is the full start including leading
//! whitespace and comments, [`Node::start`] is where the first token begins.

use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Error while building a source file
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AstError {
    #[error("Node {0} was opened but never closed")]
    Unclosed(NodeId),

    #[error("Node {0} was closed out of order")]
    Misnested(NodeId),

    #[error("Node {id} spans {pos}..{end}, which is not a valid range in the {len} bytes of '{file}'")]
    OutOfRange {
        id: NodeId,
        pos: usize,
        end: usize,
        len: usize,
        file: String,
    },

    #[error("Node {node} refers to unknown node {target}")]
    UnknownNode { node: NodeId, target: NodeId },
}

/// Index of a node inside its [`SourceFile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A token range, using the same full-start convention as nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub pos: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(pos: usize, end: usize) -> Self {
        Self { pos, end }
    }
}

/// Zero-based line and character of an offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineAndCharacter {
    pub line: usize,
    pub character: usize,
}

/// File name and text of one compilation unit, with a line map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    file_name: String,
    text: String,
    line_starts: Vec<usize>,
}

impl SourceText {
    pub fn new(file_name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            file_name: file_name.into(),
            text,
            line_starts,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Resolve an offset to line and character. Offsets past the end are clamped.
    pub fn line_and_character(&self, pos: usize) -> LineAndCharacter {
        let pos = pos.min(self.text.len());
        let line = self.line_starts.partition_point(|&s| s <= pos) - 1;
        let line_start = self.line_starts[line];
        let character = self
            .text
            .get(line_start..pos)
            .map(|s| s.chars().count())
            .unwrap_or(pos - line_start);
        LineAndCharacter { line, character }
    }
}

/// Syntax kinds rules care about; everything else is [`NodeKind::Other`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// `await <expression>`
    AwaitExpression { expression: NodeId },
    /// `for [await] (<initializer> of <expression>) <statement>`
    ForOfStatement {
        await_modifier: Option<TextRange>,
        initializer: NodeId,
        expression: NodeId,
        statement: NodeId,
    },
    ExpressionStatement { expression: NodeId },
    CallExpression { callee: NodeId },
    Identifier,
    NumericLiteral,
    StringLiteral,
    ArrayLiteral,
    Block,
    VariableDeclarationList,
    Other(String),
}

impl NodeKind {
    pub fn name(&self) -> &str {
        match self {
            NodeKind::AwaitExpression { .. } => "AwaitExpression",
            NodeKind::ForOfStatement { .. } => "ForOfStatement",
            NodeKind::ExpressionStatement { .. } => "ExpressionStatement",
            NodeKind::CallExpression { .. } => "CallExpression",
            NodeKind::Identifier => "Identifier",
            NodeKind::NumericLiteral => "NumericLiteral",
            NodeKind::StringLiteral => "StringLiteral",
            NodeKind::ArrayLiteral => "ArrayLiteral",
            NodeKind::Block => "Block",
            NodeKind::VariableDeclarationList => "VariableDeclarationList",
            NodeKind::Other(name) => name,
        }
    }

    fn references(&self) -> Vec<NodeId> {
        match self {
            NodeKind::AwaitExpression { expression }
            | NodeKind::ExpressionStatement { expression } => vec![*expression],
            NodeKind::CallExpression { callee } => vec![*callee],
            NodeKind::ForOfStatement {
                initializer,
                expression,
                statement,
                ..
            } => vec![*initializer, *expression, *statement],
            _ => Vec::new(),
        }
    }
}

/// A node in the flattened syntax tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Full start, including leading trivia
    pub pos: usize,
    pub end: usize,
    pub parent: Option<NodeId>,
}

impl Node {
    /// Offset of the first token of this node
    pub fn start(&self, file: &SourceFile) -> usize {
        skip_trivia(file.text(), self.pos).min(self.end)
    }
}

/// A parsed compilation unit
#[derive(Debug, Clone)]
pub struct SourceFile {
    source: Arc<SourceText>,
    nodes: Vec<Node>,
}

impl SourceFile {
    /// Start building a source file over the given text
    pub fn builder(file_name: impl Into<String>, text: impl Into<String>) -> SourceFileBuilder {
        SourceFileBuilder::new(SourceText::new(file_name, text))
    }

    pub fn source(&self) -> &Arc<SourceText> {
        &self.source
    }

    pub fn file_name(&self) -> &str {
        self.source.file_name()
    }

    pub fn text(&self) -> &str {
        self.source.text()
    }

    /// All nodes in pre-order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Look up a node. Ids handed out by this file are always valid.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Direct children of a node, in source order
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Node> + '_ {
        self.nodes
            .iter()
            .skip(id.0 + 1)
            .filter(move |n| n.parent == Some(id))
    }

    /// Type declaration files only describe shapes and contain no statements to lint
    pub fn is_declaration_file(&self) -> bool {
        let name = self.file_name();
        [".d.ts", ".d.mts", ".d.cts"]
            .iter()
            .any(|suffix| name.ends_with(suffix))
    }
}

/// Check if a file is written in TypeScript (as opposed to JavaScript)
pub fn is_typescript_file(file: &SourceFile) -> bool {
    Path::new(file.file_name())
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| matches!(ext, "ts" | "tsx" | "mts" | "cts"))
}

/// Skip whitespace and comments starting at `pos`
pub fn skip_trivia(text: &str, mut pos: usize) -> usize {
    let bytes = text.as_bytes();
    while pos < bytes.len() {
        let rest = &text[pos..];
        if let Some(c) = rest.chars().next().filter(|c| c.is_whitespace()) {
            pos += c.len_utf8();
        } else if rest.starts_with("//") {
            pos += rest.find('\n').unwrap_or(rest.len());
        } else if rest.starts_with("/*") {
            pos += rest[2..].find("*/").map(|i| i + 4).unwrap_or(rest.len());
        } else {
            break;
        }
    }
    pos
}

fn is_valid_range(text: &str, pos: usize, end: usize) -> bool {
    pos <= end && end <= text.len() && text.is_char_boundary(pos) && text.is_char_boundary(end)
}

struct Slot {
    pos: usize,
    parent: Option<NodeId>,
    closed: Option<(NodeKind, usize)>,
}

/// Builds a [`SourceFile`] node by node in pre-order.
///
/// Parents are opened before their children and closed after them, so ids
/// referenced by a parent's kind are already known when it is closed.
/// Misuse is recorded and reported by [`SourceFileBuilder::finish`].
pub struct SourceFileBuilder {
    source: SourceText,
    slots: Vec<Slot>,
    stack: Vec<NodeId>,
    error: Option<AstError>,
}

impl SourceFileBuilder {
    fn new(source: SourceText) -> Self {
        Self {
            source,
            slots: Vec::new(),
            stack: Vec::new(),
            error: None,
        }
    }

    /// Open a node starting at `pos`
    pub fn open(&mut self, pos: usize) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Slot {
            pos,
            parent: self.stack.last().copied(),
            closed: None,
        });
        self.stack.push(id);
        id
    }

    /// Close the innermost open node
    pub fn close(&mut self, id: NodeId, kind: NodeKind, end: usize) -> NodeId {
        if self.stack.last() != Some(&id) {
            self.error.get_or_insert(AstError::Misnested(id));
            return id;
        }
        self.stack.pop();
        self.slots[id.0].closed = Some((kind, end));
        id
    }

    /// Add a node without children
    pub fn leaf(&mut self, kind: NodeKind, pos: usize, end: usize) -> NodeId {
        let id = self.open(pos);
        self.close(id, kind, end)
    }

    pub fn finish(self) -> Result<SourceFile, AstError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let len = self.source.len();
        let count = self.slots.len();
        let mut nodes = Vec::with_capacity(count);
        for (i, slot) in self.slots.into_iter().enumerate() {
            let id = NodeId(i);
            let (kind, end) = slot.closed.ok_or(AstError::Unclosed(id))?;
            let modifier = match &kind {
                NodeKind::ForOfStatement {
                    await_modifier: Some(m),
                    ..
                } => Some(*m),
                _ => None,
            };
            let bad_range = [Some(TextRange::new(slot.pos, end)), modifier]
                .into_iter()
                .flatten()
                .find(|r| !is_valid_range(self.source.text(), r.pos, r.end));
            if let Some(range) = bad_range {
                return Err(AstError::OutOfRange {
                    id,
                    pos: range.pos,
                    end: range.end,
                    len,
                    file: self.source.file_name().to_string(),
                });
            }
            if let Some(target) = kind.references().into_iter().find(|t| t.0 >= count) {
                return Err(AstError::UnknownNode { node: id, target });
            }
            nodes.push(Node {
                id,
                kind,
                pos: slot.pos,
                end,
                parent: slot.parent,
            });
        }
        Ok(SourceFile {
            source: Arc::new(self.source),
            nodes,
        })
    }
}
