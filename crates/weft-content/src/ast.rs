//! Arena-backed abstract syntax tree.
//!
//! Nodes live in a flat `Vec` and reference each other by index, so tree
//! walks are explicit loops over indices instead of pointer recursion.
//! Parents are always allocated before their children, which gives every
//! bottom-up pass a simple reverse-index iteration order.

use serde::Serialize;

/// Index of a node within an [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId(pub usize);

/// Per-column table alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    None,
    Left,
    Center,
    Right,
}

/// The kind of a syntax node, with kind-specific attributes.
///
/// Container kinds carry their children in the owning [`AstNode`]; leaf
/// kinds carry a text payload here instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeKind {
    /// Root of a parsed body.
    Document,
    /// Heading with level 1-6 and a slug id.
    Heading { level: u8, id: String },
    Paragraph,
    BlockQuote,
    /// Ordered or unordered list; ordered lists carry a start index.
    List { start: Option<u64> },
    /// List item, with task-checkbox state when present.
    ListItem { checked: Option<bool> },
    /// Table with per-column alignment; the alignment row fixes the
    /// column count for every row.
    Table { alignments: Vec<Align> },
    TableHead,
    TableRow,
    TableCell,
    /// Fenced or indented code block with its literal text.
    CodeBlock { language: String, literal: String },
    ThematicBreak,
    Emphasis,
    Strong,
    Strikethrough,
    Link { href: String, title: String },
    Image { src: String, title: String },
    /// Inline code span.
    CodeSpan(String),
    /// Plain text run.
    Text(String),
    /// Raw HTML-like markup, preserved opaquely and never re-parsed.
    RawMarkup(String),
    SoftBreak,
    HardBreak,
}

/// A single node: its kind plus ordered children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AstNode {
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
}

/// The arena holding a parsed document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ast {
    nodes: Vec<AstNode>,
}

impl Ast {
    /// Create an arena holding only a document root.
    pub fn new() -> Self {
        Self {
            nodes: vec![AstNode {
                kind: NodeKind::Document,
                children: Vec::new(),
            }],
        }
    }

    /// The document root.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds only the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Allocate a node and attach it to `parent`, returning its id.
    pub fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(AstNode {
            kind,
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Allocate a detached node (no parent link).
    pub fn push_detached(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(AstNode {
            kind,
            children: Vec::new(),
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &AstNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut AstNode {
        &mut self.nodes[id.0]
    }

    /// Concatenated text content of a subtree, in document order.
    ///
    /// Walks with an explicit stack; inline code contributes its literal,
    /// soft breaks contribute a space.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.node(current);
            match &node.kind {
                NodeKind::Text(text) | NodeKind::CodeSpan(text) => out.push_str(text),
                NodeKind::SoftBreak => out.push(' '),
                _ => {}
            }
            // Push in reverse so children pop in document order.
            for child in node.children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }
}
