//! Tree transformer: AST → generic element tree.
//!
//! Lowers the grammar-specific [`Ast`] into [`Element`] nodes keyed by
//! canonical tags (`h2`, `a`, `pre`, ...) with JSON-valued attributes. The
//! lowering is lossless and order-preserving: every AST node produces an
//! element, and children stay in document order.
//!
//! The walk is a reverse-index pass over the arena (parents are always
//! allocated before children), so deeply nested input never grows the call
//! stack.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::ast::{Align, Ast, NodeId, NodeKind};

/// A grammar-agnostic presentation element.
///
/// Also the output shape of resolution: handlers consume and produce this
/// same type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub tag: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}

impl Element {
    /// An element with no attributes or children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Map::new(),
            children: Vec::new(),
        }
    }

    /// A `text` leaf carrying its payload in the `value` attr.
    pub fn text(value: impl Into<String>) -> Self {
        Self::new("text").with_attr("value", Value::String(value.into()))
    }

    /// Builder-style attribute insertion.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Builder-style child append.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// String attribute accessor.
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    /// The text payload, if this is a `text` leaf.
    pub fn text_value(&self) -> Option<&str> {
        if self.tag == "text" {
            self.attr_str("value")
        } else {
            None
        }
    }
}

// Children drain through an explicit worklist so dropping an arbitrarily
// deep tree never exhausts the stack.
impl Drop for Element {
    fn drop(&mut self) {
        if self.children.is_empty() {
            return;
        }
        let mut queue = std::mem::take(&mut self.children);
        while let Some(mut element) = queue.pop() {
            queue.append(&mut element.children);
        }
    }
}

/// Lower an AST into its element tree, rooted at a `document` element.
pub fn to_element_tree(ast: &Ast) -> Element {
    // Children carry higher indices than parents, so one reverse pass
    // builds every subtree before the node that needs it.
    let mut built: Vec<Option<Element>> = Vec::with_capacity(ast.len());
    built.resize_with(ast.len(), || None);

    for index in (0..ast.len()).rev() {
        let id = NodeId(index);
        let node = ast.node(id);
        let children: Vec<Element> = node
            .children
            .iter()
            .map(|child| {
                built[child.0]
                    .take()
                    .expect("child built before parent in reverse pass")
            })
            .collect();
        built[index] = Some(lower(ast, id, children));
    }

    built[0].take().expect("root is always built")
}

fn lower(ast: &Ast, id: NodeId, children: Vec<Element>) -> Element {
    let node = ast.node(id);
    let mut element = match &node.kind {
        NodeKind::Document => Element::new("document"),
        NodeKind::Heading { level, id } => {
            let mut el = Element::new(format!("h{}", level));
            if !id.is_empty() {
                el = el.with_attr("id", id.clone());
            }
            el
        }
        NodeKind::Paragraph => Element::new("p"),
        NodeKind::BlockQuote => Element::new("blockquote"),
        NodeKind::List { start: None } => Element::new("ul"),
        NodeKind::List { start: Some(start) } => {
            Element::new("ol").with_attr("start", json!(start))
        }
        NodeKind::ListItem { checked } => {
            let mut el = Element::new("li");
            if let Some(state) = checked {
                el = el.with_attr("checked", json!(state));
            }
            el
        }
        NodeKind::Table { alignments } => Element::new("table").with_attr(
            "align",
            Value::Array(
                alignments
                    .iter()
                    .map(|a| Value::String(align_name(*a).to_string()))
                    .collect(),
            ),
        ),
        NodeKind::TableHead => Element::new("thead"),
        NodeKind::TableRow => Element::new("tr"),
        NodeKind::TableCell => Element::new("td"),
        NodeKind::CodeBlock { language, literal } => {
            let mut el = Element::new("pre");
            if !language.is_empty() {
                el = el.with_attr("lang", language.clone());
            }
            return el.with_child(Element::text(literal.clone()));
        }
        NodeKind::ThematicBreak => Element::new("hr"),
        NodeKind::Emphasis => Element::new("em"),
        NodeKind::Strong => Element::new("strong"),
        NodeKind::Strikethrough => Element::new("del"),
        NodeKind::Link { href, title } => {
            let mut el = Element::new("a").with_attr("href", href.clone());
            if !title.is_empty() {
                el = el.with_attr("title", title.clone());
            }
            el
        }
        NodeKind::Image { src, title } => {
            // Alt content lowers to an attribute; the original inline
            // nodes survive as the element's children for resolvers that
            // need them.
            let mut el = Element::new("img")
                .with_attr("src", src.clone())
                .with_attr("alt", ast.text_content(id));
            if !title.is_empty() {
                el = el.with_attr("title", title.clone());
            }
            el
        }
        NodeKind::CodeSpan(code) => {
            return Element::new("code").with_child(Element::text(code.clone()));
        }
        NodeKind::Text(text) => return Element::text(text.clone()),
        NodeKind::RawMarkup(markup) => {
            return Element::new("raw").with_attr("value", markup.clone());
        }
        NodeKind::SoftBreak => return Element::text(" "),
        NodeKind::HardBreak => Element::new("br"),
    };
    element.children = children;
    element
}

fn align_name(align: Align) -> &'static str {
    match align {
        Align::None => "none",
        Align::Left => "left",
        Align::Center => "center",
        Align::Right => "right",
    }
}
