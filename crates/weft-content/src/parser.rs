//! Markup parser: body text → arena AST.
//!
//! Folds the pulldown-cmark event stream into an [`Ast`] with an explicit
//! open-node stack, so arbitrarily deep input never recurses. Tables,
//! strikethrough, and task lists are enabled; raw HTML blocks and inlines
//! are captured as opaque [`NodeKind::RawMarkup`] leaves and never
//! re-parsed.
//!
//! Two behaviors are layered on top of the grammar crate:
//!
//! - bare `http(s)://` URLs in plain text runs are autolinked by a regex
//!   post-split (the grammar crate only links angle-bracket autolinks)
//! - headings without an explicit `{#id}` get a slug id derived from
//!   their text
//!
//! Table rows are normalized at parse time: the header-separator row
//! fixes the column count, short rows are padded with empty cells, and
//! excess cells are dropped.

use std::sync::LazyLock;

use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use regex::Regex;
use weft_core::slugify;

use crate::ast::{Align, Ast, NodeId, NodeKind};

static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s<>]+").expect("bare URL pattern compiles"));

/// Parse markup body text into an AST.
///
/// Never fails: anomalous input produces a smaller tree, not an error.
/// An unterminated code fence consumes to end of input.
pub fn parse(body: &str) -> Ast {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);

    let mut builder = TreeBuilder::new();
    for event in Parser::new_ext(body, options) {
        builder.handle(event);
    }
    builder.finish()
}

struct TreeBuilder {
    ast: Ast,
    stack: Vec<NodeId>,
}

impl TreeBuilder {
    fn new() -> Self {
        let ast = Ast::new();
        let root = ast.root();
        Self {
            ast,
            stack: vec![root],
        }
    }

    fn finish(self) -> Ast {
        self.ast
    }

    fn top(&self) -> NodeId {
        *self.stack.last().expect("root never pops")
    }

    fn open(&mut self, kind: NodeKind) {
        let id = self.ast.push(self.top(), kind);
        self.stack.push(id);
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => self.end(),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                self.ast.push(self.top(), NodeKind::CodeSpan(code.to_string()));
            }
            Event::Html(html) | Event::InlineHtml(html) => self.raw(&html),
            Event::SoftBreak => {
                self.ast.push(self.top(), NodeKind::SoftBreak);
            }
            Event::HardBreak => {
                self.ast.push(self.top(), NodeKind::HardBreak);
            }
            Event::Rule => {
                self.ast.push(self.top(), NodeKind::ThematicBreak);
            }
            Event::TaskListMarker(checked) => self.mark_task(checked),
            // Footnotes and math are not enabled; nothing else reaches here.
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let kind = match tag {
            Tag::Paragraph => NodeKind::Paragraph,
            Tag::Heading { level, id, .. } => NodeKind::Heading {
                level: heading_level(level),
                id: id.map(|s| s.to_string()).unwrap_or_default(),
            },
            Tag::BlockQuote(_) => NodeKind::BlockQuote,
            Tag::CodeBlock(fence) => NodeKind::CodeBlock {
                language: match fence {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().unwrap_or("").to_string()
                    }
                    CodeBlockKind::Indented => String::new(),
                },
                literal: String::new(),
            },
            Tag::HtmlBlock => NodeKind::RawMarkup(String::new()),
            Tag::List(start) => NodeKind::List { start },
            Tag::Item => NodeKind::ListItem { checked: None },
            Tag::Table(alignments) => NodeKind::Table {
                alignments: alignments.iter().map(|a| align(*a)).collect(),
            },
            Tag::TableHead => NodeKind::TableHead,
            Tag::TableRow => NodeKind::TableRow,
            Tag::TableCell => NodeKind::TableCell,
            Tag::Emphasis => NodeKind::Emphasis,
            Tag::Strong => NodeKind::Strong,
            Tag::Strikethrough => NodeKind::Strikethrough,
            Tag::Link {
                dest_url, title, ..
            } => NodeKind::Link {
                href: dest_url.to_string(),
                title: title.to_string(),
            },
            Tag::Image {
                dest_url, title, ..
            } => NodeKind::Image {
                src: dest_url.to_string(),
                title: title.to_string(),
            },
            // Containers this pipeline does not model become transparent
            // paragraphs so their content is never dropped.
            _ => NodeKind::Paragraph,
        };
        self.open(kind);
    }

    fn end(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        let closed = self.stack.pop().expect("checked non-root");

        let needs_slug = matches!(
            &self.ast.node(closed).kind,
            NodeKind::Heading { id, .. } if id.is_empty()
        );
        if needs_slug {
            let slug = slugify(&self.ast.text_content(closed));
            if let NodeKind::Heading { id, .. } = &mut self.ast.node_mut(closed).kind {
                *id = slug;
            }
        }

        let table_columns = match &self.ast.node(closed).kind {
            NodeKind::Table { alignments } => Some(alignments.len()),
            _ => None,
        };
        if let Some(columns) = table_columns {
            self.normalize_table(closed, columns);
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let top = self.top();
        if let NodeKind::CodeBlock { literal, .. } | NodeKind::RawMarkup(literal) =
            &mut self.ast.node_mut(top).kind
        {
            literal.push_str(text);
            return;
        }
        if self.autolink_allowed() {
            self.linkified_text(text);
        } else {
            self.ast.push(top, NodeKind::Text(text.to_string()));
        }
    }

    fn raw(&mut self, html: &str) {
        let top = self.top();
        if let NodeKind::RawMarkup(literal) = &mut self.ast.node_mut(top).kind {
            literal.push_str(html);
        } else {
            self.ast.push(top, NodeKind::RawMarkup(html.to_string()));
        }
    }

    /// Bare URLs are linkified only outside links, images, and headings'
    /// own link context; the open stack tells us where we are.
    fn autolink_allowed(&self) -> bool {
        !self.stack.iter().any(|id| {
            matches!(
                self.ast.node(*id).kind,
                NodeKind::Link { .. } | NodeKind::Image { .. }
            )
        })
    }

    /// Split a text run around bare URLs, emitting interleaved text and
    /// link nodes in document order.
    fn linkified_text(&mut self, text: &str) {
        let top = self.top();
        let mut cursor = 0;
        for found in BARE_URL.find_iter(text) {
            let url = trim_trailing_punctuation(found.as_str());
            if url.is_empty() {
                continue;
            }
            if found.start() > cursor {
                self.ast
                    .push(top, NodeKind::Text(text[cursor..found.start()].to_string()));
            }
            let link = self.ast.push(
                top,
                NodeKind::Link {
                    href: url.to_string(),
                    title: String::new(),
                },
            );
            self.ast.push(link, NodeKind::Text(url.to_string()));
            cursor = found.start() + url.len();
        }
        if cursor < text.len() {
            self.ast
                .push(top, NodeKind::Text(text[cursor..].to_string()));
        }
    }

    fn mark_task(&mut self, state: bool) {
        for id in self.stack.iter().rev() {
            if let NodeKind::ListItem { .. } = self.ast.node(*id).kind {
                self.ast.node_mut(*id).kind = NodeKind::ListItem {
                    checked: Some(state),
                };
                return;
            }
        }
    }

    /// Pad short rows with empty cells and drop excess cells so every row
    /// matches the column count fixed by the separator row.
    fn normalize_table(&mut self, table: NodeId, columns: usize) {
        let rows = self.ast.node(table).children.clone();
        for row in rows {
            if !matches!(
                self.ast.node(row).kind,
                NodeKind::TableHead | NodeKind::TableRow
            ) {
                continue;
            }
            while self.ast.node(row).children.len() < columns {
                let cell = self.ast.push_detached(NodeKind::TableCell);
                self.ast.node_mut(row).children.push(cell);
            }
            self.ast.node_mut(row).children.truncate(columns);
        }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn align(alignment: Alignment) -> Align {
    match alignment {
        Alignment::None => Align::None,
        Alignment::Left => Align::Left,
        Alignment::Center => Align::Center,
        Alignment::Right => Align::Right,
    }
}

/// GFM-style autolinks exclude trailing sentence punctuation, and a
/// closing paren only counts when the URL itself opened one.
fn trim_trailing_punctuation(url: &str) -> &str {
    let mut end = url.len();
    loop {
        let trimmed = &url[..end];
        let Some(last) = trimmed.chars().last() else {
            break;
        };
        let drop = match last {
            '.' | ',' | ';' | ':' | '!' | '?' | '"' | '\'' => true,
            ')' => {
                trimmed.matches('(').count() < trimmed.matches(')').count()
            }
            _ => false,
        };
        if !drop {
            break;
        }
        end -= last.len_utf8();
    }
    &url[..end]
}
