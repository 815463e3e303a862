//! Tag-keyed element resolution.
//!
//! A [`Resolvers`] registry maps element tags to handlers that turn
//! generic elements into final render nodes. The registry is an
//! explicitly constructed value passed into every resolution call —
//! substituting a handler affects exactly that call, nothing global.
//!
//! Resolution is bottom-up: the tree is flattened into an index arena and
//! walked deepest level first, so an element's children are fully resolved
//! (including any async probing) before its own handler runs, and document
//! depth never touches the call stack. Nodes within a level resolve
//! through an order-preserving bounded-concurrency stream, so completion
//! order never reorders the output tree. Unregistered tags fall through
//! untouched; content is never dropped for lack of a handler.

use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::{json, Map, Value};

use weft_content::Element;

use crate::dimensions::DimensionResolver;
use crate::sanitize::sanitize_url_value;

/// How many handlers run concurrently within one tree level.
const CHILD_CONCURRENCY: usize = 8;

/// Shared context handed to every handler.
#[derive(Clone)]
pub struct ResolveContext {
    /// Dimension resolution for image elements.
    pub dimensions: DimensionResolver,
}

impl ResolveContext {
    pub fn new(dimensions: DimensionResolver) -> Self {
        Self { dimensions }
    }
}

/// A handler for one element tag.
///
/// Receives the element with its children already resolved, and returns
/// the final render node.
#[async_trait]
pub trait ElementResolver: Send + Sync {
    async fn resolve(&self, element: Element, cx: &ResolveContext) -> Element;
}

/// An injected tag → handler mapping.
#[derive(Clone, Default)]
pub struct Resolvers {
    handlers: HashMap<String, Arc<dyn ElementResolver>>,
}

impl Resolvers {
    /// An empty registry: every tag resolves to itself.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard registry: links, images, and code blocks.
    pub fn standard() -> Self {
        Self::empty()
            .with("a", Arc::new(LinkResolver))
            .with("img", Arc::new(ImageResolver))
            .with("pre", Arc::new(CodeBlockResolver))
    }

    /// Builder-style handler registration; replaces any existing handler
    /// for `tag`.
    pub fn with(mut self, tag: &str, handler: Arc<dyn ElementResolver>) -> Self {
        self.handlers.insert(tag.to_string(), handler);
        self
    }

    fn get(&self, tag: &str) -> Option<&Arc<dyn ElementResolver>> {
        self.handlers.get(tag)
    }
}

/// Resolve a full element tree bottom-up.
///
/// Children resolve before parents and re-assemble in document order.
/// Iterative over an index arena: arbitrarily deep input cannot overflow
/// the stack.
pub async fn resolve_tree(
    element: Element,
    resolvers: &Resolvers,
    cx: &ResolveContext,
) -> Element {
    struct Slot {
        tag: String,
        attrs: Map<String, Value>,
        children: Vec<usize>,
    }

    // Flatten into the arena; parents take lower indices than their
    // children, and every node registers with its depth level.
    let mut arena: Vec<Slot> = Vec::new();
    let mut levels: Vec<Vec<usize>> = Vec::new();
    let mut stack: Vec<(Element, usize, Option<usize>)> = vec![(element, 0, None)];
    while let Some((mut node, depth, parent)) = stack.pop() {
        let id = arena.len();
        arena.push(Slot {
            tag: mem::take(&mut node.tag),
            attrs: mem::take(&mut node.attrs),
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            arena[parent].children.push(id);
        }
        if levels.len() <= depth {
            levels.push(Vec::new());
        }
        levels[depth].push(id);
        // Reverse push keeps document order under the pop above.
        let children = mem::take(&mut node.children);
        for child in children.into_iter().rev() {
            stack.push((child, depth + 1, Some(id)));
        }
    }

    // Deepest level first: every node's children are finished before its
    // own handler runs. `buffered` polls up to CHILD_CONCURRENCY handlers
    // at once within a level but yields results in submission order.
    let mut built: Vec<Option<Element>> = Vec::new();
    built.resize_with(arena.len(), || None);
    for level in levels.iter().rev() {
        let mut pending = Vec::with_capacity(level.len());
        for &id in level {
            let slot = &mut arena[id];
            let mut element = Element::new(mem::take(&mut slot.tag));
            element.attrs = mem::take(&mut slot.attrs);
            element.children = slot
                .children
                .iter()
                .map(|child| {
                    built[*child]
                        .take()
                        .expect("child level resolved before parent level")
                })
                .collect();
            pending.push((id, element));
        }

        let resolved: Vec<(usize, Element)> =
            stream::iter(pending.into_iter().map(|(id, element)| async move {
                match resolvers.get(&element.tag) {
                    Some(handler) => (id, handler.resolve(element, cx).await),
                    None => (id, element),
                }
            }))
            .buffered(CHILD_CONCURRENCY)
            .collect()
            .await;
        for (id, element) in resolved {
            built[id] = Some(element);
        }
    }

    built[0].take().expect("root is always resolved")
}

// ============================================================================
// Standard handlers
// ============================================================================

/// Sanitizes `href`; rejected links degrade to an inert wrapper that
/// keeps the child content, accepted external links get out-of-context
/// navigation attributes.
pub struct LinkResolver;

#[async_trait]
impl ElementResolver for LinkResolver {
    async fn resolve(&self, mut element: Element, _cx: &ResolveContext) -> Element {
        let href = element
            .attrs
            .get("href")
            .and_then(|value| sanitize_url_value(value));

        let Some(href) = href else {
            let mut inert = Element::new("span").with_attr("data-blocked-href", json!(true));
            inert.children = mem::take(&mut element.children);
            return inert;
        };

        let lower = href.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            element.attrs.insert("href".into(), Value::String(href));
            element.attrs.insert("external".into(), json!(true));
            element.attrs.insert("target".into(), json!("_blank"));
            element
                .attrs
                .insert("rel".into(), json!("noopener noreferrer"));
        } else {
            element.attrs.insert("href".into(), Value::String(href));
        }
        element
    }
}

/// Sanitizes `src` and resolves intrinsic dimensions; measured images are
/// wrapped in a fixed-aspect-ratio frame so they never reflow the layout.
pub struct ImageResolver;

#[async_trait]
impl ElementResolver for ImageResolver {
    async fn resolve(&self, mut element: Element, cx: &ResolveContext) -> Element {
        let src = element
            .attrs
            .get("src")
            .and_then(|value| sanitize_url_value(value));

        let Some(src) = src else {
            let mut inert = Element::new("span").with_attr("data-blocked-src", json!(true));
            if let Some(alt) = element.attr_str("alt") {
                if !alt.is_empty() {
                    inert.children.push(Element::text(alt));
                }
            }
            return inert;
        };
        element.attrs.insert("src".into(), Value::String(src.clone()));

        // Author-declared dimensions take precedence over probing.
        let declared = element.attrs.contains_key("width") && element.attrs.contains_key("height");
        if declared {
            return element;
        }

        match cx.dimensions.resolve(&src).await {
            Some(dims) => {
                element.attrs.insert("width".into(), json!(dims.width));
                element.attrs.insert("height".into(), json!(dims.height));
                Element::new("frame")
                    .with_attr("width", json!(dims.width))
                    .with_attr("height", json!(dims.height))
                    .with_attr("aspect-ratio", json!(dims.aspect_ratio()))
                    .with_child(element)
            }
            // Unmeasured fallback: the image still renders, it just
            // cannot reserve layout space.
            None => element,
        }
    }
}

/// Lifts a `pre` element into a structured `code-block` with `language`
/// and `code` attrs; anything shaped unexpectedly passes through as-is.
pub struct CodeBlockResolver;

#[async_trait]
impl ElementResolver for CodeBlockResolver {
    async fn resolve(&self, element: Element, _cx: &ResolveContext) -> Element {
        let code = match element.children.as_slice() {
            [only] => only.text_value(),
            _ => None,
        };
        let Some(code) = code else {
            return element;
        };

        Element::new("code-block")
            .with_attr("language", element.attr_str("lang").unwrap_or("").to_string())
            .with_attr("code", code.to_string())
    }
}
