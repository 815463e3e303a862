//! End-to-end document rendering.
//!
//! [`Pipeline`] wires the content stages together: split frontmatter,
//! parse the markup body, lower the syntax tree to elements, then run
//! the async resolver pass. The pipeline holds no per-document state —
//! one instance renders any number of documents concurrently, and each
//! document's sanitization and probing decisions are its own.

use std::collections::BTreeMap;

use weft_content::{parse, split_frontmatter, to_element_tree, Element};
use weft_core::MetaValue;

use crate::dimensions::DimensionResolver;
use crate::resolver::{resolve_tree, ResolveContext, Resolvers};

/// A fully rendered document: its frontmatter metadata and the resolved
/// element tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub meta: BTreeMap<String, MetaValue>,
    pub tree: Element,
}

/// The full source-text-to-element-tree pipeline.
#[derive(Clone)]
pub struct Pipeline {
    resolvers: Resolvers,
    cx: ResolveContext,
}

impl Pipeline {
    pub fn new(resolvers: Resolvers, dimensions: DimensionResolver) -> Self {
        Self {
            resolvers,
            cx: ResolveContext::new(dimensions),
        }
    }

    /// A pipeline with the standard link/image/code handlers.
    pub fn standard(dimensions: DimensionResolver) -> Self {
        Self::new(Resolvers::standard(), dimensions)
    }

    /// Render one source document.
    pub async fn render(&self, text: &str) -> RenderedDocument {
        let document = split_frontmatter(text);
        let ast = parse(&document.body);
        let tree = to_element_tree(&ast);
        let tree = resolve_tree(tree, &self.resolvers, &self.cx).await;
        RenderedDocument {
            meta: document.meta,
            tree,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::assets::mock::{FixedProbe, MemoryAssetRoot};
    use crate::dimensions::Dimensions;

    fn pipeline(probe: FixedProbe) -> Pipeline {
        Pipeline::standard(DimensionResolver::new(
            Arc::new(MemoryAssetRoot::new()),
            Arc::new(probe),
        ))
    }

    fn find<'a>(element: &'a Element, tag: &str) -> Option<&'a Element> {
        if element.tag == tag {
            return Some(element);
        }
        element.children.iter().find_map(|child| find(child, tag))
    }

    #[tokio::test]
    async fn test_render_full_document() {
        let source = "---\n\
                      title: Hello\n\
                      tags: [a, b]\n\
                      ---\n\
                      # Hello World\n\n\
                      A [safe](/within) link and a\n\
                      [bad](javascript:alert(1)) one.\n";
        let rendered = pipeline(FixedProbe::failing()).render(source).await;

        assert_eq!(
            rendered.meta.get("title").and_then(MetaValue::as_text),
            Some("Hello")
        );
        let heading = find(&rendered.tree, "h1").unwrap();
        assert_eq!(heading.attr_str("id"), Some("hello-world"));

        let link = find(&rendered.tree, "a").unwrap();
        assert_eq!(link.attr_str("href"), Some("/within"));

        let blocked = find(&rendered.tree, "span").unwrap();
        assert_eq!(blocked.attrs.get("data-blocked-href"), Some(&json!(true)));
        assert_eq!(blocked.children[0].text_value(), Some("bad"));
    }

    #[tokio::test]
    async fn test_render_without_frontmatter() {
        let rendered = pipeline(FixedProbe::failing()).render("just a paragraph").await;
        assert!(rendered.meta.is_empty());
        assert!(find(&rendered.tree, "p").is_some());
    }

    #[tokio::test]
    async fn test_images_measured_through_pipeline() {
        let rendered = pipeline(FixedProbe::answering(Dimensions::new(640, 480)))
            .render("![chart](https://example.com/chart.png)")
            .await;

        let frame = find(&rendered.tree, "frame").unwrap();
        assert_eq!(frame.attrs.get("width"), Some(&json!(640)));
        assert_eq!(frame.attrs.get("height"), Some(&json!(480)));
        assert_eq!(frame.children[0].attr_str("alt"), Some("chart"));
    }

    #[tokio::test]
    async fn test_extreme_nesting_renders_and_drops() {
        // A single hostile line of 50k quote markers must render and
        // drop without touching stack depth.
        let source = format!("{}still here\n", "> ".repeat(50_000));
        let rendered = pipeline(FixedProbe::failing()).render(&source).await;
        assert_eq!(rendered.tree.tag, "document");
        drop(rendered);
    }

    #[tokio::test]
    async fn test_concurrent_documents_stay_independent() {
        // Two documents with different unsafe references rendered at
        // once: each output must reflect only its own input.
        let pipeline = pipeline(FixedProbe::failing());
        let first = "[one](javascript:alert('one')) and [ok](/first)";
        let second = "[two](vbscript:msgbox('two')) and [ok](/second)";

        let (a, b) = tokio::join!(pipeline.render(first), pipeline.render(second));

        let a_link = find(&a.tree, "a").unwrap();
        let b_link = find(&b.tree, "a").unwrap();
        assert_eq!(a_link.attr_str("href"), Some("/first"));
        assert_eq!(b_link.attr_str("href"), Some("/second"));

        let a_blocked = find(&a.tree, "span").unwrap();
        let b_blocked = find(&b.tree, "span").unwrap();
        assert_eq!(a_blocked.children[0].text_value(), Some("one"));
        assert_eq!(b_blocked.children[0].text_value(), Some("two"));
    }
}
