//! Frontmatter splitting.
//!
//! Separates a leading `---`-fenced metadata block from the document body.
//! The dialect is deliberately small: one `key: value` pair per line, with
//! double- or single-quoted strings, bracketed string lists, bare numbers,
//! and bare `YYYY-MM-DD` dates.
//!
//! The splitter never fails. Any anomaly — no closing fence, a line that
//! is not a key/value pair, an empty key — degrades to empty metadata with
//! the *entire original text* as the body, so no author content is ever
//! dropped.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use weft_core::MetaValue;

/// A parsed input document: metadata plus body text.
///
/// Constructed once per input and immutable thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Metadata from the leading frontmatter block, empty if absent.
    pub meta: BTreeMap<String, MetaValue>,
    /// Markup body following the block (or the whole input).
    pub body: String,
}

impl Document {
    fn body_only(text: &str) -> Self {
        Self {
            meta: BTreeMap::new(),
            body: text.to_string(),
        }
    }
}

const FENCE: &str = "---";

/// Split a leading frontmatter block from `text`.
///
/// Returns the parsed metadata and the remaining body. Inputs without a
/// frontmatter block come back unchanged:
///
/// ```
/// use weft_content::frontmatter::split_frontmatter;
///
/// let doc = split_frontmatter("plain text, no block");
/// assert!(doc.meta.is_empty());
/// assert_eq!(doc.body, "plain text, no block");
/// ```
pub fn split_frontmatter(text: &str) -> Document {
    let Some(rest) = text.strip_prefix(FENCE) else {
        return Document::body_only(text);
    };
    // The opening fence must be a full line.
    let rest = rest.strip_prefix('\r').unwrap_or(rest);
    let Some(rest) = rest.strip_prefix('\n') else {
        return Document::body_only(text);
    };

    let Some((block, body)) = split_at_closing_fence(rest) else {
        return Document::body_only(text);
    };

    let mut meta = BTreeMap::new();
    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = parse_line(line) else {
            return Document::body_only(text);
        };
        meta.insert(key, value);
    }

    Document {
        meta,
        body: body.strip_prefix('\n').unwrap_or(body).to_string(),
    }
}

/// Splits the text after the opening fence into (block, body after the
/// closing fence line). Returns `None` when no closing fence exists.
fn split_at_closing_fence(rest: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == FENCE {
            let body_start = offset + line.len();
            return Some((&rest[..offset], &rest[body_start..]));
        }
        offset += line.len();
    }
    None
}

fn parse_line(line: &str) -> Option<(String, MetaValue)> {
    let (key, raw) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    let value = parse_value(raw.trim())?;
    Some((key.to_string(), value))
}

fn parse_value(raw: &str) -> Option<MetaValue> {
    if raw.is_empty() {
        return None;
    }

    if let Some(inner) = unquote(raw) {
        return Some(MetaValue::Text(inner.to_string()));
    }

    if let Some(inner) = raw.strip_prefix('[') {
        let inner = inner.strip_suffix(']')?;
        let items = inner
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| unquote(item).unwrap_or(item).to_string())
            .collect();
        return Some(MetaValue::List(items));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(MetaValue::Date(date));
    }

    if let Ok(number) = raw.parse::<f64>() {
        return Some(MetaValue::Number(number));
    }

    Some(MetaValue::Text(raw.to_string()))
}

fn unquote(raw: &str) -> Option<&str> {
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Some(&raw[1..raw.len() - 1]);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_frontmatter_is_identity() {
        let text = "# Just a heading\n\nAnd a paragraph.";
        let doc = split_frontmatter(text);
        assert!(doc.meta.is_empty());
        assert_eq!(doc.body, text);
    }

    #[test]
    fn test_basic_block() {
        let text = "---\ntitle: \"Hello\"\ndraft: false\n---\n\nBody here.";
        let doc = split_frontmatter(text);
        assert_eq!(doc.meta["title"], MetaValue::Text("Hello".into()));
        assert_eq!(doc.meta["draft"], MetaValue::Text("false".into()));
        assert_eq!(doc.body, "Body here.");
    }

    #[test]
    fn test_typed_values() {
        let text = "---\ncount: 42\nwhen: 2024-07-01\ntags: [\"rust\", \"web\"]\n---\nbody";
        let doc = split_frontmatter(text);
        assert_eq!(doc.meta["count"], MetaValue::Number(42.0));
        assert_eq!(
            doc.meta["when"],
            MetaValue::Date(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap())
        );
        assert_eq!(
            doc.meta["tags"],
            MetaValue::List(vec!["rust".into(), "web".into()])
        );
    }

    #[test]
    fn test_unquoted_list_items() {
        let doc = split_frontmatter("---\ntags: [one, two]\n---\nx");
        assert_eq!(
            doc.meta["tags"],
            MetaValue::List(vec!["one".into(), "two".into()])
        );
    }

    #[test]
    fn test_empty_list() {
        let doc = split_frontmatter("---\ntags: []\n---\nx");
        assert_eq!(doc.meta["tags"], MetaValue::List(vec![]));
    }

    #[test]
    fn test_missing_closing_fence_degrades() {
        let text = "---\ntitle: \"Oops\"\n\nNo closing fence here.";
        let doc = split_frontmatter(text);
        assert!(doc.meta.is_empty());
        assert_eq!(doc.body, text);
    }

    #[test]
    fn test_malformed_line_degrades_whole_block() {
        let text = "---\ntitle: \"Fine\"\nthis line has no colon\n---\nbody";
        let doc = split_frontmatter(text);
        assert!(doc.meta.is_empty());
        assert_eq!(doc.body, text);
    }

    #[test]
    fn test_key_with_spaces_degrades() {
        let text = "---\nbad key: \"value\"\n---\nbody";
        let doc = split_frontmatter(text);
        assert!(doc.meta.is_empty());
        assert_eq!(doc.body, text);
    }

    #[test]
    fn test_thematic_break_at_top_is_not_frontmatter() {
        // A lone `---` followed by prose never closes, so the whole text
        // stays intact.
        let text = "---\n\nJust a thematic break and prose.";
        let doc = split_frontmatter(text);
        assert!(doc.meta.is_empty());
        assert_eq!(doc.body, text);
    }

    #[test]
    fn test_fence_must_open_the_document() {
        let text = "intro\n---\ntitle: \"x\"\n---\nbody";
        let doc = split_frontmatter(text);
        assert!(doc.meta.is_empty());
        assert_eq!(doc.body, text);
    }

    #[test]
    fn test_crlf_fence_lines() {
        let text = "---\r\ntitle: \"Win\"\r\n---\r\nbody";
        let doc = split_frontmatter(text);
        assert_eq!(doc.meta["title"], MetaValue::Text("Win".into()));
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn test_single_quoted_value() {
        let doc = split_frontmatter("---\ntitle: 'Single'\n---\nx");
        assert_eq!(doc.meta["title"], MetaValue::Text("Single".into()));
    }

    #[test]
    fn test_blank_lines_in_block_are_skipped() {
        let doc = split_frontmatter("---\ntitle: \"A\"\n\ndraft: yes\n---\nx");
        assert_eq!(doc.meta.len(), 2);
    }
}
