//! Static metadata extraction.
//!
//! A lighter sibling of the frontmatter splitter for content that lives in
//! structured source text (component files, config-style exports) rather
//! than a frontmatter-bearing document. Each field — title, description,
//! date, image, tags — has its own pattern, and a missing field never
//! blocks the others.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use weft_core::title_from_stem;

static TITLE: LazyLock<Regex> = LazyLock::new(|| field_pattern("title"));
static DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| field_pattern("description"));
static IMAGE: LazyLock<Regex> = LazyLock::new(|| field_pattern("(?:image|heroImage|cover)"));
static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)\bdate\s*:\s*["']?([^"'\r\n,]+)["']?"#).expect("date pattern compiles")
});
static TAGS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)\btags\s*:\s*\[([^\]]*)\]").expect("tags pattern compiles")
});
static MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|Jun(?:e)?|Jul(?:y)?|Aug(?:ust)?|Sep(?:tember)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)\s+(\d{4})\b")
        .expect("month-year pattern compiles")
});

fn field_pattern(field: &str) -> Regex {
    Regex::new(&format!(r#"(?m)\b{}\s*:\s*["']([^"'\r\n]*)["']"#, field))
        .expect("field pattern compiles")
}

/// A date that parsed, or the raw string when it did not.
///
/// Unparseable dates are retained rather than dropped so the consumer can
/// still display them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaDate {
    Parsed(NaiveDate),
    Raw(String),
}

/// Metadata pulled from structured source text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticMeta {
    /// Declared title, or one reconstructed from the source identifier.
    pub title: String,
    pub description: Option<String>,
    pub date: Option<MetaDate>,
    pub image: Option<String>,
    pub tags: Vec<String>,
    /// Approximate body word count for reading-time estimates.
    pub word_count: usize,
}

/// Extract listing/SEO metadata from `text`.
///
/// `source_id` is the content's identifier (typically a file stem); it
/// supplies the fallback title when none is declared.
pub fn extract_static_meta(source_id: &str, text: &str) -> StaticMeta {
    let title = first_capture(&TITLE, text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| title_from_stem(source_id));

    StaticMeta {
        title,
        description: first_capture(&DESCRIPTION, text).filter(|d| !d.is_empty()),
        date: first_capture(&DATE, text).map(|raw| parse_flexible_date(raw.trim())),
        image: first_capture(&IMAGE, text).filter(|i| !i.is_empty()),
        tags: extract_tags(text),
        word_count: approximate_word_count(text),
    }
}

fn first_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn extract_tags(text: &str) -> Vec<String> {
    let Some(caps) = TAGS.captures(text) else {
        return Vec::new();
    };
    caps[1]
        .split(',')
        .map(|item| item.trim().trim_matches(['"', '\'']).trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Native date parse first, then a `"Month YYYY"` fallback; anything else
/// is retained raw.
pub fn parse_flexible_date(raw: &str) -> MetaDate {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return MetaDate::Parsed(date);
    }
    if let Ok(stamp) = chrono::DateTime::parse_from_rfc3339(raw) {
        return MetaDate::Parsed(stamp.date_naive());
    }
    if let Some(caps) = MONTH_YEAR.captures(raw) {
        let month = month_number(&caps[1]);
        if let Ok(year) = caps[2].parse::<i32>() {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, 1) {
                return MetaDate::Parsed(date);
            }
        }
    }
    MetaDate::Raw(raw.to_string())
}

fn month_number(name: &str) -> u32 {
    match name.to_ascii_lowercase().as_str() {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        _ => 12,
    }
}

static FENCED_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?(?:```|\z)").expect("fence pattern compiles"));
static COMMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--.*?-->|\{/\*.*?\*/\}").expect("comment pattern compiles")
});
static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>\n]*>").expect("tag pattern compiles"));

/// Approximate word count for reading-time estimation.
///
/// Fenced code, comments, markup tags, and import/export boilerplate
/// lines are stripped first so they never inflate the estimate.
pub fn approximate_word_count(text: &str) -> usize {
    let without_code = FENCED_CODE.replace_all(text, " ");
    let without_comments = COMMENTS.replace_all(&without_code, " ");
    let without_tags = MARKUP_TAG.replace_all(&without_comments, " ");

    without_tags
        .lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !trimmed.starts_with("import ") && !trimmed.starts_with("export ")
        })
        .flat_map(str::split_whitespace)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
export const meta = {
  title: "Shipping the Pipeline",
  description: "How the content pipeline came together",
  date: "2024-03-09",
  heroImage: "/images/pipeline.png",
  tags: ["architecture", "rust"],
};

Body paragraph with enough words to count.
"#;

    #[test]
    fn test_all_fields_extracted() {
        let meta = extract_static_meta("shipping-the-pipeline", SOURCE);
        assert_eq!(meta.title, "Shipping the Pipeline");
        assert_eq!(
            meta.description.as_deref(),
            Some("How the content pipeline came together")
        );
        assert_eq!(
            meta.date,
            Some(MetaDate::Parsed(
                NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
            ))
        );
        assert_eq!(meta.image.as_deref(), Some("/images/pipeline.png"));
        assert_eq!(meta.tags, vec!["architecture", "rust"]);
    }

    #[test]
    fn test_missing_field_does_not_block_others() {
        let meta = extract_static_meta("post", "title: \"Only Title\"\nbody text");
        assert_eq!(meta.title, "Only Title");
        assert!(meta.description.is_none());
        assert!(meta.date.is_none());
        assert!(meta.image.is_none());
        assert!(meta.tags.is_empty());
    }

    #[test]
    fn test_title_falls_back_to_slug() {
        let meta = extract_static_meta("my-first_post", "no declared fields here");
        assert_eq!(meta.title, "My First Post");
    }

    #[test]
    fn test_month_year_fallback() {
        assert_eq!(
            parse_flexible_date("March 2024"),
            MetaDate::Parsed(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert_eq!(
            parse_flexible_date("sep 2021"),
            MetaDate::Parsed(NaiveDate::from_ymd_opt(2021, 9, 1).unwrap())
        );
    }

    #[test]
    fn test_rfc3339_date() {
        assert_eq!(
            parse_flexible_date("2024-03-09T12:30:00Z"),
            MetaDate::Parsed(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
        );
    }

    #[test]
    fn test_unparseable_date_retained_raw() {
        assert_eq!(
            parse_flexible_date("sometime soon"),
            MetaDate::Raw("sometime soon".into())
        );
    }

    #[test]
    fn test_tags_with_mixed_quoting() {
        let meta = extract_static_meta("p", "tags: [\"a\", 'b', c]");
        assert_eq!(meta.tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_word_count_strips_code_and_imports() {
        let text = "import thing from 'x'\n\none two three\n\n```rust\nfn not_counted() {}\n```\n\nfour five\n";
        assert_eq!(approximate_word_count(text), 5);
    }

    #[test]
    fn test_word_count_strips_tags_and_comments() {
        let text = "<Layout title=\"x\">\none <!-- hidden words here --> two\n</Layout>\n";
        assert_eq!(approximate_word_count(text), 2);
    }

    #[test]
    fn test_word_count_unterminated_fence() {
        // An unterminated fence swallows to end of input, mirroring the
        // parser's behavior.
        let text = "counted words\n```\nnot counted";
        assert_eq!(approximate_word_count(text), 2);
    }
}
