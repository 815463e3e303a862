//! Slug derivation and title reconstruction.
//!
//! Headings without an explicit id get a slug derived from their text, and
//! documents without a title get one reconstructed from their source
//! identifier. Both directions live here so they stay in sync.

/// Derive a URL-safe slug from arbitrary text.
///
/// Lowercases the input and joins alphanumeric runs with single hyphens.
/// Never produces leading, trailing, or doubled hyphens.
///
/// # Example
///
/// ```
/// use weft_core::slugify;
///
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("  Spaced   Out  "), "spaced-out");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Reconstruct a display title from a source identifier.
///
/// Splits on hyphens and underscores and capitalizes each segment:
/// `"my-first_post"` becomes `"My First Post"`.
pub fn title_from_stem(stem: &str) -> String {
    stem.split(['-', '_'])
        .filter(|segment| !segment.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
