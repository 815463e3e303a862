//! URL/reference sanitization.
//!
//! Guards every `href`/`src` the pipeline emits. The check runs against a
//! normalized copy of the input (decoded once, lowercased, embedded
//! whitespace and control characters stripped) so `"java\nscript:"`-style
//! obfuscation cannot slip a deny-listed scheme past the prefix check,
//! while the *original trimmed* string is what an accepted value returns —
//! intentional encoding in query strings is never rewritten.
//!
//! The decode step runs exactly once. Multi-layer encodings
//! (`javascript%253A...`) survive the decode, but then carry no scheme
//! separator and fall through as inert relative references; this is a
//! known hardening gap, not a load-bearing boundary.

use percent_encoding::percent_decode_str;
use serde_json::Value;

/// Schemes that can execute code, smuggle content, or reach local or
/// browser-internal resources. Checked case-insensitively against the
/// normalized copy.
const DENY_SCHEMES: &[&str] = &[
    "javascript:",
    "data:",
    "vbscript:",
    "file:",
    "about:",
    "blob:",
    "chrome:",
    "ms-its:",
    "jar:",
];

/// Validate a URL/reference value.
///
/// Returns the original trimmed string on acceptance, `None` on
/// rejection. Idempotent: re-sanitizing an accepted value returns it
/// unchanged.
///
/// ```
/// use weft_render::sanitize_url;
///
/// assert_eq!(sanitize_url("  https://example.com  ").as_deref(), Some("https://example.com"));
/// assert_eq!(sanitize_url("javascript:alert(1)"), None);
/// ```
pub fn sanitize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return reject(raw, "empty reference");
    }

    // Decode once; a reference that is not valid UTF-8 after decoding is
    // not something we can reason about.
    let Ok(decoded) = percent_decode_str(trimmed).decode_utf8() else {
        return reject(trimmed, "undecodable percent-encoding");
    };

    let normalized: String = decoded
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();

    if DENY_SCHEMES
        .iter()
        .any(|scheme| normalized.starts_with(scheme))
    {
        return reject(trimmed, "deny-listed scheme");
    }

    if is_allowed(trimmed) {
        Some(trimmed.to_string())
    } else {
        reject(trimmed, "scheme not in allow list")
    }
}

/// The allow list runs against the original (undecoded) value: absolute
/// http(s), mailto, root-relative, fragment, relative, or no scheme
/// separator at all.
fn is_allowed(trimmed: &str) -> bool {
    let lower = trimmed.to_ascii_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("mailto:")
        || trimmed.starts_with('/')
        || trimmed.starts_with('#')
        || trimmed.starts_with("./")
        || trimmed.starts_with("../")
        || !trimmed.contains(':')
}

fn reject(reference: &str, reason: &str) -> Option<String> {
    log::warn!("rejected unsafe reference ({}): {:?}", reason, reference);
    None
}

/// [`sanitize_url`] over an attribute value; non-strings are rejected
/// outright.
pub fn sanitize_url_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => sanitize_url(s),
        other => reject(&other.to_string(), "non-string reference"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deny_listed_schemes_rejected() {
        for unsafe_ref in [
            "javascript:alert(1)",
            "JAVASCRIPT:alert(1)",
            "java\nscript:alert(1)",
            "javascript%3Aalert(1)",
            "data:text/html,<script>",
            "vbscript:x",
            "file:///etc/passwd",
            "about:blank",
            "blob:https://example.com/uuid",
        ] {
            assert_eq!(sanitize_url(unsafe_ref), None, "should reject {:?}", unsafe_ref);
        }
    }

    #[test]
    fn test_allowed_forms_returned_trimmed() {
        assert_eq!(
            sanitize_url("  https://example.com  ").as_deref(),
            Some("https://example.com")
        );
        assert_eq!(sanitize_url("/blog/1").as_deref(), Some("/blog/1"));
        assert_eq!(sanitize_url("#frag").as_deref(), Some("#frag"));
        assert_eq!(sanitize_url("./sibling.png").as_deref(), Some("./sibling.png"));
        assert_eq!(sanitize_url("../up/one").as_deref(), Some("../up/one"));
        assert_eq!(
            sanitize_url("mailto:team@example.com").as_deref(),
            Some("mailto:team@example.com")
        );
        assert_eq!(sanitize_url("bare-reference.png").as_deref(), Some("bare-reference.png"));
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        assert_eq!(sanitize_url("gopher://example.com"), None);
        assert_eq!(sanitize_url("tel:+15550100"), None);
    }

    #[test]
    fn test_empty_and_whitespace_rejected() {
        assert_eq!(sanitize_url(""), None);
        assert_eq!(sanitize_url("   \t  "), None);
    }

    #[test]
    fn test_query_encoding_preserved() {
        // Accepted values are returned undecoded.
        let url = "https://example.com/search?q=a%20b%26c";
        assert_eq!(sanitize_url(url).as_deref(), Some(url));
    }

    #[test]
    fn test_idempotent() {
        let accepted = sanitize_url("  /blog/1  ").unwrap();
        assert_eq!(sanitize_url(&accepted).as_deref(), Some(accepted.as_str()));
    }

    #[test]
    fn test_tab_and_control_obfuscation_rejected() {
        assert_eq!(sanitize_url("java\tscript:alert(1)"), None);
        assert_eq!(sanitize_url("java\u{0}script:alert(1)"), None);
        assert_eq!(sanitize_url("%6A%61%76%61%73%63%72%69%70%74:alert(1)"), None);
    }

    #[test]
    fn test_non_string_values_rejected() {
        assert_eq!(sanitize_url_value(&json!(42)), None);
        assert_eq!(sanitize_url_value(&json!(null)), None);
        assert_eq!(sanitize_url_value(&json!(["https://example.com"])), None);
        assert_eq!(
            sanitize_url_value(&json!("https://example.com")).as_deref(),
            Some("https://example.com")
        );
    }

    #[test]
    fn test_double_encoded_is_inert_not_executable() {
        // Documented hardening gap: a double-encoded scheme decodes to a
        // single-encoded string with no `:` separator, which the allow
        // list treats as an inert relative reference.
        let accepted = sanitize_url("javascript%253Aalert(1)");
        assert_eq!(accepted.as_deref(), Some("javascript%253Aalert(1)"));
    }
}
