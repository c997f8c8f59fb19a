use log::{debug, trace, warn};

use crate::{QuoteRecord, Result};

/// Normalizes a background image reference into an absolute URI.
///
/// `https://` and `file://` URIs pass through, protocol-relative `//host/..`
/// references become `https:`, and a bare string without a leading scheme
/// gets `https://` prepended. Other leading schemes are left alone; a URL
/// that only appears later in the string does not count. Empty input means
/// "no image".
pub fn normalize_image_url(raw: Option<&str>) -> Option<String> {
    let url = raw?.trim();

    if url.is_empty() {
        return None;
    }

    if url.starts_with("https://") || url.starts_with("file://") {
        Some(url.to_string())
    } else if url.starts_with("//") {
        Some(format!("https:{}", url))
    } else if has_scheme(url) {
        Some(url.to_string())
    } else {
        Some(format!("https://{}", url))
    }
}

/// Whether `url` starts with `scheme:` ahead of any path, query or fragment.
fn has_scheme(url: &str) -> bool {
    let head = url.split(['/', '?', '#']).next().unwrap_or("");
    match head.split_once(':') {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            chars.next().is_some_and(|c| c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Favorites read back from storage.
#[derive(Debug, Clone, Default)]
pub struct ParsedFavorites {
    /// Records that loaded cleanly
    pub records: Vec<QuoteRecord>,
    /// Entries that were malformed or could never have been saved
    pub skipped: usize,
}

/// Parses the persisted favorites blob one record at a time.
///
/// A malformed entry is skipped on its own so the rest still load. Only a
/// blob that is not a JSON array at all is an error.
pub fn parse_favorites(blob: &str) -> Result<ParsedFavorites> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(blob)?;
    let total = entries.len();
    let mut parsed = ParsedFavorites::default();

    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<QuoteRecord>(entry) {
            Ok(record) if record.id.is_empty() || record.text.trim().is_empty() => {
                warn!("Skipping stored quote with empty id or text: {:?}", record.id);
                parsed.skipped += 1;
            }
            Ok(record) => {
                trace!("Loaded stored quote: {}", record.id);
                parsed.records.push(record);
            }
            Err(e) => {
                warn!("Skipping malformed stored quote at index {}: {}", index, e);
                parsed.skipped += 1;
            }
        }
    }

    debug!("Parsed {} of {} stored quotes", parsed.records.len(), total);
    Ok(parsed)
}

/// Maps `name` onto a single path component: anything other than ASCII
/// alphanumerics, `-` and `_` becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// First `max_len` characters of a quote, with an ellipsis when cut.
pub fn text_preview(text: &str, max_len: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    if first_line.chars().count() <= max_len {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(max_len).collect();
        format!("{}...", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_urls_pass_through() {
        assert_eq!(
            normalize_image_url(Some("https://images.example.com/a.jpg")).as_deref(),
            Some("https://images.example.com/a.jpg")
        );
        assert_eq!(
            normalize_image_url(Some("file:///tmp/a.jpg")).as_deref(),
            Some("file:///tmp/a.jpg")
        );
    }

    #[test]
    fn protocol_relative_gets_https() {
        assert_eq!(
            normalize_image_url(Some("//images.example.com/a.jpg")).as_deref(),
            Some("https://images.example.com/a.jpg")
        );
    }

    #[test]
    fn bare_host_gets_https_scheme() {
        assert_eq!(
            normalize_image_url(Some("images.example.com/a.jpg")).as_deref(),
            Some("https://images.example.com/a.jpg")
        );
    }

    #[test]
    fn other_schemes_are_not_prefixed() {
        assert_eq!(
            normalize_image_url(Some("http://x.test/a.jpg")).as_deref(),
            Some("http://x.test/a.jpg")
        );
    }

    #[test]
    fn embedded_url_in_query_is_not_a_scheme() {
        assert_eq!(
            normalize_image_url(Some("images.example.com/r?u=https://x.test/a.jpg")).as_deref(),
            Some("https://images.example.com/r?u=https://x.test/a.jpg")
        );
        assert_eq!(
            normalize_image_url(Some("img.test/a.jpg#x:y")).as_deref(),
            Some("https://img.test/a.jpg#x:y")
        );
    }

    #[test]
    fn leading_scheme_without_slashes_passes_through() {
        assert_eq!(
            normalize_image_url(Some("data:image/png;base64,AAAA")).as_deref(),
            Some("data:image/png;base64,AAAA")
        );
    }

    #[test]
    fn empty_means_no_image() {
        assert_eq!(normalize_image_url(Some("")), None);
        assert_eq!(normalize_image_url(Some("   ")), None);
        assert_eq!(normalize_image_url(None), None);
    }

    #[test]
    fn parse_favorites_drops_empty_records() {
        let blob = r#"[
            {"id": "1", "text": "kept", "createdAt": "2024-01-01T00:00:00Z"},
            {"id": "", "text": "no id", "createdAt": "2024-01-01T00:00:00Z"},
            {"id": "3", "text": "  ", "createdAt": "2024-01-01T00:00:00Z"}
        ]"#;
        let parsed = parse_favorites(blob).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].text, "kept");
        assert_eq!(parsed.skipped, 2);
    }

    #[test]
    fn malformed_record_does_not_sink_the_rest() {
        let blob = r#"[
            {"id": "1", "text": "keep me", "createdAt": "2024-01-01T00:00:00Z"},
            {"id": "2", "text": "legacy without timestamp", "author": "B"}
        ]"#;
        let parsed = parse_favorites(blob).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].text, "keep me");
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn non_array_blob_is_an_error() {
        assert!(parse_favorites("{broken").is_err());
        assert!(parse_favorites(r#"{"id": "1"}"#).is_err());
    }

    #[test]
    fn preview_truncates_long_text() {
        assert_eq!(text_preview("short", 10), "short");
        assert_eq!(text_preview("abcdefghij klm", 10), "abcdefghij...");
    }
}
