//! Truncated, human-readable previews of JSON values for logs and transcripts.

use serde_json::Value;

/// Maximum characters of a pretty-printed response shown in diagnostics.
pub const RESPONSE_PREVIEW_CHARS: usize = 500;
/// Maximum characters of pretty-printed params shown in diagnostics.
pub const PARAMS_PREVIEW_CHARS: usize = 500;
/// Maximum characters of a tool description shown in the tool listing.
pub const DESCRIPTION_PREVIEW_CHARS: usize = 60;

/// The first `max` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Pretty-print `value` and cut it to `max` characters, marking the cut with `...`.
pub fn preview(value: &Value, max: usize) -> String {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    let cut = truncate_chars(&pretty, max);
    if cut.len() < pretty.len() {
        format!("{cut}...")
    } else {
        pretty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 7), "héllo w");
        assert_eq!(truncate_chars("short", 60), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_preview_marks_truncation() {
        let value = json!({"text": "x".repeat(100)});
        let out = preview(&value, 20);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 23);
    }

    #[test]
    fn test_preview_short_value_untouched() {
        assert_eq!(preview(&json!({}), 500), "{}");
    }
}
