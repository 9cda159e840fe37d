//! Tagged-markup protocol for in-band tool requests.
//!
//! The chat tool instructs the model to request tool calls as
//! `<tool name="X">query</tool>` spans. This module scans a response for
//! those spans, splices `<tool_response>` blocks after them, and strips all
//! markup when a clean transcript is needed.

use std::sync::OnceLock;

use regex::Regex;

/// One tool request found in a model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequest {
    /// Requested tool name, trimmed
    pub name: String,

    /// The query text between the tags, trimmed
    pub query: String,

    /// The full matched span, byte-exact as it appears in the response
    pub span: String,
}

fn request_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Non-greedy body so adjacent requests do not merge; (?is) makes the tag
    // case-insensitive and lets the body span newlines.
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<tool\s+name=["']([^"']+)["']>(.*?)</tool>"#)
            .expect("hard-coded pattern is valid")
    })
}

fn strip_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)<tool\s+name=["'][^"']+["']>|</tool>|<tool_response>|</tool_response>"#)
            .expect("hard-coded pattern is valid")
    })
}

/// Find every well-formed tool request, in textual order.
///
/// Malformed spans (unclosed tags, missing name attribute) simply do not
/// match and are left in place.
pub fn scan(response: &str) -> Vec<ToolRequest> {
    request_regex()
        .captures_iter(response)
        .filter_map(|caps| {
            let full = caps.get(0)?;
            let name = caps.get(1)?.as_str().trim();
            let query = caps.get(2)?.as_str().trim();
            if name.is_empty() {
                return None;
            }
            Some(ToolRequest {
                name: name.to_string(),
                query: query.to_string(),
                span: full.as_str().to_string(),
            })
        })
        .collect()
}

/// Splice a tool response block immediately after the request's span.
pub fn splice_response(transcript: &str, span: &str, response_text: &str) -> String {
    let replacement = format!("{span}\n<tool_response>\n{response_text}\n</tool_response>");
    transcript.replacen(span, &replacement, 1)
}

/// Remove all tool markup tags, leaving the text between them.
pub fn strip_markup(transcript: &str) -> String {
    strip_regex().replace_all(transcript, "").into_owned()
}
