//! Structured output decoding
//!
//! Models wrap JSON in prose or markdown fences often enough that the
//! decoder first isolates the object before handing it to serde.

use serde::de::DeserializeOwned;

use crate::error::{ReasonerError, Result};

/// Locate the JSON object inside a model reply.
///
/// Prefers a fenced block (```` ```json ```` or bare ```` ``` ````), then
/// falls back to the outermost `{ ... }` span.
pub fn extract_json_block(content: &str) -> Option<&str> {
    for fence in ["```json", "```"] {
        if let Some(start_idx) = content.find(fence) {
            let after_marker = &content[start_idx + fence.len()..];
            if let Some(end_idx) = after_marker.find("```") {
                let inner = after_marker[..end_idx].trim();
                if inner.starts_with('{') {
                    return Some(inner);
                }
            }
        }
    }

    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&content[start..=end])
}

/// Decode a model reply into `T`
pub fn decode_json<T: DeserializeOwned>(content: &str) -> Result<T> {
    let block = extract_json_block(content)
        .ok_or_else(|| ReasonerError::Decode("no JSON object in response".into()))?;

    serde_json::from_str(block).map_err(|e| ReasonerError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_fenced_block() {
        let content = "Here you go:\n```json\n{\"done\": true}\n```\nThanks";
        assert_eq!(extract_json_block(content), Some("{\"done\": true}"));
    }

    #[test]
    fn test_extract_inline_object() {
        let content = r#"Sure. {"thought": "x", "done": false} hope that helps"#;
        assert_eq!(
            extract_json_block(content),
            Some(r#"{"thought": "x", "done": false}"#)
        );
    }

    #[test]
    fn test_no_object_is_decode_error() {
        let err = decode_json::<serde_json::Value>("no braces here").unwrap_err();
        assert!(matches!(err, ReasonerError::Decode(_)));
    }

    #[test]
    fn test_malformed_object_is_decode_error() {
        let err = decode_json::<serde_json::Value>("{ not json }").unwrap_err();
        assert!(matches!(err, ReasonerError::Decode(_)));
    }
}
