//! Structured (JSON) output parsing
//!
//! Models asked for JSON often wrap it in a markdown fence or add a sentence
//! around it. [`parse_structured`] finds the JSON document in a response and
//! deserializes it.

use serde::de::DeserializeOwned;

/// Locate the JSON document inside a model response.
pub fn extract_json(text: &str) -> Option<&str> {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        // Skip an optional language tag on the fence line
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        if let Some(end) = body.find("```") {
            let inner = body[..end].trim();
            if !inner.is_empty() {
                return Some(inner);
            }
        }
    }

    let open = trimmed.find(['{', '['])?;
    let close_char = if trimmed[open..].starts_with('{') { '}' } else { ']' };
    let close = trimmed.rfind(close_char)?;
    (close > open).then(|| &trimmed[open..=close])
}

/// Deserialize the JSON document embedded in `text`.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T, String> {
    let json = extract_json(text).ok_or_else(|| "response contains no JSON document".to_string())?;
    serde_json::from_str(json).map_err(|e| format!("invalid JSON structure: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
    }

    #[test]
    fn test_bare_json() {
        let s: Sample = parse_structured(r#"{"name": "delve"}"#).unwrap();
        assert_eq!(s.name, "delve");
    }

    #[test]
    fn test_fenced_json() {
        let text = "Here you go:\n```json\n{\"name\": \"fenced\"}\n```\nThanks";
        let s: Sample = parse_structured(text).unwrap();
        assert_eq!(s.name, "fenced");
    }

    #[test]
    fn test_json_with_surrounding_prose() {
        let text = "Sure! {\"name\": \"inline\"} Let me know.";
        assert_eq!(extract_json(text), Some("{\"name\": \"inline\"}"));
    }

    #[test]
    fn test_array_document() {
        let names: Vec<Sample> = parse_structured(r#"[{"name": "a"}, {"name": "b"}]"#).unwrap();
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_no_json() {
        let err = parse_structured::<Sample>("I could not do that.").unwrap_err();
        assert!(err.contains("no JSON"));
    }

    #[test]
    fn test_wrong_shape() {
        let err = parse_structured::<Sample>(r#"{"title": "x"}"#).unwrap_err();
        assert!(err.contains("invalid JSON"));
    }
}
