//! JSON extraction and parsing for model output
//!
//! Even in JSON mode some providers wrap the object in a fenced block or
//! surround it with prose. [`extract_json`] handles:
//! - a raw object that parses as it is
//! - ```json fenced blocks (or generic ``` blocks)
//! - the outermost `{...}` inside surrounding text

use serde::de::DeserializeOwned;

use super::LlmError;
use crate::utils::truncate_chars;

/// Max characters of raw model text kept in an `InvalidJson` error
const RAW_PREVIEW_CHARS: usize = 500;

/// Pull the JSON object out of a model answer
pub fn extract_json(text: &str) -> String {
    let trimmed = text.trim();
    let raw = trimmed.starts_with('{') || trimmed.starts_with('[');

    // Backticks inside string values must not be mistaken for a fence
    if raw && serde_json::from_str::<serde::de::IgnoredAny>(trimmed).is_ok() {
        return trimmed.to_string();
    }

    if let Some(fenced) = fenced_block(trimmed) {
        return fenced;
    }

    if raw {
        return trimmed.to_string();
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => trimmed[start..=end].to_string(),
        _ => trimmed.to_string(),
    }
}

fn fenced_block(text: &str) -> Option<String> {
    let (start, skip) = if let Some(pos) = text.find("```json") {
        (pos, 7)
    } else {
        (text.find("```")?, 3)
    };

    let body_start = start + skip;
    let body_end = text[body_start..]
        .find("```")
        .map(|pos| pos + body_start)
        .unwrap_or(text.len());

    Some(text[body_start..body_end].trim().to_string())
}

/// Extract and deserialize, keeping a truncated copy of the raw text on failure
pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    if text.trim().is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    let json = extract_json(text);
    serde_json::from_str(&json).map_err(|e| LlmError::InvalidJson {
        message: e.to_string(),
        raw: truncate_chars(text, RAW_PREVIEW_CHARS),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestData {
        title: String,
        count: usize,
    }

    #[test]
    fn test_extract_json_raw() {
        let json = extract_json("  {\"title\": \"Test\", \"count\": 1}  ");
        assert_eq!(json, "{\"title\": \"Test\", \"count\": 1}");
    }

    #[test]
    fn test_raw_object_containing_fence_markers() {
        let text = "{\"note\": \"use ```json blocks```\", \"x\": 1}";
        assert_eq!(extract_json(text), text);

        let value: serde_json::Value = parse_json(text).unwrap();
        assert_eq!(value["note"], "use ```json blocks```");
        assert_eq!(value["x"], 1);
    }

    #[test]
    fn test_extract_json_from_fence() {
        let text = r#"
Here you go:

```json
{"title": "Test", "count": 42}
```

Anything else?
        "#;

        let data: TestData = parse_json(text).unwrap();
        assert_eq!(data, TestData { title: "Test".to_string(), count: 42 });
    }

    #[test]
    fn test_extract_json_generic_fence() {
        let json = extract_json("```\n{\"title\": \"x\", \"count\": 0}\n```");
        assert_eq!(json, "{\"title\": \"x\", \"count\": 0}");
    }

    #[test]
    fn test_extract_json_wrapped_in_prose() {
        let text = "Sure! The result is {\"title\": \"Nested {braces}\", \"count\": 3} as requested.";
        let data: TestData = parse_json(text).unwrap();
        assert_eq!(data.title, "Nested {braces}");
        assert_eq!(data.count, 3);
    }

    #[test]
    fn test_parse_json_invalid_keeps_raw_preview() {
        let long = format!("not json {}", "x".repeat(2000));
        match parse_json::<TestData>(&long) {
            Err(LlmError::InvalidJson { raw, .. }) => {
                assert!(raw.starts_with("not json"));
                assert!(raw.ends_with('…'));
                assert!(raw.chars().count() <= RAW_PREVIEW_CHARS + 1);
            }
            other => panic!("expected InvalidJson, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_json_empty() {
        assert!(matches!(parse_json::<TestData>("   "), Err(LlmError::EmptyResponse)));
    }
}
