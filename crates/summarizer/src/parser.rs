//! Fenced-JSON summary extraction
//!
//! The model is asked for one ```json block. Prose around the block is
//! ignored; when several blocks are present the first one wins.

use crate::errors::SummarizeError;
use regex_lite::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// First ```json fence, lazily matched up to the next closing fence
static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("fence pattern is valid")
});

const UNTITLED: &str = "Untitled";

/// Validated view of the model's answer.
///
/// The stored summary keeps the raw draft; this struct is what the pipeline
/// reads the title from and what callers can render field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedSummary {
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub introduction: Option<String>,
    pub model: Option<String>,
    pub experiments: Option<String>,
    pub results: Option<String>,
    pub conclusion: Option<String>,
}

/// Locate and decode the first fenced JSON object in `draft`
pub fn extract_json(draft: &str) -> Result<Map<String, Value>, SummarizeError> {
    let inner = JSON_FENCE
        .captures(draft)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .ok_or_else(|| {
            SummarizeError::MalformedSummaryResponse("no ```json block in response".to_string())
        })?;

    match serde_json::from_str::<Value>(inner) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(SummarizeError::MalformedSummaryResponse(format!(
            "fenced JSON is {}, expected an object",
            json_kind(&other)
        ))),
        Err(e) => Err(SummarizeError::MalformedSummaryResponse(format!(
            "fenced block is not valid JSON: {}",
            e
        ))),
    }
}

/// Title derived from a document locator: last path segment, no query or
/// fragment, `.pdf` suffix removed in any case.
pub fn fallback_title(file_url: &str) -> String {
    let without_suffix = file_url
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let segment = without_suffix
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    let split_at = segment.len().saturating_sub(4);
    let stem = match segment.get(split_at..) {
        Some(suffix) if suffix.eq_ignore_ascii_case(".pdf") => &segment[..split_at],
        _ => segment,
    };

    let stem = stem.trim();
    if stem.is_empty() {
        UNTITLED.to_string()
    } else {
        stem.to_string()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn section(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn authors(map: &Map<String, Value>) -> Vec<String> {
    match map.get("authors") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Turns a raw draft into a [`ParsedSummary`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryPayloadParser;

impl SummaryPayloadParser {
    /// Parse `draft`, using `fallback` when the object has no usable title.
    ///
    /// Pure: the same draft always yields the same result.
    pub fn parse(&self, draft: &str, fallback: &str) -> Result<ParsedSummary, SummarizeError> {
        let map = extract_json(draft)?;

        let title = match map.get("title") {
            Some(Value::String(t)) if !t.trim().is_empty() => t.trim().to_string(),
            _ if fallback.trim().is_empty() => UNTITLED.to_string(),
            _ => fallback.trim().to_string(),
        };

        Ok(ParsedSummary {
            title,
            authors: authors(&map),
            abstract_text: section(&map, "abstract"),
            introduction: section(&map, "introduction"),
            model: section(&map, "model"),
            experiments: section(&map, "experiments"),
            results: section(&map, "results"),
            conclusion: section(&map, "conclusion"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fenced(value: &Value) -> String {
        format!("Here is the summary:\n```json\n{}\n```\nThanks.", value)
    }

    #[test]
    fn test_fenced_object_round_trips() {
        let value = json!({
            "title": "Deep Nets",
            "authors": ["A", "B"],
            "abstract": "**x**",
            "nested": {"k": [1, 2, 3]}
        });
        let map = extract_json(&fenced(&value)).unwrap();
        assert_eq!(Value::Object(map), value);
    }

    #[test]
    fn test_parse_reference_draft() {
        let draft = "```json\n{\"title\":\"Deep Nets\",\"authors\":[\"A\",\"B\"],\"abstract\":\"**x**\"}\n```";
        let parsed = SummaryPayloadParser.parse(draft, "deep-nets").unwrap();
        assert_eq!(parsed.title, "Deep Nets");
        assert_eq!(parsed.authors, vec!["A", "B"]);
        assert_eq!(parsed.abstract_text.as_deref(), Some("**x**"));
        assert_eq!(parsed.conclusion, None);
    }

    #[test]
    fn test_first_fence_wins() {
        let draft = "```json\n{\"title\":\"First\"}\n```\nand also\n```json\n{\"title\":\"Second\"}\n```";
        let parsed = SummaryPayloadParser.parse(draft, "x").unwrap();
        assert_eq!(parsed.title, "First");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let draft = fenced(&json!({"title": "T", "authors": ["A"], "results": "ok"}));
        let first = SummaryPayloadParser.parse(&draft, "f").unwrap();
        let second = SummaryPayloadParser.parse(&draft, "f").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_fence_is_malformed() {
        let err = SummaryPayloadParser
            .parse("{\"title\": \"bare json\"}", "x")
            .unwrap_err();
        assert!(matches!(err, SummarizeError::MalformedSummaryResponse(_)));

        // Wrong language tag
        let err = SummaryPayloadParser
            .parse("```yaml\ntitle: x\n```", "x")
            .unwrap_err();
        assert!(matches!(err, SummarizeError::MalformedSummaryResponse(_)));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = SummaryPayloadParser
            .parse("```json\n{\"title\": \"cut off\n```", "x")
            .unwrap_err();
        assert!(matches!(err, SummarizeError::MalformedSummaryResponse(ref m) if m.contains("not valid JSON")));
    }

    #[test]
    fn test_non_object_is_malformed() {
        let err = SummaryPayloadParser.parse("```json\n[1, 2]\n```", "x").unwrap_err();
        assert!(matches!(err, SummarizeError::MalformedSummaryResponse(ref m) if m.contains("an array")));
    }

    #[test]
    fn test_title_fallback() {
        for draft in [
            "```json\n{\"authors\": []}\n```",
            "```json\n{\"title\": \"\"}\n```",
            "```json\n{\"title\": \"   \"}\n```",
            "```json\n{\"title\": 42}\n```",
        ] {
            let parsed = SummaryPayloadParser.parse(draft, "attention-is-all").unwrap();
            assert_eq!(parsed.title, "attention-is-all", "draft: {draft}");
        }

        let parsed = SummaryPayloadParser.parse("```json\n{}\n```", "").unwrap();
        assert_eq!(parsed.title, UNTITLED);
    }

    #[test]
    fn test_authors_edge_cases() {
        let parsed = SummaryPayloadParser.parse("```json\n{\"title\":\"T\"}\n```", "f").unwrap();
        assert!(parsed.authors.is_empty());

        let parsed = SummaryPayloadParser
            .parse("```json\n{\"title\":\"T\",\"authors\":\"A and B\"}\n```", "f")
            .unwrap();
        assert!(parsed.authors.is_empty());

        let parsed = SummaryPayloadParser
            .parse("```json\n{\"title\":\"T\",\"authors\":[\"A\", 3, null, \"B\"]}\n```", "f")
            .unwrap();
        assert_eq!(parsed.authors, vec!["A", "B"]);
    }

    #[test]
    fn test_sections_absent_empty_and_structured() {
        let draft = fenced(&json!({
            "title": "T",
            "introduction": "",
            "model": {"layers": 12},
            "results": null
        }));
        let parsed = SummaryPayloadParser.parse(&draft, "f").unwrap();
        assert_eq!(parsed.abstract_text, None);
        assert_eq!(parsed.introduction.as_deref(), Some(""));
        assert_eq!(parsed.model.as_deref(), Some("{\"layers\":12}"));
        assert_eq!(parsed.results, None);
    }

    #[test]
    fn test_serializes_abstract_key() {
        let parsed = SummaryPayloadParser
            .parse("```json\n{\"title\":\"T\",\"abstract\":\"a\"}\n```", "f")
            .unwrap();
        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(json["abstract"], "a");
    }

    #[test]
    fn test_fallback_title_from_locator() {
        assert_eq!(fallback_title("https://blob.example/u/1/deep-nets.pdf"), "deep-nets");
        assert_eq!(fallback_title("https://blob.example/u/1/Deep.Nets.PDF?sig=abc#p2"), "Deep.Nets");
        assert_eq!(fallback_title("https://blob.example/u/1/notes"), "notes");
        assert_eq!(fallback_title("https://blob.example/u/1/.pdf"), UNTITLED);
        assert_eq!(fallback_title(""), UNTITLED);
    }
}
