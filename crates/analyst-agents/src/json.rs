//! Lenient JSON extraction from model output.
//!
//! Models wrap JSON in markdown fences or surround it with prose even when told
//! not to. [`parse_lenient`] strips a leading ```` ```json ````/```` ``` ```` fence and a
//! trailing ```` ``` ```` fence, then parses the span from the first `{` to the
//! last `}`; without both braces the whole cleaned text is parsed.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use analyst_core::{Error, Result};

static LEADING_JSON_FENCE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^```json\s*").ok());
static LEADING_FENCE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^```\s*").ok());
static TRAILING_FENCE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s*```$").ok());

fn strip(re: &LazyLock<Option<Regex>>, text: &str) -> String {
    match re.as_ref() {
        Some(re) => re.replace(text, "").into_owned(),
        None => text.to_string(),
    }
}

/// Remove markdown code fences and surrounding whitespace.
pub fn strip_fences(text: &str) -> String {
    let cleaned = strip(&LEADING_JSON_FENCE, text.trim());
    let cleaned = strip(&LEADING_FENCE, &cleaned);
    let cleaned = strip(&TRAILING_FENCE, &cleaned);
    cleaned.trim().to_string()
}

pub fn parse_lenient(text: &str) -> Result<Value> {
    let cleaned = strip_fences(text);
    let candidate = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if start <= end => &cleaned[start..=end],
        (Some(_), Some(_)) => "",
        _ => cleaned.as_str(),
    };
    serde_json::from_str(candidate).map_err(|e| Error::Parse(format!("invalid JSON in model response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_json_fence() {
        assert_eq!(parse_lenient("```json\n{\"a\":1}\n```").unwrap(), json!({"a": 1}));
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(parse_lenient("```\n{\"a\": [1, 2]}\n```").unwrap(), json!({"a": [1, 2]}));
    }

    #[test]
    fn finds_object_inside_prose() {
        assert_eq!(parse_lenient("prefix {\"a\":1} suffix").unwrap(), json!({"a": 1}));
        assert_eq!(
            parse_lenient("Here you go: {\"tool\": \"qa\", \"nested\": {\"x\": 2}} hope it helps").unwrap(),
            json!({"tool": "qa", "nested": {"x": 2}})
        );
    }

    #[test]
    fn parses_whole_text_without_braces() {
        assert_eq!(parse_lenient("  [1, 2, 3] ").unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn rejects_unparseable_text() {
        assert!(matches!(parse_lenient("not json"), Err(Error::Parse(_))));
        assert!(matches!(parse_lenient("} backwards {"), Err(Error::Parse(_))));
        assert!(matches!(parse_lenient("{\"a\": }"), Err(Error::Parse(_))));
    }
}
