//! Request and response bodies for the JSON API.
//!
//! Requests accept camelCase field names and their snake_case aliases.
//! `validate` enforces the range checks that serde alone cannot express.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use analyst_agents::{QaAnswer, RoutingDecision, SummaryType};
use analyst_core::{Error, Result};

pub const MAX_QUERY_CHARS: usize = 500;
pub const TOP_K_RANGE: (usize, usize) = (1, 10);
pub const MAX_WORDS_RANGE: (u32, u32) = (50, 500);
pub const DEFAULT_MAX_WORDS: u32 = 200;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn check_text(field: &str, value: &str) -> Result<()> {
    let len = value.chars().count();
    if len == 0 || len > MAX_QUERY_CHARS {
        return Err(Error::Validation(format!("{field} must be between 1 and {MAX_QUERY_CHARS} characters (got {len})")));
    }
    Ok(())
}

fn check_top_k(top_k: Option<usize>) -> Result<()> {
    match top_k {
        Some(k) if !(TOP_K_RANGE.0..=TOP_K_RANGE.1).contains(&k) => Err(Error::Validation(format!(
            "topK must be between {} and {} (got {k})",
            TOP_K_RANGE.0, TOP_K_RANGE.1
        ))),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaRequest {
    pub question: String,
    #[serde(default, alias = "top_k")]
    pub top_k: Option<usize>,
}

impl Validate for QaRequest {
    fn validate(&self) -> Result<()> {
        check_text("question", &self.question)?;
        check_top_k(self.top_k)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest {
    #[serde(default, alias = "summary_type")]
    pub summary_type: SummaryType,
    #[serde(default = "default_max_words", alias = "max_words")]
    pub max_words: u32,
}

fn default_max_words() -> u32 {
    DEFAULT_MAX_WORDS
}

impl Validate for SummarizeRequest {
    fn validate(&self) -> Result<()> {
        let (lo, hi) = MAX_WORDS_RANGE;
        if !(lo..=hi).contains(&self.max_words) {
            return Err(Error::Validation(format!("maxWords must be between {lo} and {hi} (got {})", self.max_words)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    #[serde(default, alias = "custom_schema")]
    pub custom_schema: Option<BTreeMap<String, String>>,
}

impl Validate for ExtractRequest {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoRequest {
    pub query: String,
    #[serde(default, alias = "top_k")]
    pub top_k: Option<usize>,
}

impl Validate for AutoRequest {
    fn validate(&self) -> Result<()> {
        check_text("query", &self.query)?;
        check_top_k(self.top_k)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QaResponse {
    #[serde(flatten)]
    pub answer: QaAnswer,
    pub question: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoResponse {
    pub routing: RoutingDecision,
    pub result: Value,
    pub query: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snake_case_aliases_are_accepted() {
        let req: QaRequest = serde_json::from_value(json!({"question": "q", "top_k": 3})).unwrap();
        assert_eq!(req.top_k, Some(3));
        let req: SummarizeRequest =
            serde_json::from_value(json!({"summary_type": "key_findings", "max_words": 120})).unwrap();
        assert_eq!(req.summary_type, SummaryType::KeyFindings);
        assert_eq!(req.max_words, 120);
        let req: ExtractRequest = serde_json::from_value(json!({"custom_schema": {"ceo": "chief executive"}})).unwrap();
        assert_eq!(req.custom_schema.map(|s| s.len()), Some(1));
    }

    #[test]
    fn summarize_defaults() {
        let req: SummarizeRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(req.summary_type, SummaryType::Comprehensive);
        assert_eq!(req.max_words, 200);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn ranges_are_enforced() {
        let long = "x".repeat(501);
        assert!(QaRequest { question: long, top_k: None }.validate().is_err());
        assert!(QaRequest { question: String::new(), top_k: None }.validate().is_err());
        assert!(QaRequest { question: "q".into(), top_k: Some(11) }.validate().is_err());
        assert!(QaRequest { question: "q".into(), top_k: Some(0) }.validate().is_err());
        assert!(QaRequest { question: "x".repeat(500), top_k: Some(10) }.validate().is_ok());
        assert!(SummarizeRequest { summary_type: SummaryType::Executive, max_words: 49 }.validate().is_err());
        assert!(SummarizeRequest { summary_type: SummaryType::Executive, max_words: 500 }.validate().is_ok());
        assert!(AutoRequest { query: "é".repeat(500), top_k: None }.validate().is_ok());
    }

    #[test]
    fn unknown_summary_type_does_not_deserialize() {
        assert!(serde_json::from_value::<SummarizeRequest>(json!({"summaryType": "haiku"})).is_err());
    }

    #[test]
    fn qa_response_flattens_answer() {
        let resp = QaResponse { answer: QaAnswer::no_information(), question: "q".into() };
        let v = serde_json::to_value(resp).unwrap();
        assert_eq!(v["answer"], "No relevant information found");
        assert_eq!(v["sourceMetadata"], json!([]));
        assert_eq!(v["question"], "q");
    }
}
