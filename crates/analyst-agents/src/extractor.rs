use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Number, Value};
use tracing::{debug, warn};

use analyst_core::traits::TextGenerator;
use analyst_core::types::GenerationParams;
use analyst_core::{Error, Result};

use crate::json::parse_lenient;

pub const EXTRACTION_PARAMS: GenerationParams = GenerationParams { temperature: 0.1, max_output_tokens: 1024 };

static NUMBER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(\d+\.?\d*)").ok());

const FIXED_SCHEMA: &str = r#"{
  "company_name": "string - name of the company",
  "product_name": "string - flagship product name",
  "industry_sector": "string - primary industry sector",
  "report_period": "string - report period (e.g., Q3 2025)",
  "market_size_current": "string - current market size with units",
  "market_size_projected": "string - projected market size with units",
  "cagr": "string - compound annual growth rate",
  "market_share": "number - company's market share as percentage (just number)",
  "competitors": [
    {
      "name": "string - competitor name",
      "market_share": "number - their market share as percentage"
    }
  ],
  "swot": {
    "strengths": ["list of strings"],
    "weaknesses": ["list of strings"],
    "opportunities": ["list of strings"],
    "threats": ["list of strings"]
  },
  "key_metrics": {
    "total_competitors": "number - count of competitors mentioned",
    "growth_drivers": ["list of key growth drivers"]
  },
  "strategic_priorities": ["list of strategic priorities or recommendations"]
}"#;

/// Outcome of a fixed-schema extraction. Unusable model output is reported
/// with `success == false` rather than as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub data: Value,
    pub success: bool,
    pub raw_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct ExtractorAgent {
    generator: Arc<dyn TextGenerator>,
}

impl ExtractorAgent {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn extract_structured(&self, document: &str) -> Result<Extraction> {
        let raw = self.generator.generate(&build_extraction_prompt(document), EXTRACTION_PARAMS).await?;
        match parse_lenient(&raw).and_then(validate_and_cast) {
            Ok(data) => Ok(Extraction { data, success: true, raw_response: Some(raw), error: None }),
            Err(e) => {
                warn!(error = %e, "model returned unusable extraction output");
                Ok(Extraction {
                    data: Value::Object(Map::new()),
                    success: false,
                    raw_response: Some(raw),
                    error: Some(e.to_string()),
                })
            }
        }
    }

    /// Extract caller-defined fields (name → description). Malformed output is a `Parse` error.
    pub async fn extract_custom(&self, document: &str, field_schema: &BTreeMap<String, String>) -> Result<Value> {
        let schema = serde_json::to_string_pretty(field_schema)
            .map_err(|e| Error::Validation(format!("unserializable field schema: {e}")))?;
        let prompt = format!(
            "Extract the following fields from the document.
Output ONLY valid JSON matching this schema:

{schema}

Document:
{document}

JSON Output:"
        );
        let raw = self.generator.generate(&prompt, EXTRACTION_PARAMS).await?;
        let value = parse_lenient(&raw)?;
        debug!(fields = field_schema.len(), "custom extraction parsed");
        Ok(value)
    }
}

pub fn build_extraction_prompt(document: &str) -> String {
    format!(
        "You are a data extraction assistant. Extract structured information from the market research document below.

IMPORTANT: Output ONLY valid JSON. Do not include any explanatory text, markdown formatting, or code blocks.

Extract the following information into this exact JSON structure:
{FIXED_SCHEMA}

Document:
{document}

JSON Output:"
    )
}

/// Coerce string market shares to numbers and make sure `swot` exists.
pub fn validate_and_cast(data: Value) -> Result<Value> {
    let Value::Object(mut map) = data else {
        return Err(Error::Parse("expected a JSON object at the top level".into()));
    };
    coerce_share(map.get_mut("market_share"));
    if let Some(Value::Array(competitors)) = map.get_mut("competitors") {
        for competitor in competitors.iter_mut() {
            if let Value::Object(c) = competitor {
                coerce_share(c.get_mut("market_share"));
            }
        }
    }
    if !map.contains_key("swot") {
        map.insert(
            "swot".to_string(),
            json!({"strengths": [], "weaknesses": [], "opportunities": [], "threats": []}),
        );
    }
    Ok(Value::Object(map))
}

fn coerce_share(slot: Option<&mut Value>) {
    let Some(slot) = slot else { return };
    let Value::String(s) = &*slot else { return };
    let parsed = NUMBER
        .as_ref()
        .and_then(|re| re.captures(s))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .and_then(Number::from_f64);
    if let Some(n) = parsed {
        *slot = Value::Number(n);
    }
}
