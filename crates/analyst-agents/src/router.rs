use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use analyst_core::traits::TextGenerator;
use analyst_core::types::GenerationParams;
use analyst_core::{Error, Result};

use crate::json::parse_lenient;

pub const ROUTING_PARAMS: GenerationParams = GenerationParams { temperature: 0.1, max_output_tokens: 256 };
const DEFAULT_CONFIDENCE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Qa,
    Summarize,
    Extract,
}

impl Tool {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Qa => "qa",
            Self::Summarize => "summarize",
            Self::Extract => "extract",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Qa => "Question Answering",
            Self::Summarize => "Summarization",
            Self::Extract => "Data Extraction",
        }
    }

    fn description(self) -> &'static str {
        match self {
            Self::Qa => "Answer specific questions about the document. Use when user asks 'what', 'who', 'when', 'where', 'why', or 'how' questions.",
            Self::Summarize => "Generate summaries or overviews. Use when user wants a summary, overview, main points, or key takeaways.",
            Self::Extract => "Extract structured data as JSON. Use when user wants specific data points, metrics, lists, or structured information.",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "qa" => Some(Self::Qa),
            "summarize" => Some(Self::Summarize),
            "extract" => Some(Self::Extract),
            _ => None,
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingDecision {
    pub tool: Tool,
    pub confidence: f32,
    pub reasoning: String,
    /// Set only when routing itself failed and the decision is the fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RoutingDecision {
    fn fallback(err: &Error) -> Self {
        let message = err.to_string();
        Self {
            tool: Tool::Qa,
            confidence: DEFAULT_CONFIDENCE,
            reasoning: format!("Defaulting to Q&A due to routing error: {message}"),
            error: Some(message),
        }
    }
}

/// Picks the tool for a free-text query. Never fails: errors fall back to QA.
pub struct RouterAgent {
    generator: Arc<dyn TextGenerator>,
}

impl RouterAgent {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn route(&self, query: &str) -> RoutingDecision {
        match self.try_route(query).await {
            Ok(decision) => {
                debug!(tool = %decision.tool, confidence = decision.confidence, "routed query");
                decision
            }
            Err(e) => {
                warn!(error = %e, "routing failed, falling back to qa");
                RoutingDecision::fallback(&e)
            }
        }
    }

    pub async fn batch_route(&self, queries: &[String]) -> Vec<RoutingDecision> {
        let mut decisions = Vec::with_capacity(queries.len());
        for query in queries {
            decisions.push(self.route(query).await);
        }
        decisions
    }

    async fn try_route(&self, query: &str) -> Result<RoutingDecision> {
        let raw = self.generator.generate(&build_routing_prompt(query), ROUTING_PARAMS).await?;
        parse_lenient(&raw).map(decision_from_value)
    }

    pub fn explain(decision: &RoutingDecision) -> String {
        format!(
            "Routing Decision:\n- Selected Tool: {}\n- Confidence: {:.0}%\n- Reasoning: {}",
            decision.tool.display_name(),
            decision.confidence * 100.0,
            decision.reasoning
        )
    }
}

pub fn build_routing_prompt(query: &str) -> String {
    format!(
        "You are a routing assistant that decides which tool should handle a user's query.

Available Tools:
1. \"qa\" - Question Answering: {qa}
2. \"summarize\" - Summarization: {summarize}
3. \"extract\" - Data Extraction: {extract}

Analyze the user's query and select the most appropriate tool.

User Query: \"{query}\"

Respond with ONLY a JSON object in this format:
{{
  \"tool\": \"qa\" | \"summarize\" | \"extract\",
  \"confidence\": 0.0 to 1.0,
  \"reasoning\": \"brief explanation of why this tool was chosen\"
}}

JSON Response:",
        qa = Tool::Qa.description(),
        summarize = Tool::Summarize.description(),
        extract = Tool::Extract.description(),
    )
}

fn decision_from_value(value: Value) -> RoutingDecision {
    let Some(tool) = value.get("tool").and_then(Value::as_str).and_then(Tool::parse) else {
        return RoutingDecision {
            tool: Tool::Qa,
            confidence: DEFAULT_CONFIDENCE,
            reasoning: "Invalid tool in response, defaulting to Q&A".to_string(),
            error: None,
        };
    };
    let confidence = value
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|c| (c as f32).clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_CONFIDENCE);
    let reasoning = value
        .get("reasoning")
        .and_then(Value::as_str)
        .unwrap_or("No reasoning provided")
        .to_string();
    RoutingDecision { tool, confidence, reasoning, error: None }
}
