use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use analyst_core::traits::TextGenerator;
use analyst_core::types::GenerationParams;
use analyst_core::Result;

pub const SUMMARY_TEMPERATURE: f32 = 0.3;
pub const INSIGHTS_MAX_OUTPUT_TOKENS: u32 = 400;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryType {
    #[default]
    Comprehensive,
    Executive,
    KeyFindings,
}

impl SummaryType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Comprehensive => "comprehensive",
            Self::Executive => "executive",
            Self::KeyFindings => "key_findings",
        }
    }
}

impl fmt::Display for SummaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub summary: String,
    pub summary_type: String,
    pub word_count: usize,
    pub requested_max_words: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub insights: String,
    pub insight_type: String,
}

pub struct SummarizerAgent {
    generator: Arc<dyn TextGenerator>,
}

impl SummarizerAgent {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Summarize `document` in the given style. Unknown styles get a generic overview.
    pub async fn summarize(&self, document: &str, summary_type: &str, max_words: u32) -> Result<Summary> {
        let prompt = build_summary_prompt(document, summary_type, max_words);
        let summary = self
            .generator
            .generate(&prompt, GenerationParams::new(SUMMARY_TEMPERATURE, max_words.saturating_mul(2)))
            .await?;
        let word_count = summary.split_whitespace().count();
        debug!(summary_type, word_count, max_words, "generated summary");
        Ok(Summary { summary, summary_type: summary_type.to_string(), word_count, requested_max_words: max_words })
    }

    /// Market opportunity, competitive threats and recommended actions.
    pub async fn insights(&self, document: &str) -> Result<Insights> {
        let prompt = format!(
            "Analyze this market research document and provide strategic insights in the following categories:

1. Market Opportunity (1-2 sentences)
2. Competitive Threats (1-2 sentences)
3. Strategic Recommendations (2-3 key actions)

Document:
{document}

Insights:"
        );
        let insights = self
            .generator
            .generate(&prompt, GenerationParams::new(SUMMARY_TEMPERATURE, INSIGHTS_MAX_OUTPUT_TOKENS))
            .await?;
        Ok(Insights { insights, insight_type: "strategic_analysis".to_string() })
    }
}

fn style_instruction(summary_type: &str) -> &'static str {
    match summary_type {
        "comprehensive" => {
            "
Include:
- Company overview and main product
- Market size and growth projections
- Competitive position and key competitors
- Main strengths, weaknesses, opportunities, and threats
- Strategic recommendations"
        }
        "executive" => {
            "
Focus on:
- Key business metrics (market share, market size)
- Critical insights for decision-makers
- Top 3 strategic priorities
Keep it concise and action-oriented."
        }
        "key_findings" => {
            "
Extract only:
- Most important market insights
- Critical competitive intelligence
- Key strategic recommendations
Present as bullet points."
        }
        _ => "Provide a balanced overview of the document's main points.",
    }
}

pub fn build_summary_prompt(document: &str, summary_type: &str, max_words: u32) -> String {
    let base = format!("Summarize the following market research document in approximately {max_words} words or less.");
    let specific = style_instruction(summary_type);
    format!("{base}\n\n{specific}\n\nDocument:\n{document}\n\nSummary:")
}
