use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use analyst_core::config::GeminiSettings;
use analyst_core::traits::TextGenerator;
use analyst_core::types::GenerationParams;
use analyst_core::{Error, Result};
use analyst_embed::gemini::{model_path, Content, GeminiClient, Part};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

/// `generateContent` client.
pub struct GeminiGenerator {
    client: GeminiClient,
    model: String,
}

impl GeminiGenerator {
    pub fn new(settings: &GeminiSettings) -> Result<Self> {
        Ok(Self { client: GeminiClient::new(settings)?, model: model_path(&settings.generation_model) })
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, params: GenerationParams) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content::text(Some("user"), prompt)],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_output_tokens,
            },
        };
        let response: GenerateContentResponse = self.client.call(&self.model, "generateContent", &request).await?;
        response_text(response)
    }
}

fn response_text(response: GenerateContentResponse) -> Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::Upstream("generateContent returned no candidates".into()))?;
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".into());
        return Err(Error::Upstream(format!("generateContent returned no text (finish reason: {reason})")));
    }
    Ok(text)
}
