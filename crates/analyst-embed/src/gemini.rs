//! Gemini REST plumbing shared by the embedding and generation clients.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use analyst_core::config::GeminiSettings;
use analyst_core::traits::EmbedProvider;
use analyst_core::types::EmbedIntent;
use analyst_core::{Error, Result};

use crate::EMBEDDING_DIM;

/// Thin authenticated client for `generativelanguage.googleapis.com`.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl GeminiClient {
    pub fn new(settings: &GeminiSettings) -> Result<Self> {
        let api_key = settings.require_api_key()?.to_string();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { http, base_url: settings.base_url.trim_end_matches('/').to_string(), api_key })
    }

    /// POST `{base_url}/{model}:{method}` and decode the JSON reply.
    pub async fn call<Req, Resp>(&self, model: &str, method: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}:{method}", self.base_url, model_path(model));
        debug!(%url, "gemini request");
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Upstream(format!("{method} timed out"))
                } else {
                    Error::Upstream(format!("{method} request failed: {e}"))
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::Upstream(format!("{method} rate limited by Gemini")));
        }
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(&error_body) {
                return Err(Error::Upstream(format!("HTTP {status}: {}", parsed.error.message)));
            }
            return Err(Error::Upstream(format!("HTTP {status}: {error_body}")));
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| Error::Upstream(format!("Failed to parse {method} response: {e}")))
    }
}

/// `text-embedding-004` and `models/text-embedding-004` name the same model.
pub fn model_path(model: &str) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

#[derive(Debug, Serialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

impl Content {
    pub fn text(role: Option<&str>, text: &str) -> Self {
        Self { role: role.map(str::to_string), parts: vec![Part { text: text.to_string() }] }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content,
    task_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

/// `embedContent` client; one HTTP call per text.
pub struct GeminiEmbedder {
    client: GeminiClient,
    model: String,
}

impl GeminiEmbedder {
    pub fn new(settings: &GeminiSettings) -> Result<Self> {
        Ok(Self { client: GeminiClient::new(settings)?, model: model_path(&settings.embedding_model) })
    }
}

#[async_trait]
impl EmbedProvider for GeminiEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn dim(&self) -> usize {
        EMBEDDING_DIM
    }

    async fn embed(&self, text: &str, intent: EmbedIntent) -> Result<Vec<f32>> {
        let request = EmbedContentRequest {
            model: &self.model,
            content: Content::text(None, text),
            task_type: intent.task_type(),
        };
        let response: EmbedContentResponse = self.client.call(&self.model, "embedContent", &request).await?;
        if response.embedding.values.is_empty() {
            return Err(Error::Upstream("embedContent returned an empty embedding".into()));
        }
        Ok(response.embedding.values)
    }
}
