use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error};

use analyst_agents::{Extraction, QaAnswer, Tool};
use analyst_core::Error;

use crate::context::AppContext;
use crate::schemas::{
    AutoRequest, AutoResponse, ExtractRequest, QaRequest, QaResponse, SummarizeRequest, Validate, DEFAULT_MAX_WORDS,
};

pub const API_PREFIX: &str = "/api/v1";

const ROUTES: [&str; 6] = ["/", "/health", "/qa", "/summarize", "/extract", "/auto"];

pub type HttpResponse = Response<Full<Bytes>>;

/// An error on its way to becoming a `{"error": ...}` response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    /// Map a library error raised while serving `detail` (e.g. "Error processing question").
    fn from_core(detail: &str, err: Error) -> Self {
        error!(kind = err.kind(), error = %err, "{detail}");
        match err {
            Error::Validation(m) => Self::new(StatusCode::UNPROCESSABLE_ENTITY, m),
            Error::NotFound(m) => Self::new(StatusCode::NOT_FOUND, m),
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, format!("{detail}: {other}")),
        }
    }

    pub fn into_response(self) -> HttpResponse {
        error_response(self.status, &self.message)
    }
}

type ApiResult = Result<HttpResponse, ApiError>;

/// Dispatch one request. Paths are served bare and under `/api/v1`.
pub async fn handle(ctx: &AppContext, method: &Method, path: &str, body: &[u8]) -> HttpResponse {
    let mut response = if *method == Method::OPTIONS {
        empty_response(StatusCode::NO_CONTENT)
    } else {
        dispatch(ctx, method, normalize_path(path), body).await.unwrap_or_else(ApiError::into_response)
    };
    cors_headers(&mut response);
    response
}

async fn dispatch(ctx: &AppContext, method: &Method, path: &str, body: &[u8]) -> ApiResult {
    debug!(%method, path, "request");
    match (method, path) {
        (&Method::GET, "/") => Ok(root_info()),
        (&Method::GET, "/health") => health(ctx).await,
        (&Method::POST, "/qa") => qa(ctx, parse_body(body)?).await,
        (&Method::POST, "/summarize") => summarize(ctx, parse_body(body)?).await,
        (&Method::POST, "/extract") => extract(ctx, parse_body(body)?).await,
        (&Method::POST, "/auto") => auto(ctx, parse_body(body)?).await,
        (_, p) if ROUTES.contains(&p) => {
            Err(ApiError::new(StatusCode::METHOD_NOT_ALLOWED, format!("Method {method} not allowed for {p}")))
        }
        _ => Err(ApiError::new(StatusCode::NOT_FOUND, "Not found")),
    }
}

pub fn normalize_path(path: &str) -> &str {
    match path.strip_prefix(API_PREFIX) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

/// Malformed JSON is a 400; well-formed JSON of the wrong shape or out of range is a 422.
fn parse_body<T: DeserializeOwned + Validate>(body: &[u8]) -> Result<T, ApiError> {
    let value: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_slice(body).map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, format!("Invalid JSON body: {e}")))?
    };
    let request: T = serde_json::from_value(value)
        .map_err(|e| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, format!("Invalid request: {e}")))?;
    request.validate().map_err(|e| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;
    Ok(request)
}

fn root_info() -> HttpResponse {
    json_response(
        StatusCode::OK,
        &json!({
            "name": "AI Market Analyst",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "health": "GET /api/v1/health",
                "qa": "POST /api/v1/qa",
                "summarize": "POST /api/v1/summarize",
                "extract": "POST /api/v1/extract",
                "auto": "POST /api/v1/auto",
            },
        }),
    )
}

async fn health(ctx: &AppContext) -> ApiResult {
    let stats = ctx.store().collection_stats().await.map_err(|e| {
        error!(kind = e.kind(), error = %e, "health check failed");
        ApiError::new(StatusCode::SERVICE_UNAVAILABLE, format!("Service unhealthy: {e}"))
    })?;
    Ok(json_response(
        StatusCode::OK,
        &json!({
            "status": "healthy",
            "vectorStore": stats,
            "embeddingModel": ctx.embedding_model(),
            "generationModel": ctx.generation_model(),
        }),
    ))
}

async fn qa(ctx: &AppContext, req: QaRequest) -> ApiResult {
    const DETAIL: &str = "Error processing question";
    let top_k = req.top_k.unwrap_or(ctx.settings.retrieval.top_k);
    let hits = ctx.retriever.retrieve(&req.question, top_k).await.map_err(|e| ApiError::from_core(DETAIL, e))?;
    if hits.is_empty() {
        return Err(ApiError::new(StatusCode::NOT_FOUND, "No relevant information found"));
    }
    let answer = ctx
        .qa
        .answer(&req.question, &hits.documents, Some(&hits.metadatas))
        .await
        .map_err(|e| ApiError::from_core(DETAIL, e))?;
    Ok(json_response(StatusCode::OK, &QaResponse { answer, question: req.question }))
}

async fn summarize(ctx: &AppContext, req: SummarizeRequest) -> ApiResult {
    let summary = ctx
        .summarizer
        .summarize(&ctx.document, req.summary_type.as_str(), req.max_words)
        .await
        .map_err(|e| ApiError::from_core("Error generating summary", e))?;
    Ok(json_response(StatusCode::OK, &summary))
}

async fn extract(ctx: &AppContext, req: ExtractRequest) -> ApiResult {
    const DETAIL: &str = "Error extracting data";
    let extraction = match req.custom_schema {
        Some(schema) if !schema.is_empty() => {
            let data = ctx.extractor.extract_custom(&ctx.document, &schema).await.map_err(|e| ApiError::from_core(DETAIL, e))?;
            Extraction { data, success: true, raw_response: None, error: None }
        }
        _ => ctx.extractor.extract_structured(&ctx.document).await.map_err(|e| ApiError::from_core(DETAIL, e))?,
    };
    Ok(json_response(StatusCode::OK, &extraction))
}

async fn auto(ctx: &AppContext, req: AutoRequest) -> ApiResult {
    const DETAIL: &str = "Error processing query";
    let routing = ctx.router.route(&req.query).await;
    let result = match routing.tool {
        Tool::Qa => {
            let top_k = req.top_k.unwrap_or(ctx.settings.retrieval.top_k);
            let hits = ctx.retriever.retrieve(&req.query, top_k).await.map_err(|e| ApiError::from_core(DETAIL, e))?;
            let answer = if hits.is_empty() {
                QaAnswer::no_information()
            } else {
                ctx.qa
                    .answer(&req.query, &hits.documents, Some(&hits.metadatas))
                    .await
                    .map_err(|e| ApiError::from_core(DETAIL, e))?
            };
            to_value(&answer)?
        }
        Tool::Summarize => {
            let summary = ctx
                .summarizer
                .summarize(&ctx.document, "comprehensive", DEFAULT_MAX_WORDS)
                .await
                .map_err(|e| ApiError::from_core(DETAIL, e))?;
            to_value(&summary)?
        }
        Tool::Extract => {
            let extraction = ctx.extractor.extract_structured(&ctx.document).await.map_err(|e| ApiError::from_core(DETAIL, e))?;
            to_value(&extraction)?
        }
    };
    Ok(json_response(StatusCode::OK, &AutoResponse { routing, result, query: req.query }))
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("Error processing query: {e}")))
}

const SERIALIZE_FAILED: &[u8] = br#"{"error":"Failed to serialize response"}"#;

pub fn json_response<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> HttpResponse {
    let (status, json) = match serde_json::to_vec(body) {
        Ok(json) => (status, Bytes::from(json)),
        Err(e) => {
            error!(error = %e, "failed to serialize response body");
            (StatusCode::INTERNAL_SERVER_ERROR, Bytes::from_static(SERIALIZE_FAILED))
        }
    };
    let mut resp = Response::new(Full::new(json));
    *resp.status_mut() = status;
    resp.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

pub fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    json_response(status, &json!({ "error": message }))
}

fn empty_response(status: StatusCode) -> HttpResponse {
    let mut resp = Response::new(Full::new(Bytes::new()));
    *resp.status_mut() = status;
    resp
}

pub fn cors_headers(response: &mut HttpResponse) {
    let headers = response.headers_mut();
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert("Access-Control-Allow-Methods", HeaderValue::from_static("GET, POST, OPTIONS"));
    headers.insert("Access-Control-Allow-Headers", HeaderValue::from_static("*"));
    headers.insert("Access-Control-Max-Age", HeaderValue::from_static("86400"));
}
