//! HTTP analysis client implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use reportiq_core::{defaults, Error, Result};

use crate::backend::{AnalysisBackend, UploadFile};

/// Default upstream endpoint.
pub const DEFAULT_SERVICE_URL: &str = defaults::AI_SERVICE_URL;

/// Timeout for analysis requests (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = defaults::AI_TIMEOUT_SECS;

/// Timeout for the health probe (seconds).
pub const HEALTH_TIMEOUT_SECS: u64 = defaults::AI_HEALTH_TIMEOUT_SECS;

/// Analysis client backed by the upstream HTTP service.
pub struct AnalysisClient {
    client: Client,
    health_client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl AnalysisClient {
    /// Create a client with custom configuration.
    pub fn with_config(base_url: String, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");
        // Separate client so a slow upstream cannot stall the health probe
        // for the full request timeout.
        let health_client = Client::builder()
            .timeout(Duration::from_secs(HEALTH_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        info!("Initializing analysis client: url={}", base_url);

        Self {
            client,
            health_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("AI_SERVICE_URL").unwrap_or_else(|_| DEFAULT_SERVICE_URL.to_string());
        let api_key = std::env::var("AI_SERVICE_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        Self::with_config(base_url, api_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Classify a transport-level failure. Timeouts and refused connections
    /// mean the request never produced a response; everything else is an
    /// internal fault of this gateway.
    fn classify_transport(err: reqwest::Error) -> Error {
        if err.is_timeout() || err.is_connect() {
            Error::Unavailable(format!("AI service unreachable: {}", err))
        } else {
            Error::Internal(format!("AI request failed: {}", err))
        }
    }

    /// Turn an upstream response into the backend result. Error statuses
    /// become [`Error::Upstream`] carrying the upstream's own message and
    /// detail text when its body provides them.
    async fn into_result(resp: Response) -> Result<Value> {
        let status = resp.status();
        if status.is_success() {
            return resp
                .json::<Value>()
                .await
                .map_err(|e| Error::Internal(format!("Invalid JSON from AI service: {}", e)));
        }

        let body = resp.text().await.unwrap_or_default();
        let (message, details) = match serde_json::from_str::<Value>(&body) {
            Ok(parsed) => {
                let message = parsed
                    .get("message")
                    .or_else(|| parsed.get("error"))
                    .and_then(Value::as_str)
                    .unwrap_or("AI service error")
                    .to_string();
                let details = parsed
                    .get("details")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                (message, details)
            }
            Err(_) => {
                let details = (!body.is_empty()).then(|| body.clone());
                ("AI service error".to_string(), details)
            }
        };

        warn!(status = status.as_u16(), message = %message, "AI service returned an error");
        Err(Error::Upstream {
            status: status.as_u16(),
            message,
            details,
        })
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let started = Instant::now();
        let resp = self
            .authorize(self.client.get(self.url(path)))
            .send()
            .await
            .map_err(Self::classify_transport)?;
        debug!(path, elapsed_ms = started.elapsed().as_millis() as u64, "AI GET complete");
        Self::into_result(resp).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let started = Instant::now();
        let resp = self
            .authorize(self.client.post(self.url(path)).json(body))
            .send()
            .await
            .map_err(Self::classify_transport)?;
        debug!(path, elapsed_ms = started.elapsed().as_millis() as u64, "AI POST complete");
        Self::into_result(resp).await
    }
}

#[async_trait]
impl AnalysisBackend for AnalysisClient {
    #[instrument(skip(self, file), fields(filename = %file.filename, size = file.data.len()))]
    async fn upload_report(&self, file: UploadFile) -> Result<Value> {
        let size = file.data.len();
        let part = Part::bytes(file.data)
            .file_name(file.filename.clone())
            .mime_str(&file.content_type)
            .map_err(|e| Error::InvalidInput(format!("Invalid content type: {}", e)))?;
        let mut form = Form::new()
            .part("file", part)
            .text("originalName", file.filename)
            .text("size", size.to_string())
            .text("mimetype", file.content_type)
            .text("uploadedAt", file.uploaded_at);
        if let Some(addr) = file.uploaded_by {
            form = form.text("uploadedBy", addr);
        }

        let resp = self
            .authorize(self.client.post(self.url("/analyze/upload")).multipart(form))
            .send()
            .await
            .map_err(Self::classify_transport)?;
        Self::into_result(resp).await
    }

    async fn get_summary(&self) -> Result<Value> {
        self.get_json("/analyze/summary").await
    }

    async fn get_kpi(&self) -> Result<Value> {
        self.get_json("/analyze/kpi").await
    }

    async fn get_trend(&self) -> Result<Value> {
        self.get_json("/analyze/trend").await
    }

    async fn query(&self, query: &str, report_id: Option<&str>) -> Result<Value> {
        self.post_json("/query", &json!({ "query": query, "report_id": report_id }))
            .await
    }

    async fn get_insights(&self) -> Result<Value> {
        self.get_json("/analyze/insights").await
    }

    async fn get_actions(&self) -> Result<Value> {
        self.get_json("/analyze/actions").await
    }

    async fn get_status(&self) -> Result<Value> {
        self.get_json("/analyze/status").await
    }

    #[instrument(skip(self, message))]
    async fn chat(&self, message: &str, include_data_context: bool) -> Result<Value> {
        self.post_json(
            "/analyze/chat",
            &json!({ "message": message, "include_data_context": include_data_context }),
        )
        .await
    }

    async fn check_health(&self) -> Value {
        let started = Instant::now();
        let outcome = self
            .authorize(self.health_client.get(self.url("/health")))
            .send()
            .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(resp) if resp.status().is_success() => {
                let detail = resp.json::<Value>().await.unwrap_or(Value::Null);
                json!({
                    "status": "healthy",
                    "responseTimeMs": elapsed_ms,
                    "detail": detail,
                })
            }
            Ok(resp) => {
                warn!(status = resp.status().as_u16(), "AI health probe failed");
                json!({
                    "status": "unhealthy",
                    "responseTimeMs": elapsed_ms,
                    "statusCode": resp.status().as_u16(),
                })
            }
            Err(e) => {
                warn!(error = %e, "AI health probe unreachable");
                json!({
                    "status": "unreachable",
                    "responseTimeMs": elapsed_ms,
                    "error": e.to_string(),
                })
            }
        }
    }
}
