//! Analysis backend abstraction.
//!
//! The gateway talks to exactly one upstream at runtime, but the trait keeps
//! handlers and the status poller testable against a scripted backend.
//!
//! The upstream is session-scoped: it holds one analyzed report at a time,
//! so the read operations take no report identifier. The gateway still
//! validates the dashboard's `reportId` parameters at its own surface.

use async_trait::async_trait;
use serde_json::Value;

use reportiq_core::Result;

/// A file to forward upstream as multipart form data, together with the
/// receipt metadata the upstream records alongside it.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
    /// RFC 3339 time the gateway accepted the upload.
    pub uploaded_at: String,
    /// Client address the upload arrived from, when known.
    pub uploaded_by: Option<String>,
}

/// Operations the upstream analysis service exposes.
///
/// Every method returns the upstream JSON body verbatim on success; the
/// gateway wraps it in its own envelope. Failures carry the three-way
/// classification in [`reportiq_core::Error`]: `Upstream` when the service
/// answered with an error status, `Unavailable` when it could not be
/// reached, `Internal` for everything else.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Forward a report file for analysis.
    async fn upload_report(&self, file: UploadFile) -> Result<Value>;

    /// Narrative summary for the analyzed report.
    async fn get_summary(&self) -> Result<Value>;

    /// KPI metrics for the analyzed report.
    async fn get_kpi(&self) -> Result<Value>;

    /// Trend data for the analyzed report.
    async fn get_trend(&self) -> Result<Value>;

    /// Free-text question, optionally scoped to a report.
    async fn query(&self, query: &str, report_id: Option<&str>) -> Result<Value>;

    /// AI-generated insights.
    async fn get_insights(&self) -> Result<Value>;

    /// Recommended actions.
    async fn get_actions(&self) -> Result<Value>;

    /// Raw embedding/analysis status document.
    async fn get_status(&self) -> Result<Value>;

    /// Conversational message about the analyzed data.
    async fn chat(&self, message: &str, include_data_context: bool) -> Result<Value>;

    /// Upstream liveness probe. Never fails: unreachable or erroring
    /// upstreams are reported as an unhealthy status document.
    async fn check_health(&self) -> Value;
}
