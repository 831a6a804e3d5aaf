//! Scripted analysis backend for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use reportiq_core::{Error, Result};

use crate::backend::{AnalysisBackend, UploadFile};

/// Mock backend returning canned documents.
///
/// Status responses are scripted: each `get_status` call pops the next
/// document in the sequence, the last one repeating once the script is
/// exhausted. Other operations return a fixed document or a scripted error.
pub struct MockAnalysisBackend {
    status_script: Mutex<VecDeque<Value>>,
    last_status: Mutex<Value>,
    status_calls: AtomicUsize,
    fail_with: Mutex<Option<Error>>,
    calls: Mutex<Vec<String>>,
}

impl MockAnalysisBackend {
    pub fn new() -> Self {
        Self {
            status_script: Mutex::new(VecDeque::new()),
            last_status: Mutex::new(json!({ "ai_ready": false })),
            status_calls: AtomicUsize::new(0),
            fail_with: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_status_sequence(self, docs: Vec<Value>) -> Self {
        *self.status_script.lock().unwrap() = docs.into();
        self
    }

    /// Make every operation (except `get_status` and `check_health`) fail.
    pub fn failing_with(self, err: Error) -> Self {
        *self.fail_with.lock().unwrap() = Some(err);
        self
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// Operation names in invocation order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &str) -> Result<()> {
        self.calls.lock().unwrap().push(op.to_string());
        match &*self.fail_with.lock().unwrap() {
            Some(Error::Upstream {
                status,
                message,
                details,
            }) => Err(Error::Upstream {
                status: *status,
                message: message.clone(),
                details: details.clone(),
            }),
            Some(Error::Unavailable(msg)) => Err(Error::Unavailable(msg.clone())),
            Some(other) => Err(Error::Internal(other.to_string())),
            None => Ok(()),
        }
    }
}

impl Default for MockAnalysisBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisBackend for MockAnalysisBackend {
    async fn upload_report(&self, file: UploadFile) -> Result<Value> {
        self.record("upload_report")?;
        Ok(json!({ "reportId": "mock-report", "filename": file.filename }))
    }

    async fn get_summary(&self) -> Result<Value> {
        self.record("get_summary")?;
        Ok(json!({ "summary": "mock summary" }))
    }

    async fn get_kpi(&self) -> Result<Value> {
        self.record("get_kpi")?;
        Ok(json!({ "kpi": { "total_subscribers": 0, "county_distribution": {} } }))
    }

    async fn get_trend(&self) -> Result<Value> {
        self.record("get_trend")?;
        Ok(json!({ "trend": {} }))
    }

    async fn query(&self, query: &str, report_id: Option<&str>) -> Result<Value> {
        self.record("query")?;
        Ok(json!({ "query": query, "report_id": report_id, "answer": "mock answer" }))
    }

    async fn get_insights(&self) -> Result<Value> {
        self.record("get_insights")?;
        Ok(json!({ "insights": [] }))
    }

    async fn get_actions(&self) -> Result<Value> {
        self.record("get_actions")?;
        Ok(json!({ "actions": [] }))
    }

    async fn get_status(&self) -> Result<Value> {
        self.calls.lock().unwrap().push("get_status".to_string());
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.status_script.lock().unwrap();
        if let Some(doc) = script.pop_front() {
            *self.last_status.lock().unwrap() = doc.clone();
            Ok(doc)
        } else {
            Ok(self.last_status.lock().unwrap().clone())
        }
    }

    async fn chat(&self, message: &str, include_data_context: bool) -> Result<Value> {
        self.record("chat")?;
        Ok(json!({
            "message": message,
            "data_context_included": include_data_context,
            "response": "mock reply"
        }))
    }

    async fn check_health(&self) -> Value {
        self.calls.lock().unwrap().push("check_health".to_string());
        json!({ "status": "healthy", "responseTimeMs": 0 })
    }
}
