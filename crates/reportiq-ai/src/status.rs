//! Embedding readiness tracking.
//!
//! The upstream reports readiness through several partially-redundant
//! signals: a root-level `ai_ready` flag, a nested `embedding_status`
//! document with `status` and `progress`, and sometimes those same fields at
//! the root. [`EmbeddingSnapshot`] normalizes one status document;
//! [`EmbeddingGate`] latches readiness for the current report session;
//! [`StatusPoller`] drives the gate from a background task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::AnalysisBackend;

/// One normalized reading of the upstream status document.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingSnapshot {
    pub ai_ready: bool,
    pub status: Option<String>,
    pub progress: Option<f64>,
}

impl EmbeddingSnapshot {
    /// Parse a raw status document. Nested `embedding_status` fields win
    /// over root-level duplicates; absent fields stay `None`.
    pub fn from_value(doc: &Value) -> Self {
        let nested = doc.get("embedding_status");
        let field = |name: &str| -> Option<&Value> {
            nested.and_then(|n| n.get(name)).or_else(|| doc.get(name))
        };

        Self {
            ai_ready: doc
                .get("ai_ready")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            status: field("status").and_then(Value::as_str).map(str::to_string),
            progress: field("progress").and_then(Value::as_f64),
        }
    }

    /// Readiness is the disjunction of all signals: any one of them claiming
    /// completion opens the gate, even when the others disagree.
    pub fn is_ready(&self) -> bool {
        self.ai_ready
            || self.status.as_deref() == Some("completed")
            || self.progress.map(|p| p >= 100.0).unwrap_or(false)
    }

    /// Terminal states end the polling loop.
    pub fn is_terminal(&self) -> bool {
        self.is_ready()
            || matches!(self.status.as_deref(), Some("failed") | Some("error"))
    }
}

/// Latched readiness for the current report session.
///
/// Once a snapshot opens the gate it stays open until [`reset`] — a later
/// snapshot reporting in-progress again cannot close it.
///
/// [`reset`]: EmbeddingGate::reset
pub struct EmbeddingGate {
    ready: AtomicBool,
    polling: AtomicBool,
}

impl EmbeddingGate {
    pub fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            polling: AtomicBool::new(false),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Fold a snapshot into the latch. Returns the gate state afterwards.
    pub fn record(&self, snapshot: &EmbeddingSnapshot) -> bool {
        if snapshot.is_ready() {
            if !self.ready.swap(true, Ordering::SeqCst) {
                info!("Embedding gate opened");
            }
        }
        self.is_ready()
    }

    /// Start a new report session: close the gate.
    pub fn reset(&self) {
        self.ready.store(false, Ordering::SeqCst);
        debug!("Embedding gate reset");
    }

    /// CAS guard so at most one poller runs at a time. Returns false when a
    /// poller is already active.
    fn begin_polling(&self) -> bool {
        !self.polling.swap(true, Ordering::SeqCst)
    }

    fn end_polling(&self) {
        self.polling.store(false, Ordering::SeqCst);
    }
}

impl Default for EmbeddingGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Background task polling upstream status until a terminal state.
pub struct StatusPoller;

impl StatusPoller {
    /// Spawn the polling loop. The task exits when the status reaches a
    /// terminal state, replacing the client-side polling the gateway's
    /// callers previously had to do. A second spawn while one is running is
    /// a no-op.
    pub fn spawn(
        backend: Arc<dyn AnalysisBackend>,
        gate: Arc<EmbeddingGate>,
        interval: Duration,
    ) -> Option<JoinHandle<()>> {
        if !gate.begin_polling() {
            debug!("Status poller already running, skipping spawn");
            return None;
        }

        Some(tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "Status poller started");
            loop {
                tokio::time::sleep(interval).await;
                match backend.get_status().await {
                    Ok(doc) => {
                        let snapshot = EmbeddingSnapshot::from_value(&doc);
                        gate.record(&snapshot);
                        if snapshot.is_terminal() {
                            info!(
                                status = snapshot.status.as_deref().unwrap_or("unknown"),
                                ready = snapshot.is_ready(),
                                "Status poller finished"
                            );
                            break;
                        }
                        debug!(
                            progress = snapshot.progress.unwrap_or(0.0),
                            "Embedding in progress"
                        );
                    }
                    Err(e) => {
                        // Transient upstream trouble: keep polling, the next
                        // tick may succeed.
                        warn!(error = %e, "Status poll failed");
                    }
                }
            }
            gate.end_polling();
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_reads_nested_fields() {
        let doc = json!({
            "ai_ready": false,
            "embedding_status": { "status": "processing", "progress": 40.0 }
        });
        let snap = EmbeddingSnapshot::from_value(&doc);
        assert!(!snap.ai_ready);
        assert_eq!(snap.status.as_deref(), Some("processing"));
        assert_eq!(snap.progress, Some(40.0));
        assert!(!snap.is_ready());
    }

    #[test]
    fn test_snapshot_falls_back_to_root_fields() {
        let doc = json!({ "status": "completed", "progress": 100 });
        let snap = EmbeddingSnapshot::from_value(&doc);
        assert_eq!(snap.status.as_deref(), Some("completed"));
        assert!(snap.is_ready());
    }

    #[test]
    fn test_nested_fields_win_over_root() {
        let doc = json!({
            "status": "completed",
            "embedding_status": { "status": "processing" }
        });
        let snap = EmbeddingSnapshot::from_value(&doc);
        assert_eq!(snap.status.as_deref(), Some("processing"));
    }

    #[test]
    fn test_any_signal_opens_readiness() {
        // The three signals can disagree; any single positive one counts.
        let by_flag = EmbeddingSnapshot::from_value(&json!({
            "ai_ready": true,
            "embedding_status": { "status": "processing", "progress": 10 }
        }));
        assert!(by_flag.is_ready());

        let by_status = EmbeddingSnapshot::from_value(&json!({
            "ai_ready": false,
            "embedding_status": { "status": "completed", "progress": 10 }
        }));
        assert!(by_status.is_ready());

        let by_progress = EmbeddingSnapshot::from_value(&json!({
            "ai_ready": false,
            "embedding_status": { "status": "processing", "progress": 100 }
        }));
        assert!(by_progress.is_ready());
    }

    #[test]
    fn test_empty_document_is_not_ready() {
        let snap = EmbeddingSnapshot::from_value(&json!({}));
        assert!(!snap.is_ready());
        assert!(!snap.is_terminal());
    }

    #[test]
    fn test_failed_is_terminal_but_not_ready() {
        let snap = EmbeddingSnapshot::from_value(&json!({
            "embedding_status": { "status": "failed" }
        }));
        assert!(snap.is_terminal());
        assert!(!snap.is_ready());
    }

    #[test]
    fn test_gate_latches_until_reset() {
        let gate = EmbeddingGate::new();
        assert!(!gate.is_ready());

        let ready = EmbeddingSnapshot::from_value(&json!({ "ai_ready": true }));
        let not_ready = EmbeddingSnapshot::from_value(&json!({ "ai_ready": false }));

        gate.record(&ready);
        assert!(gate.is_ready());

        // A later in-progress reading must not close the gate.
        gate.record(&not_ready);
        assert!(gate.is_ready());

        gate.reset();
        assert!(!gate.is_ready());
    }

    #[test]
    fn test_single_poller_guard() {
        let gate = EmbeddingGate::new();
        assert!(gate.begin_polling());
        assert!(!gate.begin_polling());
        gate.end_polling();
        assert!(gate.begin_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_opens_gate_and_stops() {
        use crate::mock::MockAnalysisBackend;

        let backend = Arc::new(MockAnalysisBackend::new().with_status_sequence(vec![
            json!({ "ai_ready": false, "embedding_status": { "status": "processing", "progress": 50 } }),
            json!({ "ai_ready": true, "embedding_status": { "status": "completed", "progress": 100 } }),
        ]));
        let gate = Arc::new(EmbeddingGate::new());

        let handle = StatusPoller::spawn(backend.clone(), gate.clone(), Duration::from_secs(10))
            .expect("first spawn must start");

        handle.await.unwrap();
        assert!(gate.is_ready());
        assert_eq!(backend.status_calls(), 2);
    }
}
