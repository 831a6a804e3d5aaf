//! Typed notification emitters with error-burst suppression.
//!
//! Route handlers call these instead of writing to the store directly so the
//! titles, categories and metadata stay uniform. Repeated server errors for
//! the same path+message are suppressed for a cooldown window to keep an
//! outage from flooding the notification list.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::json;

use reportiq_core::{defaults, NotificationStore, NotificationType};

#[derive(Clone)]
pub struct Notifier {
    store: Arc<NotificationStore>,
    cooldown: Duration,
    last_error: Arc<Mutex<HashMap<String, Instant>>>,
}

impl Notifier {
    pub fn new(store: Arc<NotificationStore>) -> Self {
        Self::with_cooldown(
            store,
            Duration::from_secs(defaults::ERROR_NOTIFY_COOLDOWN_SECS),
        )
    }

    pub fn with_cooldown(store: Arc<NotificationStore>, cooldown: Duration) -> Self {
        Self {
            store,
            cooldown,
            last_error: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    pub fn file_upload_success(&self, filename: &str, report_id: &str, file_size: u64) {
        self.store.push(
            NotificationType::Success,
            "File Upload Successful",
            &format!(
                "{} has been successfully uploaded and processed. Report ID: {}",
                filename, report_id
            ),
            "data",
            json!({
                "filename": filename,
                "reportId": report_id,
                "fileSize": file_size,
                "action": "file_upload"
            }),
        );
    }

    pub fn file_upload_error(&self, filename: &str, error: &str) {
        self.store.push(
            NotificationType::Error,
            "File Upload Error",
            &format!("Error occurred while uploading {}: {}", filename, error),
            "data",
            json!({ "filename": filename, "error": error, "action": "file_upload_error" }),
        );
    }

    pub fn analysis_success(&self, report_id: &str, analysis_type: &str) {
        self.store.push(
            NotificationType::Success,
            "AI Analysis Completed",
            &format!(
                "{} analysis has been completed successfully. Report ID: {}",
                analysis_type, report_id
            ),
            "ai",
            json!({
                "reportId": report_id,
                "analysisType": analysis_type,
                "action": "analysis_success"
            }),
        );
    }

    /// Analysis failures dedup like server errors: the same report, type and
    /// error text notify once per cooldown so an outage does not flood the
    /// list with one entry per retried dashboard poll.
    pub fn analysis_error(&self, report_id: &str, analysis_type: &str, error: &str) -> bool {
        let key = format!("analysis:{}:{}:{}", report_id, analysis_type, error);
        if !self.pass_cooldown(key) {
            return false;
        }
        self.store.push(
            NotificationType::Error,
            "AI Analysis Error",
            &format!("Error occurred during {} analysis: {}", analysis_type, error),
            "ai",
            json!({
                "reportId": report_id,
                "analysisType": analysis_type,
                "error": error,
                "action": "analysis_error"
            }),
        );
        true
    }

    pub fn chat_success(&self, message_length: usize) {
        self.store.push(
            NotificationType::Info,
            "AI Chat Completed",
            &format!(
                "Chat with AI assistant completed. Message length: {} characters",
                message_length
            ),
            "chat",
            json!({ "messageLength": message_length, "action": "chat_success" }),
        );
    }

    pub fn chat_error(&self, error: &str) {
        self.store.push(
            NotificationType::Error,
            "AI Chat Error",
            &format!("Error occurred during chat with AI assistant: {}", error),
            "chat",
            json!({ "error": error, "action": "chat_error" }),
        );
    }

    pub fn system_status(&self, status: &str, message: &str) {
        let kind = if status == "healthy" {
            NotificationType::Success
        } else if status == "error" {
            NotificationType::Error
        } else {
            NotificationType::Warning
        };
        self.store.push(
            kind,
            "System Status",
            message,
            "system",
            json!({ "status": status, "action": "system_status" }),
        );
    }

    /// Report a server error for a request path. Identical path+message
    /// pairs are suppressed until the cooldown elapses; returns whether a
    /// notification was actually written.
    pub fn server_error(&self, path: &str, message: &str) -> bool {
        if !self.pass_cooldown(format!("{}:{}", path, message)) {
            return false;
        }
        self.system_status("error", &format!("Server error: {} - {}", message, path));
        true
    }

    /// True when `key` has not fired within the cooldown window; records the
    /// firing time as a side effect.
    fn pass_cooldown(&self, key: String) -> bool {
        let now = Instant::now();
        let mut last = self.last_error.lock().expect("cooldown map poisoned");
        if let Some(prev) = last.get(&key) {
            if now.duration_since(*prev) < self.cooldown {
                return false;
            }
        }
        last.insert(key, now);
        true
    }
}
