//! In-memory notification store.
//!
//! Notifications are user-facing event records (upload success/failure,
//! analysis success/failure, chat outcomes, system status). The store is a
//! mutex-guarded vector owned by the process: ids are unique and increasing
//! for the process lifetime, entries are kept newest-first, and nothing is
//! evicted (known limitation, accepted for this service's scope).

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Severity/kind of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationType {
    /// Parse a wire value, rejecting anything outside the fixed enum.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "info" => Some(Self::Info),
            "success" => Some(Self::Success),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single user-facing event record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub category: String,
    /// RFC 3339 creation timestamp.
    pub timestamp: String,
    pub read: bool,
    /// Opaque event context (filenames, report ids, error text).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Process-owned notification store.
///
/// Mutation is mutex-guarded: handlers run on a multi-threaded runtime and
/// may append and list concurrently.
pub struct NotificationStore {
    entries: Mutex<Vec<Notification>>,
    next_id: AtomicI64,
}

impl NotificationStore {
    /// Create a store seeded with the startup notification.
    pub fn new() -> Self {
        let store = Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        };
        store.push(
            NotificationType::Info,
            "System Started",
            "reportiq gateway has been successfully started.",
            "system",
            serde_json::Value::Null,
        );
        store
    }

    /// Append a notification; returns the stored record.
    pub fn push(
        &self,
        kind: NotificationType,
        title: &str,
        message: &str,
        category: &str,
        metadata: serde_json::Value,
    ) -> Notification {
        let notification = Notification {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            kind,
            title: title.to_string(),
            message: message.to_string(),
            category: category.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            read: false,
            metadata,
        };
        let mut entries = self.entries.lock().expect("notification store poisoned");
        // Newest first
        entries.insert(0, notification.clone());
        tracing::debug!(
            id = notification.id,
            kind = %notification.kind,
            title = %notification.title,
            category = %notification.category,
            "Notification created"
        );
        notification
    }

    /// List notifications, newest first, optionally unread-only, capped at
    /// `limit` entries.
    pub fn list(&self, unread_only: bool, limit: usize) -> Vec<Notification> {
        let entries = self.entries.lock().expect("notification store poisoned");
        entries
            .iter()
            .filter(|n| !unread_only || !n.read)
            .take(limit)
            .cloned()
            .collect()
    }

    /// (unread, total) counts.
    pub fn counts(&self) -> (usize, usize) {
        let entries = self.entries.lock().expect("notification store poisoned");
        let unread = entries.iter().filter(|n| !n.read).count();
        (unread, entries.len())
    }

    /// Flip a single notification to read. Returns the updated record.
    pub fn mark_read(&self, id: i64) -> Option<Notification> {
        let mut entries = self.entries.lock().expect("notification store poisoned");
        let notification = entries.iter_mut().find(|n| n.id == id)?;
        notification.read = true;
        Some(notification.clone())
    }

    /// Mark every notification read. Returns how many were flipped.
    pub fn mark_all_read(&self) -> usize {
        let mut entries = self.entries.lock().expect("notification store poisoned");
        let mut updated = 0;
        for n in entries.iter_mut() {
            if !n.read {
                n.read = true;
                updated += 1;
            }
        }
        updated
    }

    /// Remove a notification. Returns the removed record.
    pub fn delete(&self, id: i64) -> Option<Notification> {
        let mut entries = self.entries.lock().expect("notification store poisoned");
        let idx = entries.iter().position(|n| n.id == id)?;
        Some(entries.remove(idx))
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_is_seeded_with_startup_entry() {
        let store = NotificationStore::new();
        let all = store.list(false, 50);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, 1);
        assert_eq!(all[0].title, "System Started");
        assert_eq!(all[0].kind, NotificationType::Info);
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let store = NotificationStore::new();
        let a = store.push(
            NotificationType::Info,
            "a",
            "m",
            "system",
            serde_json::Value::Null,
        );
        let b = store.push(
            NotificationType::Success,
            "b",
            "m",
            "ai",
            serde_json::Value::Null,
        );
        assert!(b.id > a.id);
    }

    #[test]
    fn test_list_newest_first() {
        let store = NotificationStore::new();
        store.push(
            NotificationType::Info,
            "older",
            "m",
            "system",
            serde_json::Value::Null,
        );
        store.push(
            NotificationType::Info,
            "newer",
            "m",
            "system",
            serde_json::Value::Null,
        );
        let all = store.list(false, 50);
        assert_eq!(all[0].title, "newer");
        assert_eq!(all[1].title, "older");
    }

    #[test]
    fn test_list_unread_only_and_limit() {
        let store = NotificationStore::new();
        for i in 0..5 {
            store.push(
                NotificationType::Info,
                &format!("n{}", i),
                "m",
                "system",
                serde_json::Value::Null,
            );
        }
        let first = store.list(false, 50)[0].id;
        store.mark_read(first);

        let unread = store.list(true, 50);
        assert!(unread.iter().all(|n| !n.read));
        assert!(unread.iter().all(|n| n.id != first));

        let limited = store.list(false, 2);
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_mark_read_and_counts() {
        let store = NotificationStore::new();
        let n = store.push(
            NotificationType::Warning,
            "t",
            "m",
            "system",
            serde_json::Value::Null,
        );
        let (unread, total) = store.counts();
        assert_eq!((unread, total), (2, 2));

        let updated = store.mark_read(n.id).unwrap();
        assert!(updated.read);
        let (unread, total) = store.counts();
        assert_eq!((unread, total), (1, 2));
    }

    #[test]
    fn test_mark_all_read_returns_flipped_count() {
        let store = NotificationStore::new();
        store.push(
            NotificationType::Info,
            "t",
            "m",
            "system",
            serde_json::Value::Null,
        );
        assert_eq!(store.mark_all_read(), 2);
        assert_eq!(store.mark_all_read(), 0);
    }

    #[test]
    fn test_delete_unknown_id_is_none() {
        let store = NotificationStore::new();
        assert!(store.delete(999).is_none());
        let n = store.push(
            NotificationType::Error,
            "t",
            "m",
            "system",
            serde_json::Value::Null,
        );
        let removed = store.delete(n.id).unwrap();
        assert_eq!(removed.id, n.id);
        assert!(store.delete(n.id).is_none());
    }

    #[test]
    fn test_type_parse_rejects_unknown() {
        assert_eq!(
            NotificationType::parse("success"),
            Some(NotificationType::Success)
        );
        assert_eq!(NotificationType::parse("critical"), None);
    }

    #[test]
    fn test_wire_shape_uses_type_field() {
        let store = NotificationStore::new();
        let n = store.push(
            NotificationType::Error,
            "t",
            "m",
            "ai",
            serde_json::json!({"reportId": "r1"}),
        );
        let v = serde_json::to_value(&n).unwrap();
        assert_eq!(v["type"], "error");
        assert_eq!(v["metadata"]["reportId"], "r1");
        assert_eq!(v["read"], false);
    }
}
