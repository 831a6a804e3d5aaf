//! # reportiq-core
//!
//! Core types and in-process stores for the reportiq gateway.
//!
//! This crate provides the foundational pieces the gateway crates depend on:
//! the error taxonomy, configuration defaults, the notification store, the
//! user settings model, and upload file validation.

pub mod defaults;
pub mod error;
pub mod file_safety;
pub mod notifications;
pub mod settings;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use file_safety::{sanitize_filename, stored_file_name, UploadPolicy, UploadRejection};
pub use notifications::{Notification, NotificationStore, NotificationType};
pub use settings::Settings;
