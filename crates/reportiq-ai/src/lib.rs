//! # reportiq-ai
//!
//! Client for the upstream analysis service.
//!
//! This crate provides:
//! - Pluggable analysis backend trait
//! - HTTP implementation over reqwest
//! - Embedding-readiness snapshot parsing and a monotonic readiness gate
//! - Background status poller driving the gate

pub mod backend;
pub mod client;
pub mod status;

// Mock analysis backend for testing
pub mod mock;

pub use backend::{AnalysisBackend, UploadFile};
pub use client::AnalysisClient;
pub use status::{EmbeddingGate, EmbeddingSnapshot, StatusPoller};

// Re-export core types
pub use reportiq_core::{Error, Result};
