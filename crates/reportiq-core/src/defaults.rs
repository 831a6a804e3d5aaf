//! Configuration defaults shared across the reportiq crates.
//!
//! Every value here can be overridden through the environment (see the
//! gateway's `GatewayConfig`); these constants are the fallbacks.

/// Default base URL of the upstream AI analysis service.
pub const AI_SERVICE_URL: &str = "http://localhost:5000";

/// Timeout for general-purpose calls to the AI service (seconds).
pub const AI_TIMEOUT_SECS: u64 = 30;

/// Timeout for AI service health probes (seconds).
///
/// Materially shorter than the general timeout so a slow-but-alive upstream
/// is not reported as down.
pub const AI_HEALTH_TIMEOUT_SECS: u64 = 5;

/// Default HTTP listen port.
pub const PORT: u16 = 8000;

/// Default directory for locally stored uploads.
pub const UPLOAD_DIR: &str = "uploads";

/// Maximum accepted upload size in bytes (50 MB).
pub const MAX_FILE_SIZE_BYTES: u64 = 52_428_800;

/// Extensions accepted for report uploads.
pub const ALLOWED_FILE_TYPES: &[&str] = &["pdf", "csv", "xlsx", "xls"];

/// Rate limit window (milliseconds).
pub const RATE_LIMIT_WINDOW_MS: u64 = 900_000;

/// Requests allowed per rate limit window.
pub const RATE_LIMIT_MAX_REQUESTS: u32 = 1000;

/// Interval between embedding-status polls (seconds).
pub const EMBEDDING_POLL_INTERVAL_SECS: u64 = 10;

/// Cooldown before an identical error notification may be emitted again
/// (seconds).
pub const ERROR_NOTIFY_COOLDOWN_SECS: u64 = 300;

/// Report identifier length bounds.
pub const MIN_REPORT_ID_LEN: usize = 1;
pub const MAX_REPORT_ID_LEN: usize = 100;

/// Free-text query length bounds.
pub const MIN_QUERY_LEN: usize = 3;
pub const MAX_QUERY_LEN: usize = 1000;

/// Batch query item bounds.
pub const MIN_BATCH_QUERIES: usize = 1;
pub const MAX_BATCH_QUERIES: usize = 10;

/// Maximum chat message length.
pub const MAX_CHAT_MESSAGE_LEN: usize = 1000;

/// Forecast horizon bounds (periods).
pub const MIN_FORECAST_PERIODS: u32 = 1;
pub const MAX_FORECAST_PERIODS: u32 = 24;
pub const DEFAULT_FORECAST_PERIODS: u32 = 6;
