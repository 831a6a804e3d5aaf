//! Shared application state for the gateway.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use governor::{Quota, RateLimiter};
use tokio::sync::RwLock;

use reportiq_ai::{AnalysisBackend, EmbeddingGate};
use reportiq_core::{NotificationStore, Settings, UploadPolicy};

use crate::config::GatewayConfig;
use crate::services::Notifier;

/// Global rate limiter type (direct quota, no keyed bucketing).
pub type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upstream AI analysis service.
    pub ai: Arc<dyn AnalysisBackend>,
    /// Notification store plus typed emitters.
    pub notifier: Notifier,
    /// In-memory user settings.
    pub settings: Arc<RwLock<Settings>>,
    /// Embedding readiness latch.
    pub gate: Arc<EmbeddingGate>,
    pub config: Arc<GatewayConfig>,
    /// Global rate limiter (None if rate limiting is disabled).
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: GatewayConfig, ai: Arc<dyn AnalysisBackend>) -> Self {
        let rate_limiter = build_rate_limiter(&config);
        Self {
            ai,
            notifier: Notifier::new(Arc::new(NotificationStore::new())),
            settings: Arc::new(RwLock::new(Settings::default())),
            gate: Arc::new(EmbeddingGate::new()),
            config: Arc::new(config),
            rate_limiter,
            started_at: Instant::now(),
        }
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            max_size_bytes: self.config.max_file_size,
            allowed_extensions: self.config.allowed_file_types.clone(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Build the process-wide limiter from config. The window/max pair is
/// expressed to governor as one permit per `window / max` with the full
/// window's worth of burst.
pub fn build_rate_limiter(config: &GatewayConfig) -> Option<Arc<GlobalRateLimiter>> {
    if !config.rate_limit_enabled {
        return None;
    }
    let max = NonZeroU32::new(config.rate_limit_max_requests.max(1))
        .expect("max requests is at least 1");
    let period = config.rate_limit_window / config.rate_limit_max_requests.max(1);
    let quota = Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(max))
        .allow_burst(max);
    Some(Arc::new(RateLimiter::direct(quota)))
}
