//! Gateway configuration, parsed once from the environment at startup.

use std::path::PathBuf;
use std::time::Duration;

use reportiq_core::defaults;

/// Runtime configuration owned by `AppState`.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub ai_service_url: String,
    pub ai_api_key: Option<String>,
    pub upload_dir: PathBuf,
    pub max_file_size: u64,
    pub allowed_file_types: Vec<String>,
    pub rate_limit_window: Duration,
    pub rate_limit_max_requests: u32,
    pub rate_limit_enabled: bool,
    pub poll_interval: Duration,
    /// `APP_ENV=development` exposes error details in responses.
    pub development: bool,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl GatewayConfig {
    /// Read configuration from environment variables, falling back to the
    /// defaults in `reportiq_core::defaults`.
    pub fn from_env() -> Self {
        let allowed_file_types = std::env::var("ALLOWED_FILE_TYPES")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_ascii_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| {
                defaults::ALLOWED_FILE_TYPES
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            });

        let app_env =
            std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("PORT", defaults::PORT),
            ai_service_url: std::env::var("AI_SERVICE_URL")
                .unwrap_or_else(|_| defaults::AI_SERVICE_URL.to_string()),
            ai_api_key: std::env::var("AI_SERVICE_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            upload_dir: PathBuf::from(
                std::env::var("UPLOAD_DIR").unwrap_or_else(|_| defaults::UPLOAD_DIR.to_string()),
            ),
            max_file_size: env_or("MAX_FILE_SIZE", defaults::MAX_FILE_SIZE_BYTES),
            allowed_file_types,
            rate_limit_window: Duration::from_millis(env_or(
                "RATE_LIMIT_WINDOW_MS",
                defaults::RATE_LIMIT_WINDOW_MS,
            )),
            rate_limit_max_requests: env_or(
                "RATE_LIMIT_MAX_REQUESTS",
                defaults::RATE_LIMIT_MAX_REQUESTS,
            ),
            rate_limit_enabled: std::env::var("RATE_LIMIT_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            poll_interval: Duration::from_secs(env_or(
                "EMBEDDING_POLL_INTERVAL_SECS",
                defaults::EMBEDDING_POLL_INTERVAL_SECS,
            )),
            development: app_env != "production",
        }
    }

    pub fn environment(&self) -> &'static str {
        if self.development {
            "development"
        } else {
            "production"
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: defaults::PORT,
            ai_service_url: defaults::AI_SERVICE_URL.to_string(),
            ai_api_key: None,
            upload_dir: PathBuf::from(defaults::UPLOAD_DIR),
            max_file_size: defaults::MAX_FILE_SIZE_BYTES,
            allowed_file_types: defaults::ALLOWED_FILE_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rate_limit_window: Duration::from_millis(defaults::RATE_LIMIT_WINDOW_MS),
            rate_limit_max_requests: defaults::RATE_LIMIT_MAX_REQUESTS,
            rate_limit_enabled: true,
            poll_interval: Duration::from_secs(defaults::EMBEDDING_POLL_INTERVAL_SECS),
            development: true,
        }
    }
}
