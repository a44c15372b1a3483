//! API configuration.

use std::path::PathBuf;

use vidlens_reducer::ReductionStrategy;

/// Default upload limit (50 MiB).
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second, per client IP
    pub rate_limit_rps: u32,
    /// Max upload size in bytes
    pub max_upload_size: usize,
    /// Strategy used when a request does not pick one
    pub analysis_mode: ReductionStrategy,
    /// Directory with the browser client, served as a fallback
    pub static_dir: Option<PathBuf>,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            analysis_mode: ReductionStrategy::Timeline,
            static_dir: None,
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    ///
    /// An unrecognised `ANALYSIS_MODE` is logged and replaced by the default.
    pub fn from_env() -> Self {
        let analysis_mode = match std::env::var("ANALYSIS_MODE") {
            Ok(mode) if !mode.trim().is_empty() => mode.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, falling back to timeline", e);
                ReductionStrategy::Timeline
            }),
            _ => ReductionStrategy::Timeline,
        };

        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            max_upload_size: std::env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE),
            analysis_mode,
            static_dir: std::env::var("STATIC_DIR")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
