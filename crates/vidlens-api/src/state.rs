//! Application state.

use std::sync::Arc;

use vidlens_reducer::{AnnotationProvider, VideoAnalyzer};
use vidlens_videointel::VideoIntelClient;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub analyzer: Arc<VideoAnalyzer>,
}

impl AppState {
    /// Create state backed by the Video Intelligence client.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let client = VideoIntelClient::from_env()?;
        Ok(Self::with_provider(config, Arc::new(client)))
    }

    /// Create state around an arbitrary annotation provider.
    pub fn with_provider(config: ApiConfig, provider: Arc<dyn AnnotationProvider>) -> Self {
        let analyzer = VideoAnalyzer::new(provider).with_default_strategy(config.analysis_mode);
        Self {
            config,
            analyzer: Arc::new(analyzer),
        }
    }
}
