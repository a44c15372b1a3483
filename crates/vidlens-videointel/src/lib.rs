//! Google Video Intelligence REST client.
//!
//! This crate provides:
//! - `videos:annotate` submission with inline (base64) video content
//! - Long-running operation polling with a deadline
//! - Service account authentication via gcp_auth with token caching
//! - Retry with exponential backoff and jitter
//! - An `AnnotationProvider` implementation for the reducer

pub mod client;
pub mod error;
pub mod metrics;
pub mod retry;
pub mod token_cache;
pub mod types;


pub use client::{VideoIntelClient, VideoIntelConfig};
pub use error::{VideoIntelError, VideoIntelResult};
pub use retry::RetryConfig;
pub use token_cache::{AccessTokenSource, StaticToken, TokenCache};
pub use types::Feature;
