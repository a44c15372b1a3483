//! Bearer tokens for Video Intelligence requests.
//!
//! A fetched token is held as a [`Lease`]. Once within [`REFRESH_MARGIN`] of
//! expiry the lease turns stale: callers refresh it, but keep using it if the
//! refresh fails and the token has not actually expired yet.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gcp_auth::TokenProvider;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{VideoIntelError, VideoIntelResult};

/// How long before expiry a lease is refreshed.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when the expiry cannot be converted (50 minutes).
const FALLBACK_LIFETIME: Duration = Duration::from_secs(50 * 60);

/// OAuth scope for the Video Intelligence API.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Source of bearer tokens for API requests.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// Return a token valid for at least the next request.
    async fn access_token(&self) -> VideoIntelResult<String>;

    /// Drop any cached token so the next call fetches a fresh one.
    async fn invalidate(&self) {}
}

/// Fixed token, for emulators and tests.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> VideoIntelResult<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Freshness {
    Fresh,
    /// Refresh due, still accepted by the API.
    Stale,
    Expired,
}

#[derive(Debug, Clone)]
struct Lease {
    token: String,
    expires_at: Instant,
}

impl Lease {
    /// Pin a wall-clock expiry to the monotonic clock.
    fn new(token: String, expiry: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let remaining = if expiry > now {
            (expiry - now).to_std().unwrap_or(FALLBACK_LIFETIME)
        } else {
            Duration::ZERO
        };
        Self {
            token,
            expires_at: Instant::now() + remaining,
        }
    }

    fn freshness(&self, at: Instant) -> Freshness {
        if at >= self.expires_at {
            Freshness::Expired
        } else if at + REFRESH_MARGIN >= self.expires_at {
            Freshness::Stale
        } else {
            Freshness::Fresh
        }
    }
}

/// Token source backed by a gcp_auth provider, sharing one lease across tasks.
pub struct TokenCache {
    auth: Arc<dyn TokenProvider>,
    lease: RwLock<Option<Lease>>,
}

impl TokenCache {
    pub fn new(auth: Arc<dyn TokenProvider>) -> Self {
        Self {
            auth,
            lease: RwLock::new(None),
        }
    }

    async fn fresh_token(&self) -> Option<String> {
        let lease = self.lease.read().await;
        lease
            .as_ref()
            .filter(|l| l.freshness(Instant::now()) == Freshness::Fresh)
            .map(|l| l.token.clone())
    }
}

#[async_trait]
impl AccessTokenSource for TokenCache {
    async fn access_token(&self) -> VideoIntelResult<String> {
        if let Some(token) = self.fresh_token().await {
            return Ok(token);
        }

        // Single refresh at a time; re-check once the lock is ours.
        let mut slot = self.lease.write().await;
        let state = slot.as_ref().map(|l| l.freshness(Instant::now()));
        if let (Some(lease), Some(Freshness::Fresh)) = (slot.as_ref(), state) {
            return Ok(lease.token.clone());
        }

        match self.auth.token(&[CLOUD_PLATFORM_SCOPE]).await {
            Ok(token) => {
                let lease = Lease::new(token.as_str().to_string(), token.expires_at(), Utc::now());
                debug!(
                    valid_for_secs = lease.expires_at.saturating_duration_since(Instant::now()).as_secs(),
                    "Fetched Video Intelligence access token"
                );
                let value = lease.token.clone();
                *slot = Some(lease);
                Ok(value)
            }
            Err(e) => match (slot.as_ref(), state) {
                (Some(lease), Some(Freshness::Stale)) => {
                    warn!("Token refresh failed, reusing current token: {}", e);
                    Ok(lease.token.clone())
                }
                _ => Err(VideoIntelError::auth_error(format!(
                    "Failed to obtain auth token: {}",
                    e
                ))),
            },
        }
    }

    async fn invalidate(&self) {
        self.lease.write().await.take();
    }
}
