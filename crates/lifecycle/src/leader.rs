//! Leadership status, cached from an external election source.
//!
//! A fleet of replicas runs the expiry sweep timer independently; only the
//! replica whose identity matches the currently elected name executes a
//! tick. The election source (a Kubernetes elector sidecar, in practice) is
//! polled at most once per `query_interval`; between polls the cached value
//! is served. This is best-effort mutual exclusion: during a leadership
//! transfer two replicas can disagree for up to one polling interval, and
//! the conditional store updates make that harmless.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;

/// Default minimum interval between queries to the election source.
const DEFAULT_QUERY_INTERVAL: Duration = Duration::from_secs(60);

/// HTTP request timeout for a single election query.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum LeaderError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Election source returned HTTP {0}")]
    HttpStatus(u16),
}

/// The external election contract: who is currently elected.
#[async_trait]
pub trait LeaderSource: Send + Sync {
    async fn current_leader(&self) -> Result<String, LeaderError>;
}

/// Response body of the elector sidecar.
#[derive(Debug, Deserialize)]
struct ElectorResponse {
    name: String,
}

/// Queries an elector sidecar over HTTP.
pub struct HttpLeaderSource {
    client: reqwest::Client,
    url: String,
}

impl HttpLeaderSource {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl LeaderSource for HttpLeaderSource {
    async fn current_leader(&self) -> Result<String, LeaderError> {
        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(LeaderError::HttpStatus(response.status().as_u16()));
        }
        let body: ElectorResponse = response.json().await?;
        Ok(body.name)
    }
}

/// Cached leadership status for this replica.
///
/// Owned by the sweep processor — deliberately plain mutable state injected
/// where it is used, not a process-wide static.
pub struct LeaderElector {
    source: Box<dyn LeaderSource>,
    identity: String,
    query_interval: Duration,
    cached: bool,
    last_query: Option<Instant>,
}

impl LeaderElector {
    pub fn new(source: Box<dyn LeaderSource>, identity: impl Into<String>) -> Self {
        Self::with_interval(source, identity, DEFAULT_QUERY_INTERVAL)
    }

    pub fn with_interval(
        source: Box<dyn LeaderSource>,
        identity: impl Into<String>,
        query_interval: Duration,
    ) -> Self {
        Self {
            source,
            identity: identity.into(),
            query_interval,
            cached: false,
            last_query: None,
        }
    }

    /// Build from environment: `ELECTOR_URL` (required), `HOSTNAME` (this
    /// replica's identity), `LEADER_QUERY_INTERVAL_SECS` (default 60).
    ///
    /// # Panics
    ///
    /// Panics if `ELECTOR_URL` or `HOSTNAME` is unset; leadership gating
    /// cannot work without them, so misconfiguration fails fast at startup.
    pub fn from_env() -> Self {
        let url = std::env::var("ELECTOR_URL").expect("ELECTOR_URL must be set");
        let identity = std::env::var("HOSTNAME").expect("HOSTNAME must be set");
        let interval_secs: u64 = std::env::var("LEADER_QUERY_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_QUERY_INTERVAL.as_secs());

        Self::with_interval(
            Box::new(HttpLeaderSource::new(url)),
            identity,
            Duration::from_secs(interval_secs),
        )
    }

    /// Whether this replica is currently the leader.
    ///
    /// Re-queries the election source only if more than `query_interval`
    /// has elapsed since the last query. A query failure is logged and the
    /// previous cached value is served; the failure also counts as a query
    /// so a down elector is probed once per interval, not once per call.
    pub async fn is_leader(&mut self) -> bool {
        let due = match self.last_query {
            None => true,
            Some(at) => at.elapsed() > self.query_interval,
        };

        if due {
            match self.source.current_leader().await {
                Ok(name) => {
                    self.cached = name == self.identity;
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        cached = self.cached,
                        "Leader query failed, keeping cached leadership status"
                    );
                }
            }
            self.last_query = Some(Instant::now());
        }

        self.cached
    }
}
