//! Cache connectivity probe.
//!
//! # Responsibilities
//! - Open a connection to the configured cache service
//! - Issue a `PING` and check for `PONG`
//! - Collapse every failure (refusal, timeout, bad reply) into `false`

use std::time::Duration;

use async_trait::async_trait;
use tokio::time;

use crate::config::CacheConfig;
use crate::observability::metrics;

/// Reachability check against an external cache service.
///
/// Implementations must never fail: every error state is reported as `false`.
#[async_trait]
pub trait CacheProbe: Send + Sync {
    async fn ping(&self) -> bool;
}

/// Probe that talks to Redis, one fresh connection per call.
#[derive(Debug, Clone)]
pub struct RedisProbe {
    url: String,
    timeout: Duration,
}

impl RedisProbe {
    /// Create a probe for `address`, which is either `host:port` or a full URL.
    pub fn new(address: &str, timeout: Duration) -> Self {
        let url = if address.contains("://") {
            address.to_string()
        } else {
            format!("redis://{}", address)
        };
        Self { url, timeout }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(&config.address, config.probe_timeout())
    }

    /// Connection URL used by this probe.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn round_trip(&self) -> redis::RedisResult<String> {
        let client = redis::Client::open(self.url.as_str())?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await
    }
}

#[async_trait]
impl CacheProbe for RedisProbe {
    async fn ping(&self) -> bool {
        let reachable = match time::timeout(self.timeout, self.round_trip()).await {
            Ok(Ok(reply)) if reply == "PONG" => true,
            Ok(Ok(reply)) => {
                tracing::debug!(url = %self.url, reply = %reply, "Cache probe got unexpected reply");
                false
            }
            Ok(Err(e)) => {
                tracing::debug!(url = %self.url, error = %e, "Cache probe failed");
                false
            }
            Err(_) => {
                tracing::debug!(url = %self.url, timeout = ?self.timeout, "Cache probe timed out");
                false
            }
        };

        metrics::record_cache_probe(reachable);
        reachable
    }
}
