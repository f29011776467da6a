use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use nominatim_client::{Place, SearchRequest};

use crate::traits::Geocoder;

/// Spaces calls at least `min_interval` apart, measured start to start.
pub struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval,
        }
    }

    pub fn from_millis(min_interval_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_interval_ms))
    }

    /// Sleep until the next call is allowed, then claim the slot.
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                debug!(?wait_time, "Rate limiting");
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// A geocoder whose calls, search and reverse alike, share one rate limit.
pub struct Throttled<G> {
    inner: G,
    limiter: RateLimiter,
}

impl<G: Geocoder> Throttled<G> {
    pub fn new(inner: G, min_interval: Duration) -> Self {
        Self {
            inner,
            limiter: RateLimiter::new(min_interval),
        }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: Geocoder> Geocoder for Throttled<G> {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Place>> {
        self.limiter.wait().await;
        self.inner.search(request).await
    }

    async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>> {
        self.limiter.wait().await;
        self.inner.reverse(lat, lon).await
    }
}
