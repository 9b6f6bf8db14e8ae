// src/client/rate_limit.rs

use async_trait::async_trait;
use log::trace;
use std::time::Duration;
use tokio::{sync::Mutex, time::Instant};

/// Time source for the limiter.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Keeps every outbound request at least `interval` apart.
///
/// The remote host enforces a single global budget, so one limiter is shared
/// by API calls, existence probes and asset downloads alike. Waiters queue on
/// the inner mutex, which lets exactly one of them through per interval.
pub struct RateLimiter {
    interval: Duration,
    clock: Box<dyn Clock>,
    last_permitted: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(interval, Box::new(TokioClock))
    }

    pub fn with_clock(interval: Duration, clock: Box<dyn Clock>) -> Self {
        Self {
            interval,
            clock,
            last_permitted: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn acquire(&self) {
        let mut last = self.last_permitted.lock().await;
        if let Some(previous) = *last {
            let elapsed = self.clock.now().saturating_duration_since(previous);
            if elapsed < self.interval {
                let wait = self.interval - elapsed;
                trace!("Rate limit: waiting {:?} before the next request", wait);
                self.clock.sleep(wait).await;
            }
        }
        *last = Some(self.clock.now());
    }
}
