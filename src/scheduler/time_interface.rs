use async_trait::async_trait;
use tokio::time::{Duration, Instant};

/// Monotonic clock plus cooperative "sleep until" suspension.
///
/// Times are seconds on the implementation's monotonic timeline (an event
/// time). `sleep_until` yields to the scheduler and returns the actual
/// resumption time, which may be later than requested.
#[async_trait]
pub trait TimeInterface: Send + Sync {
    fn now_monotonic(&self) -> f64;
    async fn sleep_until(&self, waketime: f64) -> f64;
}

// Roughly 30 years; tokio clamps longer sleeps anyway.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `TimeInterface` over the tokio timer, measured from reactor creation.
#[derive(Debug, Clone)]
pub struct TokioReactor {
    epoch: Instant,
}

impl TokioReactor {
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }

    fn instant_at(&self, eventtime: f64) -> Instant {
        // Negative or NaN targets are already in the past.
        if eventtime.is_nan() || eventtime <= 0.0 {
            return self.epoch;
        }
        Duration::try_from_secs_f64(eventtime)
            .ok()
            .and_then(|offset| self.epoch.checked_add(offset))
            .unwrap_or_else(|| self.far_future())
    }

    /// Stand-in for wake times past what `Instant` can represent.
    fn far_future(&self) -> Instant {
        self.epoch
            .checked_add(FAR_FUTURE)
            .unwrap_or(self.epoch)
    }
}

impl Default for TokioReactor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimeInterface for TokioReactor {
    fn now_monotonic(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    async fn sleep_until(&self, waketime: f64) -> f64 {
        tokio::time::sleep_until(self.instant_at(waketime)).await;
        self.now_monotonic()
    }
}
