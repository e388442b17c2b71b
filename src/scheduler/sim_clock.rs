//! Simulation clock for deterministic wait tests and benchmarks.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

use super::time_interface::TimeInterface;

#[derive(Debug, Default)]
struct SimClockState {
    current_time: f64,
    wake_requests: Vec<f64>,
}

/// Virtual clock. `sleep_until` jumps straight to the requested time (plus an
/// optional overshoot), records the request and yields once to the runtime.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    state: Arc<Mutex<SimClockState>>,
    overshoot: f64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(start: f64) -> Self {
        let clock = Self::new();
        clock.lock().current_time = start;
        clock
    }

    /// Every wake-up lands `overshoot` seconds after the requested time.
    pub fn with_overshoot(mut self, overshoot: f64) -> Self {
        self.overshoot = overshoot;
        self
    }

    /// Wake times requested through `sleep_until`, in call order.
    pub fn wake_requests(&self) -> Vec<f64> {
        self.lock().wake_requests.clone()
    }

    pub fn sleep_count(&self) -> usize {
        self.lock().wake_requests.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl TimeInterface for SimClock {
    fn now_monotonic(&self) -> f64 {
        self.lock().current_time
    }

    async fn sleep_until(&self, waketime: f64) -> f64 {
        let woke = {
            let mut state = self.lock();
            state.wake_requests.push(waketime);
            state.current_time = state.current_time.max(waketime) + self.overshoot;
            state.current_time
        };
        tokio::task::yield_now().await;
        woke
    }
}
