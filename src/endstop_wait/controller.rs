// src/endstop_wait/controller.rs - Sample/decide/suspend loop
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::config::WaitConfig;
use crate::hardware::EndstopResolver;
use crate::host_os::HostLiveness;
use crate::scheduler::TimeInterface;

use super::store::LastStateStore;
use super::{EndstopStatus, WaitError, WaitOutcome, WaitRequest, WaitTermination};

/// Dwell between samples, chosen only by whether the wait has a budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DwellPolicy {
    pub bounded: f64,
    pub continuous: f64,
}

impl DwellPolicy {
    pub fn dwell_for(&self, max_attempts: Option<NonZeroU32>) -> f64 {
        match max_attempts {
            Some(_) => self.bounded,
            None => self.continuous,
        }
    }
}

impl Default for DwellPolicy {
    fn default() -> Self {
        Self::from(&WaitConfig::default())
    }
}

impl From<&WaitConfig> for DwellPolicy {
    fn from(config: &WaitConfig) -> Self {
        Self {
            bounded: config.bounded_dwell,
            continuous: config.continuous_dwell,
        }
    }
}

/// Waits for endstops to reach a state and remembers the last result per name.
pub struct EndstopWaiter {
    resolver: Arc<dyn EndstopResolver>,
    time: Arc<dyn TimeInterface>,
    host: Arc<dyn HostLiveness>,
    store: LastStateStore,
    dwell: DwellPolicy,
}

impl EndstopWaiter {
    pub fn new(
        resolver: Arc<dyn EndstopResolver>,
        time: Arc<dyn TimeInterface>,
        host: Arc<dyn HostLiveness>,
    ) -> Self {
        Self::with_store(resolver, time, host, LastStateStore::new())
    }

    /// Use an existing store, e.g. one already handed to a status reader.
    pub fn with_store(
        resolver: Arc<dyn EndstopResolver>,
        time: Arc<dyn TimeInterface>,
        host: Arc<dyn HostLiveness>,
        store: LastStateStore,
    ) -> Self {
        Self {
            resolver,
            time,
            host,
            store,
            dwell: DwellPolicy::default(),
        }
    }

    pub fn with_dwell(mut self, dwell: DwellPolicy) -> Self {
        self.dwell = dwell;
        self
    }

    pub fn store(&self) -> &LastStateStore {
        &self.store
    }

    /// Sample `request.endstop` until it matches `request.triggered`, the
    /// attempt budget runs out, or the host stops operating.
    ///
    /// The endstop is resolved once per call. An unknown name fails before any
    /// sample is taken or anything is recorded. Every other path records the
    /// last sample (or `false` if the host was already stopped) and returns it.
    pub async fn wait_for_state(&self, request: &WaitRequest) -> Result<WaitOutcome, WaitError> {
        let endstop = self.resolver.lookup(&request.endstop).ok_or_else(|| {
            tracing::warn!("Unknown endstop '{}'", request.endstop);
            WaitError::UnknownEndstop { name: request.endstop.clone() }
        })?;

        let dwell = self.dwell.dwell_for(request.max_attempts);
        let mut eventtime = self.time.now_monotonic();
        let mut attempts: u32 = 0;
        let mut last_sample = None;

        let reason = loop {
            if !self.host.is_operating() {
                break WaitTermination::HostStopped;
            }
            attempts = attempts.saturating_add(1);
            let is_triggered = endstop.query(eventtime);
            last_sample = Some(is_triggered);
            tracing::trace!(
                "Check #{} of {} endstop: {}",
                attempts,
                request.endstop,
                if is_triggered { "Triggered" } else { "Not Triggered" }
            );

            if is_triggered == request.triggered {
                break WaitTermination::Matched;
            }
            if let Some(max) = request.max_attempts {
                if attempts >= max.get() {
                    break WaitTermination::Exhausted;
                }
            }
            eventtime = self.time.sleep_until(eventtime + dwell).await;
        };

        let final_triggered = last_sample.unwrap_or(false);
        self.store.record(&request.endstop, final_triggered);
        tracing::debug!(
            "Endstop {} {} after {} checks ({:?})",
            request.endstop,
            if final_triggered { "Triggered" } else { "Not Triggered" },
            attempts,
            reason
        );

        Ok(WaitOutcome {
            endstop: request.endstop.clone(),
            final_triggered,
            reason,
            attempts,
        })
    }

    /// Entry point for the command layer: `triggered` defaults to true and
    /// `attempts = None` waits without a budget.
    pub async fn query_endstop(
        &self,
        endstop: &str,
        triggered: Option<bool>,
        attempts: Option<NonZeroU32>,
    ) -> Result<(), WaitError> {
        let request = WaitRequest::new(endstop, triggered.unwrap_or(true), attempts);
        self.wait_for_state(&request).await.map(|_| ())
    }

    pub fn get_last_state(&self, endstop: &str) -> Option<bool> {
        self.store.get(endstop)
    }

    pub fn get_status(&self) -> EndstopStatus {
        EndstopStatus {
            last_endstop_query: self.store.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::{EndstopRegistry, ScriptedEndstop};
    use crate::host_os::{HostState, LivenessPolicy, PrinterHost};
    use crate::scheduler::SimClock;

    fn waiter_with(endstop: ScriptedEndstop) -> (EndstopWaiter, Arc<ScriptedEndstop>, SimClock) {
        let endstop = Arc::new(endstop);
        let mut registry = EndstopRegistry::new();
        registry.register("probe", endstop.clone());
        let clock = SimClock::new();
        let host = PrinterHost::new(HostState::Ready, LivenessPolicy::NotShutdown);
        let waiter = EndstopWaiter::new(Arc::new(registry), Arc::new(clock.clone()), Arc::new(host));
        (waiter, endstop, clock)
    }

    #[test]
    fn test_dwell_depends_only_on_mode() {
        let policy = DwellPolicy::default();
        assert_eq!(policy.dwell_for(None), 1.0);
        assert_eq!(policy.dwell_for(NonZeroU32::new(1)), 0.1);
        assert_eq!(policy.dwell_for(NonZeroU32::new(u32::MAX)), 0.1);
    }

    #[tokio::test]
    async fn test_single_attempt_can_match() {
        let (waiter, endstop, clock) = waiter_with(ScriptedEndstop::constant(true));
        let outcome = waiter
            .wait_for_state(&WaitRequest::bounded("probe", true, NonZeroU32::MIN))
            .await
            .unwrap();
        assert_eq!(outcome.reason, WaitTermination::Matched);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(endstop.query_count(), 1);
        assert_eq!(clock.sleep_count(), 0);
    }

    #[tokio::test]
    async fn test_single_attempt_exhausts_without_sleeping() {
        let (waiter, endstop, clock) = waiter_with(ScriptedEndstop::constant(false));
        let outcome = waiter
            .wait_for_state(&WaitRequest::bounded("probe", true, NonZeroU32::MIN))
            .await
            .unwrap();
        assert_eq!(outcome.reason, WaitTermination::Exhausted);
        assert!(!outcome.final_triggered);
        assert_eq!(endstop.query_count(), 1);
        assert_eq!(clock.sleep_count(), 0);
    }

    #[tokio::test]
    async fn test_query_endstop_defaults_to_triggered() {
        let (waiter, endstop, _clock) = waiter_with(ScriptedEndstop::new(vec![false, false, true], false));
        waiter.query_endstop("probe", None, None).await.unwrap();
        assert_eq!(endstop.query_count(), 3);
        assert_eq!(waiter.get_last_state("probe"), Some(true));
    }

    #[tokio::test]
    async fn test_custom_dwell_policy() {
        let (waiter, _endstop, clock) = waiter_with(ScriptedEndstop::constant(false));
        let waiter = waiter.with_dwell(DwellPolicy { bounded: 0.5, continuous: 2.0 });
        waiter
            .wait_for_state(&WaitRequest::bounded("probe", true, NonZeroU32::new(3).unwrap()))
            .await
            .unwrap();
        assert_eq!(clock.wake_requests(), vec![0.5, 1.0]);
    }
}
