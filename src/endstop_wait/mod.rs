//! # Endstop Wait
//!
//! Suspend a caller until a named endstop reaches a desired state, sampling it
//! at a fixed dwell: `bounded_dwell` when an attempt budget is given, and
//! `continuous_dwell` when waiting without one. Each completed wait records its
//! last sample in a [`LastStateStore`] shared with status readers.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::num::NonZeroU32;
//! use std::sync::Arc;
//! use endstop_host::endstop_wait::{EndstopWaiter, WaitRequest};
//! use endstop_host::hardware::{EndstopRegistry, MirroredEndstop};
//! use endstop_host::host_os::{HostState, LivenessPolicy, PrinterHost};
//! use endstop_host::scheduler::TokioReactor;
//!
//! # async fn run() -> Result<(), endstop_host::endstop_wait::WaitError> {
//! let mut registry = EndstopRegistry::new();
//! registry.register("probe", Arc::new(MirroredEndstop::new("PA1", false, false)));
//! let waiter = EndstopWaiter::new(
//!     Arc::new(registry),
//!     Arc::new(TokioReactor::new()),
//!     Arc::new(PrinterHost::new(HostState::Ready, LivenessPolicy::NotShutdown)),
//! );
//! let request = WaitRequest::new("probe", false, NonZeroU32::new(5));
//! let outcome = waiter.wait_for_state(&request).await?;
//! assert_eq!(waiter.get_last_state("probe"), Some(outcome.final_triggered));
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod store;

use serde::Serialize;
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use thiserror::Error;

pub use controller::{DwellPolicy, EndstopWaiter};
pub use store::LastStateStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaitError {
    #[error("Unknown endstop '{name}'")]
    UnknownEndstop { name: String },
}

/// One wait invocation. `max_attempts = None` waits without a budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitRequest {
    pub endstop: String,
    pub triggered: bool,
    pub max_attempts: Option<NonZeroU32>,
}

impl WaitRequest {
    pub fn new(endstop: impl Into<String>, triggered: bool, max_attempts: Option<NonZeroU32>) -> Self {
        Self {
            endstop: endstop.into(),
            triggered,
            max_attempts,
        }
    }

    pub fn continuous(endstop: impl Into<String>, triggered: bool) -> Self {
        Self::new(endstop, triggered, None)
    }

    pub fn bounded(endstop: impl Into<String>, triggered: bool, attempts: NonZeroU32) -> Self {
        Self::new(endstop, triggered, Some(attempts))
    }

    pub fn is_bounded(&self) -> bool {
        self.max_attempts.is_some()
    }
}

/// Why the sampling loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitTermination {
    Matched,
    Exhausted,
    HostStopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitOutcome {
    pub endstop: String,
    pub final_triggered: bool,
    pub reason: WaitTermination,
    /// Samples taken during this wait.
    pub attempts: u32,
}

/// Status snapshot, serialized as `{"last_endstop_query": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EndstopStatus {
    pub last_endstop_query: BTreeMap<String, bool>,
}
