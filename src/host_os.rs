// src/host_os.rs - Host run state and liveness predicate
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Run state of the surrounding printer host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HostState {
    Startup,
    Ready,
    Shutdown,
    Disconnect,
}

/// Which host states count as "still operating" for a pending wait.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LivenessPolicy {
    /// Anything except `Shutdown`.
    #[default]
    NotShutdown,
    /// Only `Ready`.
    RequireReady,
}

impl LivenessPolicy {
    pub fn is_operating(self, state: HostState) -> bool {
        match self {
            LivenessPolicy::NotShutdown => state != HostState::Shutdown,
            LivenessPolicy::RequireReady => state == HostState::Ready,
        }
    }
}

/// Liveness query consumed by the endstop waiter. Must not block or suspend.
pub trait HostLiveness: Send + Sync {
    fn is_operating(&self) -> bool;
}

/// Publishes the host state to any number of observers.
#[derive(Debug)]
pub struct PrinterHost {
    state_tx: watch::Sender<HostState>,
    policy: LivenessPolicy,
}

impl PrinterHost {
    pub fn new(initial: HostState, policy: LivenessPolicy) -> Self {
        let (state_tx, _) = watch::channel(initial);
        Self { state_tx, policy }
    }

    pub fn state(&self) -> HostState {
        *self.state_tx.borrow()
    }

    pub fn policy(&self) -> LivenessPolicy {
        self.policy
    }

    pub fn set_state(&self, state: HostState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            tracing::info!("Host state {:?} -> {:?}", previous, state);
        }
    }

    /// Move to `Shutdown`, logging the reason.
    pub fn request_shutdown(&self, reason: &str) {
        tracing::warn!("Host shutdown requested: {}", reason);
        self.set_state(HostState::Shutdown);
    }

    pub fn subscribe(&self) -> watch::Receiver<HostState> {
        self.state_tx.subscribe()
    }
}

impl HostLiveness for PrinterHost {
    fn is_operating(&self) -> bool {
        self.policy.is_operating(self.state())
    }
}
