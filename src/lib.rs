// endstop_host: endstop wait primitive for the printer host

pub mod config;
pub mod endstop_wait;
pub mod hardware;
pub mod host_os;
pub mod scheduler;

// Re-export main types for convenience
pub use config::{Config, ConfigError, load_config};
pub use endstop_wait::{
    EndstopStatus, EndstopWaiter, LastStateStore, WaitError, WaitOutcome, WaitRequest,
    WaitTermination,
};
pub use hardware::{EndstopHandle, EndstopRegistry, EndstopResolver};
pub use host_os::{HostLiveness, HostState, LivenessPolicy, PrinterHost};
pub use scheduler::{SimClock, TimeInterface, TokioReactor};
