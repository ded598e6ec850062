//! Admission control and adaptive pacing for calls to the remote catalog service.
//!
//! This crate holds the building blocks the gateway executor orchestrates:
//!
//! - [`ResponseTimeTracker`] - bounded history of recent successful latencies
//! - [`AdaptivePacer`] - the per-attempt pacing delay, driven by the tracker,
//!   the consecutive-error count and the cooldown state
//! - [`BackoffCurve`] - jittered exponential backoff between retries
//! - [`ConcurrencyGate`] - counting admission control with mutable capacity and
//!   an optional requests-per-minute quota
//! - [`CooldownMachine`] - the time-boxed state entered on server throttling
//! - [`GatewayConfig`] - TOML configuration for all of the above

mod backoff;
mod config;
mod cooldown;
mod delay;
mod gate;
mod tracker;

pub use backoff::{BackoffCurve, JitterRange};
pub use config::{
    BackoffConfig, ConcurrencyConfig, CooldownConfig, GatewayConfig, OperationTtlConfig,
    PacingConfig, RetryConfig,
};
pub use cooldown::{CooldownMachine, CooldownState, CooldownTransition, TransitionListener};
pub use delay::{AdaptivePacer, DelayInputs};
pub use gate::{ConcurrencyGate, GatePermit};
pub use tracker::ResponseTimeTracker;
