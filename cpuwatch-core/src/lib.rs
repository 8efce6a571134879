//! cpuwatch core library
//!
//! Agentless CPU utilization watcher for AIX hosts: samples `vmstat`
//! over SSH on a fixed interval, evaluates the computed usage percent
//! against a threshold, and emits structured events onto a channel for a
//! downstream rule engine. Per-host failures are isolated — one
//! unreachable host never stalls or crashes monitoring of the others.
//!
//! # Crate Structure
//!
//! - [`config`] - Host specs and poll settings, TOML loading, validation
//! - [`session`] - Persistent per-host SSH execution (control master)
//! - [`sampler`] - `vmstat` output parsing into CPU readings
//! - [`threshold`] - Pure crossing/emission decision
//! - [`event`] - Sample and error event shapes (the wire contract)
//! - [`watcher`] - The tick scheduler: fan out, join, sleep, shutdown
//! - [`error`] - Failure taxonomy shared by all of the above

// Enable missing_docs warning for public API documentation
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod event;
pub mod sampler;
pub mod session;
pub mod threshold;
pub mod watcher;

pub use config::{HostSpec, WatchConfig, WatchSettings};
pub use error::{WatchError, WatchResult};
pub use event::{CpuMetrics, ERROR_SEVERITY, SOURCE_NAME, WatchEvent};
pub use sampler::{CpuReading, parse_vmstat};
pub use session::{RemoteSession, SshSession, ssh_session_factory};
pub use threshold::{Crossing, evaluate};
pub use watcher::{WatcherHandle, poll_once, start_watcher};
