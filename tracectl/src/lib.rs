// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Runtime control of tracing levels for the switch configuration crates.
//!
//! Each crate declares its tracing target once with [`trace_target!`]. The declarations are
//! collected at link time and turned into a reloadable [`EnvFilter`] owned by
//! [`TracingControl`], so that log levels can be changed per tag while running.
//!
//! [`EnvFilter`]: tracing_subscriber::EnvFilter

pub mod control;
pub mod display;
pub mod targets;

pub use tracing_subscriber::filter::LevelFilter;

// re-exports
pub use control::{TraceCtlError, TracingControl, get_trace_ctl};
