// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Configuration synchronization engine.
//!
//! Given the desired state of parts of a device configuration tree, compute and issue the gNMI
//! writes that make the device match it, leaving the rest of the tree alone:
//!
//! * [`diff`] computes the minimal [`Delta`] between an observed and a desired subtree.
//! * [`Client`] reads subtrees, replaces them, and applies deltas in bounded-size writes.
//! * [`Client::synchronize`] runs the ordered [`Operation`]s declared by a [`DesiredConfig`].

#![deny(
    unsafe_code,
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod client;
pub mod codec;
pub mod delta;
pub mod diff;
pub mod dispatch;
pub mod errors;
pub mod params;
pub mod sync;

pub use client::Client;
pub use delta::{Delta, PathUpdate};
pub use diff::diff;
pub use errors::SyncError;
pub use params::{ApplyParams, ApplyParamsBuilder, ConnectParams, ConnectParamsBuilder};
pub use sync::{ConfigReader, DesiredConfig, Operation, Removal};

use tracectl::trace_target;
trace_target!("engine", LevelFilter::INFO, &["engine", "device"]);
