// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Testing utilities for the configuration engine: a schema fixture modelled on the NX-OS NTP
//! configuration and an in-memory gNMI device.

pub mod device;
pub mod nxos;

pub use device::{FakeDevice, Missing};

use std::future::Future;

/// Run a future to completion on a fresh current-thread runtime. For use in property tests,
/// whose closures are synchronous.
pub fn block_on<F: Future>(future: F) -> F::Output {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    runtime.block_on(future)
}
