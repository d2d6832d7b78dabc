// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! gNMI plumbing: wire messages, configuration paths, JSON value encodings, the transport
//! abstraction and capability negotiation.

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

pub mod capabilities;
pub mod encoding;
pub mod errors;
pub mod path;
pub mod proto;
pub mod transport;

pub use capabilities::{Capabilities, ModelId, RequiredModel, negotiate};
pub use encoding::Encoding;
pub use errors::GnmiError;
pub use path::{Path, PathElem};
pub use transport::{Credentials, GnmiTransport, GrpcTransport};

use tracectl::trace_target;
trace_target!("gnmi", LevelFilter::INFO, &["gnmi", "device"]);
