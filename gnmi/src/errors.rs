// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Errors of the gNMI layer

use thiserror::Error;
use tonic::{Code, Status};

#[derive(Debug, Error)]
pub enum GnmiError {
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Device offers no supported encoding (offered: {0})")]
    UnsupportedEncoding(String),

    #[error("Device does not report model '{name}' at version '{version}'")]
    UnsupportedDevice { name: String, version: String },

    #[error("Unexpected value type: expected {expected}, got {got}")]
    UnexpectedValueType {
        expected: &'static str,
        got: &'static str,
    },

    #[error("{op} failed for '{path}': {status}")]
    Rpc {
        op: &'static str,
        path: String,
        #[source]
        status: Box<Status>,
    },

    #[error("Invalid transport settings: {0}")]
    Transport(String),
}

impl GnmiError {
    /// Classify a gRPC failure of `op` on `path`. Unreachability is reported as
    /// [`GnmiError::DeviceUnavailable`] so that callers can tell it apart from rejections.
    #[must_use]
    pub fn from_status(op: &'static str, path: impl Into<String>, status: Status) -> Self {
        match status.code() {
            Code::Unavailable => GnmiError::DeviceUnavailable(format!(
                "{op} on '{}': {}",
                path.into(),
                status.message()
            )),
            _ => GnmiError::Rpc {
                op,
                path: path.into(),
                status: Box::new(status),
            },
        }
    }

    /// The gRPC status code of an RPC failure, if this error is one.
    #[must_use]
    pub fn code(&self) -> Option<Code> {
        match self {
            GnmiError::Rpc { status, .. } => Some(status.code()),
            GnmiError::DeviceUnavailable(_) => Some(Code::Unavailable),
            _ => None,
        }
    }
}
