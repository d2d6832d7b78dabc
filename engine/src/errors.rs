// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Errors of the synchronization engine. Every variant names the operation or path it concerns,
//! so that callers can log them verbatim.

use gnmi::GnmiError;
use schema::SchemaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The path is valid but nothing is configured there. An expected outcome.
    #[error("No value configured at '{path}'")]
    ValueNil { path: String },

    /// The device answered with a section for some other path than the one requested.
    #[error("No response section matches '{path}'")]
    NotFound { path: String },

    #[error("Protocol violation in {op} '{path}': {reason}")]
    ProtocolViolation {
        op: &'static str,
        path: String,
        reason: String,
    },

    #[error("Cannot diff at '{path}': {reason}")]
    DiffComputationFailed { path: String, reason: String },

    #[error("Value of kind {kind} at '{path}' cannot be encoded as JSON")]
    UnsupportedValueKind { kind: &'static str, path: String },

    #[error("Write {chunk}/{total} ({what} starting at '{first}') failed: {source}")]
    Apply {
        chunk: usize,
        total: usize,
        what: &'static str,
        first: String,
        #[source]
        source: GnmiError,
    },

    #[error("{op} '{path}': {source}")]
    Schema {
        op: &'static str,
        path: String,
        #[source]
        source: SchemaError,
    },

    #[error("Operation {index} ({op} '{path}') failed: {source}")]
    Operation {
        index: usize,
        op: &'static str,
        path: String,
        #[source]
        source: Box<SyncError>,
    },

    #[error(transparent)]
    Gnmi(#[from] GnmiError),

    #[error("Invalid parameters: {0}")]
    Params(String),
}

impl SyncError {
    #[must_use]
    pub fn is_value_nil(&self) -> bool {
        matches!(self, SyncError::ValueNil { .. })
    }
}
