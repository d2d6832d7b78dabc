// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Invalid {node} at '{path}': {reason}")]
    Validation {
        node: &'static str,
        path: String,
        reason: String,
    },
    #[error("JSON (de)serialization of {node} failed: {source}")]
    Json {
        node: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
