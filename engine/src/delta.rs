// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The writes turning an observed subtree into a desired one

use gnmi::{Path, proto};
use std::fmt::Display;

/// A leaf update: an absolute path and its wire-encoded value
#[derive(Clone, Debug, PartialEq)]
pub struct PathUpdate {
    pub path: Path,
    pub value: proto::TypedValue,
}

impl PathUpdate {
    /// The JSON text of the value, for logs.
    #[must_use]
    pub fn value_text(&self) -> String {
        use proto::typed_value::Value;
        match &self.value.value {
            Some(Value::JsonIetfVal(bytes) | Value::JsonVal(bytes)) => {
                String::from_utf8_lossy(bytes).into_owned()
            }
            Some(other) => other.kind().to_string(),
            None => "nothing".to_string(),
        }
    }
}

/// Deletes and updates, all with absolute paths. Deletes are applied before updates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Delta {
    pub deletes: Vec<Path>,
    pub updates: Vec<PathUpdate>,
}

impl Delta {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.updates.is_empty()
    }

    /// Total number of paths written
    #[must_use]
    pub fn len(&self) -> usize {
        self.deletes.len() + self.updates.len()
    }
}

impl Display for Delta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for path in &self.deletes {
            writeln!(f, " delete {path}")?;
        }
        for update in &self.updates {
            writeln!(f, " update {} = {}", update.path, update.value_text())?;
        }
        Ok(())
    }
}
