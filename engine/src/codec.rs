// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Wire encoding of leaf values.
//!
//! Leaf updates carry their value as a JSON scalar inside the negotiated JSON encoding, never as
//! a native gNMI scalar: that is what the device expects for single-leaf writes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use gnmi::{Encoding, Path, proto};
use schema::Value;

use crate::errors::SyncError;

fn unsupported(value: &Value, path: &Path) -> SyncError {
    SyncError::UnsupportedValueKind {
        kind: value.kind(),
        path: path.to_string(),
    }
}

/// JSON rendition of the scalar `value` of the leaf at `path`.
///
/// Bytes become a base64 string; enumerations their name. Leaf-lists, decimals, `anydata` and
/// non-finite floats have no scalar rendition and are rejected.
pub fn scalar_to_json(path: &Path, value: &Value) -> Result<Vec<u8>, SyncError> {
    let json = match value {
        Value::String(s) | Value::Enum(s) => serde_json::to_vec(s),
        Value::Int(v) => serde_json::to_vec(v),
        Value::Uint(v) => serde_json::to_vec(v),
        Value::Bool(v) => serde_json::to_vec(v),
        Value::Bytes(b) => serde_json::to_vec(&BASE64.encode(b)),
        Value::Float(v) if v.is_finite() => serde_json::to_vec(v),
        Value::Double(v) if v.is_finite() => serde_json::to_vec(v),
        Value::Float(_)
        | Value::Double(_)
        | Value::LeafList(_)
        | Value::Decimal { .. }
        | Value::Any(_) => return Err(unsupported(value, path)),
    };
    json.map_err(|_| unsupported(value, path))
}

/// [`scalar_to_json`], wrapped in the [`proto::TypedValue`] variant of `encoding`.
pub fn scalar_to_wire(
    path: &Path,
    value: &Value,
    encoding: Encoding,
) -> Result<proto::TypedValue, SyncError> {
    Ok(encoding.encode(scalar_to_json(path, value)?))
}
