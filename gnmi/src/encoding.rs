// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! JSON value encodings.
//!
//! Two JSON flavours are spoken: `JSON_IETF` (RFC 7951, module-qualified member names) and
//! plain `JSON`. They are not interchangeable on the wire, so a connection settles on one of
//! them during capability negotiation and every value it sends or reads must use it.

use std::fmt::Display;

use crate::errors::GnmiError;
use crate::proto;
use crate::proto::typed_value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Encoding {
    JsonIetf,
    Json,
}

impl Encoding {
    /// Encodings we can speak, most preferred first.
    pub const PREFERENCE: [Encoding; 2] = [Encoding::JsonIetf, Encoding::Json];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Encoding::JsonIetf => "json_ietf_val",
            Encoding::Json => "json_val",
        }
    }

    /// Wrap schema-compliant JSON bytes in the [`proto::TypedValue`] variant of this encoding.
    #[must_use]
    pub fn encode(self, json: Vec<u8>) -> proto::TypedValue {
        let value = match self {
            Encoding::JsonIetf => Value::JsonIetfVal(json),
            Encoding::Json => Value::JsonVal(json),
        };
        proto::TypedValue { value: Some(value) }
    }

    /// Extract the JSON bytes of a [`proto::TypedValue`], which must be of this encoding.
    pub fn decode(self, value: &proto::TypedValue) -> Result<Vec<u8>, GnmiError> {
        match (self, &value.value) {
            (Encoding::JsonIetf, Some(Value::JsonIetfVal(bytes)))
            | (Encoding::Json, Some(Value::JsonVal(bytes))) => Ok(bytes.clone()),
            (_, other) => Err(GnmiError::UnexpectedValueType {
                expected: self.as_str(),
                got: other.as_ref().map_or("nothing", Value::kind),
            }),
        }
    }
}

impl From<Encoding> for proto::Encoding {
    fn from(encoding: Encoding) -> Self {
        match encoding {
            Encoding::JsonIetf => proto::Encoding::JsonIetf,
            Encoding::Json => proto::Encoding::Json,
        }
    }
}

impl TryFrom<proto::Encoding> for Encoding {
    type Error = proto::Encoding;
    fn try_from(encoding: proto::Encoding) -> Result<Self, Self::Error> {
        match encoding {
            proto::Encoding::JsonIetf => Ok(Encoding::JsonIetf),
            proto::Encoding::Json => Ok(Encoding::Json),
            other => Err(other),
        }
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encoding::JsonIetf => write!(f, "JSON_IETF"),
            Encoding::Json => write!(f, "JSON"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Encoding;
    use crate::errors::GnmiError;
    use crate::proto::TypedValue;
    use crate::proto::typed_value::Value;

    #[test]
    fn encode_picks_variant() {
        let v = Encoding::Json.encode(b"true".to_vec());
        assert_eq!(v.value, Some(Value::JsonVal(b"true".to_vec())));
        let v = Encoding::JsonIetf.encode(b"true".to_vec());
        assert_eq!(v.value, Some(Value::JsonIetfVal(b"true".to_vec())));
        assert_eq!(Encoding::JsonIetf.decode(&v).unwrap(), b"true".to_vec());
    }

    #[test]
    fn decode_rejects_other_variant() {
        let v = Encoding::Json.encode(b"{}".to_vec());
        let err = Encoding::JsonIetf.decode(&v).unwrap_err();
        assert!(matches!(
            err,
            GnmiError::UnexpectedValueType {
                expected: "json_ietf_val",
                got: "json_val"
            }
        ));

        let empty = TypedValue { value: None };
        assert!(Encoding::Json.decode(&empty).is_err());
        let ascii = TypedValue {
            value: Some(Value::AsciiVal("x".to_string())),
        };
        assert!(Encoding::Json.decode(&ascii).is_err());
    }
}
