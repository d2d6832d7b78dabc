// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Capability negotiation.
//!
//! Negotiation is a single exchange with no internal retries: the device is asked for its
//! capabilities, an encoding is picked from [`Encoding::PREFERENCE`] and, unless disabled, the
//! device is checked to run the schema model release we were built against. The outcome is fixed
//! for the lifetime of the connection.

use std::collections::BTreeSet;
use tracing::{debug, error, info};

use crate::encoding::Encoding;
use crate::errors::GnmiError;
use crate::proto::{self, CapabilityRequest};
use crate::transport::GnmiTransport;

/// A schema model reported by a device
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId {
    pub name: String,
    pub organization: String,
    pub version: String,
}

impl From<&proto::ModelData> for ModelId {
    fn from(model: &proto::ModelData) -> Self {
        Self {
            name: model.name.clone(),
            organization: model.organization.clone(),
            version: model.version.clone(),
        }
    }
}

/// The model (name and version) a device must report to be managed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequiredModel {
    pub name: String,
    pub version: String,
}

impl RequiredModel {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// What a device reported at connection time. Immutable once negotiated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capabilities {
    encodings: BTreeSet<proto::Encoding>,
    models: BTreeSet<ModelId>,
    gnmi_version: String,
}

impl Capabilities {
    #[must_use]
    pub fn supports_encoding(&self, encoding: Encoding) -> bool {
        self.encodings.contains(&encoding.into())
    }

    /// True if the device reports a model with this name and version, whatever its organization.
    #[must_use]
    pub fn supports_model(&self, name: &str, version: &str) -> bool {
        self.models
            .iter()
            .any(|m| m.name == name && m.version == version)
    }

    pub fn encodings(&self) -> impl Iterator<Item = proto::Encoding> + '_ {
        self.encodings.iter().copied()
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelId> {
        self.models.iter()
    }

    #[must_use]
    pub fn gnmi_version(&self) -> &str {
        &self.gnmi_version
    }

    /// The most preferred encoding both sides support.
    #[must_use]
    pub fn select_encoding(&self) -> Option<Encoding> {
        Encoding::PREFERENCE
            .into_iter()
            .find(|e| self.supports_encoding(*e))
    }
}

impl From<&proto::CapabilityResponse> for Capabilities {
    fn from(response: &proto::CapabilityResponse) -> Self {
        Self {
            encodings: response.supported_encodings().collect(),
            models: response.supported_models.iter().map(ModelId::from).collect(),
            gnmi_version: response.g_nmi_version.clone(),
        }
    }
}

/// Negotiate with a device. Passing no `required` model skips the version check.
pub async fn negotiate<T: GnmiTransport + ?Sized>(
    transport: &T,
    required: Option<&RequiredModel>,
) -> Result<(Capabilities, Encoding), GnmiError> {
    debug!("Requesting device capabilities...");
    let response = transport
        .capabilities(CapabilityRequest {})
        .await
        .map_err(|status| GnmiError::from_status("Capabilities", "", status))?;
    let caps = Capabilities::from(&response);

    let Some(encoding) = caps.select_encoding() else {
        let offered = caps
            .encodings()
            .map(|e| format!("{e:?}"))
            .collect::<Vec<_>>()
            .join(",");
        error!("Device offers no usable encoding: [{offered}]");
        return Err(GnmiError::UnsupportedEncoding(offered));
    };

    if let Some(required) = required {
        if !caps.supports_model(&required.name, &required.version) {
            error!(
                "Device does not report model {} version {}",
                required.name, required.version
            );
            return Err(GnmiError::UnsupportedDevice {
                name: required.name.clone(),
                version: required.version.clone(),
            });
        }
    } else {
        debug!("Skipping model version check");
    }

    info!(
        "Negotiated encoding {encoding} (gNMI {}, {} models)",
        caps.gnmi_version,
        caps.models.len()
    );
    Ok((caps, encoding))
}

#[cfg(test)]
mod tests {
    use super::{RequiredModel, negotiate};
    use crate::encoding::Encoding;
    use crate::errors::GnmiError;
    use crate::proto::{self, CapabilityRequest, CapabilityResponse, ModelData};
    use crate::transport::GnmiTransport;
    use async_trait::async_trait;
    use tonic::Status;
    use tracing_test::traced_test;

    /// A device that only answers Capabilities
    struct CapsOnly(Result<CapabilityResponse, Status>);

    #[async_trait]
    impl GnmiTransport for CapsOnly {
        async fn capabilities(
            &self,
            _request: CapabilityRequest,
        ) -> Result<CapabilityResponse, Status> {
            self.0.clone()
        }
        async fn get(&self, _request: proto::GetRequest) -> Result<proto::GetResponse, Status> {
            Err(Status::unimplemented("get"))
        }
        async fn set(&self, _request: proto::SetRequest) -> Result<proto::SetResponse, Status> {
            Err(Status::unimplemented("set"))
        }
    }

    fn nxos(encodings: &[proto::Encoding]) -> CapsOnly {
        CapsOnly(Ok(CapabilityResponse {
            supported_models: vec![ModelData {
                name: "Cisco-NX-OS-device".to_string(),
                organization: "Cisco Systems, Inc.".to_string(),
                version: "2024-03-26".to_string(),
            }],
            supported_encodings: encodings.iter().map(|e| *e as i32).collect(),
            g_nmi_version: "0.5.0".to_string(),
        }))
    }

    #[tokio::test]
    #[traced_test]
    async fn picks_preferred_encoding() {
        let device = nxos(&[proto::Encoding::Json, proto::Encoding::JsonIetf]);
        let (caps, encoding) = negotiate(&device, None).await.unwrap();
        assert_eq!(encoding, Encoding::JsonIetf);
        assert!(caps.supports_encoding(Encoding::Json));
        assert_eq!(caps.gnmi_version(), "0.5.0");

        let device = nxos(&[proto::Encoding::Proto, proto::Encoding::Json]);
        let (_, encoding) = negotiate(&device, None).await.unwrap();
        assert_eq!(encoding, Encoding::Json);
    }

    #[tokio::test]
    #[traced_test]
    async fn fails_without_common_encoding() {
        let device = nxos(&[proto::Encoding::Proto, proto::Encoding::Ascii]);
        let err = negotiate(&device, None).await.unwrap_err();
        assert!(matches!(err, GnmiError::UnsupportedEncoding(offered) if offered == "Proto,Ascii"));
    }

    #[tokio::test]
    #[traced_test]
    async fn checks_required_model() {
        let device = nxos(&[proto::Encoding::Json]);
        let required = RequiredModel::new("Cisco-NX-OS-device", "2024-03-26");
        assert!(negotiate(&device, Some(&required)).await.is_ok());

        let required = RequiredModel::new("Cisco-NX-OS-device", "2021-01-01");
        let err = negotiate(&device, Some(&required)).await.unwrap_err();
        assert!(matches!(err, GnmiError::UnsupportedDevice { .. }));
    }

    #[tokio::test]
    #[traced_test]
    async fn unreachable_device() {
        let device = CapsOnly(Err(Status::unavailable("connection refused")));
        let err = negotiate(&device, None).await.unwrap_err();
        assert!(matches!(err, GnmiError::DeviceUnavailable(_)));

        let device = CapsOnly(Err(Status::permission_denied("bad password")));
        let err = negotiate(&device, None).await.unwrap_err();
        assert!(matches!(err, GnmiError::Rpc { op: "Capabilities", .. }));
    }
}
