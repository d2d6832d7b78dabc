// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Device client.
//!
//! A [`Client`] wraps a negotiated gNMI connection. Reads go through [`Client::get_json`], which
//! normalizes the many ways a device can say "nothing here" into [`SyncError::ValueNil`]; writes
//! go through the [`Dispatcher`], honouring the configured [`ApplyParams`].

use gnmi::proto::{DataType, GetRequest, GetResponse};
use gnmi::{
    Capabilities, Credentials, Encoding, GnmiError, GnmiTransport, GrpcTransport, Path,
    RequiredModel, negotiate, proto,
};
use schema::{Node, SchemaError, Tree, validate};
use serde::de::DeserializeOwned;
use tonic::Code;
#[allow(unused)]
use tracing::{debug, error, info, warn};

use crate::delta::Delta;
use crate::diff::diff;
use crate::dispatch::Dispatcher;
use crate::errors::SyncError;
use crate::params::{ApplyParams, ConnectParams};

/// A connection to a device, with its negotiated encoding
pub struct Client<T = GrpcTransport> {
    transport: T,
    capabilities: Capabilities,
    encoding: Encoding,
    apply: ApplyParams,
}

impl Client<GrpcTransport> {
    /// Connect to the device described by `params` and negotiate capabilities.
    pub async fn connect(params: &ConnectParams) -> Result<Self, SyncError> {
        let credentials = match (&params.username, &params.password) {
            (Some(username), password) => Some(Credentials::new(
                username,
                password.as_deref().unwrap_or_default(),
            )?),
            (None, Some(_)) => {
                return Err(SyncError::Params(
                    "a password was given without a username".to_string(),
                ));
            }
            (None, None) => None,
        };
        let transport =
            GrpcTransport::connect(&params.target, params.timeout, credentials).await?;
        Self::negotiate(transport, params.required_model(), params.apply.clone()).await
    }
}

impl<T: GnmiTransport> Client<T> {
    /// Negotiate over an established transport.
    pub async fn negotiate(
        transport: T,
        required: Option<&RequiredModel>,
        apply: ApplyParams,
    ) -> Result<Self, SyncError> {
        let (capabilities, encoding) = negotiate(&transport, required).await?;
        Ok(Self {
            transport,
            capabilities,
            encoding,
            apply,
        })
    }

    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    #[must_use]
    pub fn apply_params(&self) -> &ApplyParams {
        &self.apply
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn dispatcher(&self) -> Dispatcher<'_, T> {
        Dispatcher::new(&self.transport, &self.apply)
    }

    /// Read the configuration at `path` as JSON in the negotiated encoding.
    ///
    /// A missing path, an empty response and an empty value all yield [`SyncError::ValueNil`].
    /// A response about some other path yields [`SyncError::NotFound`], and more than one
    /// notification or update yields [`SyncError::ProtocolViolation`].
    pub async fn get_json(&self, path: &Path) -> Result<Vec<u8>, SyncError> {
        let request = GetRequest {
            prefix: None,
            path: vec![proto::Path::from(path)],
            r#type: DataType::Config as i32,
            encoding: proto::Encoding::from(self.encoding) as i32,
        };
        debug!("Reading {path}");
        let response = match self.transport.get(request).await {
            Ok(response) => response,
            Err(status) if status.code() == Code::NotFound => {
                debug!("Nothing at {path}: {}", status.message());
                return Err(SyncError::ValueNil {
                    path: path.to_string(),
                });
            }
            Err(status) => {
                error!("Failed to read {path}: {status}");
                return Err(GnmiError::from_status("Get", path.to_string(), status).into());
            }
        };
        self.extract(path, response)
    }

    fn extract(&self, path: &Path, response: GetResponse) -> Result<Vec<u8>, SyncError> {
        let nil = || SyncError::ValueNil {
            path: path.to_string(),
        };
        let violation = |reason: String| SyncError::ProtocolViolation {
            op: "Get",
            path: path.to_string(),
            reason,
        };

        let mut notifications = response.notification.into_iter();
        let notification = match (notifications.next(), notifications.next()) {
            (None, _) => return Err(nil()),
            (Some(notification), None) => notification,
            (Some(_), Some(_)) => {
                return Err(violation(format!(
                    "{} notifications for a single path",
                    2 + notifications.count()
                )));
            }
        };
        let prefix = match &notification.prefix {
            Some(prefix) => Path::try_from(prefix)?,
            None => Path::root(),
        };
        let mut updates = notification.update.into_iter();
        let update = match (updates.next(), updates.next()) {
            (None, _) => return Err(nil()),
            (Some(update), None) => update,
            (Some(_), Some(_)) => {
                return Err(violation(format!(
                    "{} updates for a single path",
                    2 + updates.count()
                )));
            }
        };

        let answered = match &update.path {
            Some(p) => prefix.join(&Path::try_from(p)?)?,
            None => prefix,
        };
        if !answered.is_empty() && answered != *path {
            warn!("Asked for {path}, device answered about {answered}");
            return Err(SyncError::NotFound {
                path: path.to_string(),
            });
        }

        let Some(value) = &update.val else {
            return Err(nil());
        };
        let json = self.encoding.decode(value)?;
        match json.trim_ascii() {
            b"" | b"null" | b"{}" => Err(nil()),
            _ => Ok(json),
        }
    }

    /// Read and decode the configuration at `path`.
    pub async fn get<N: Node + DeserializeOwned>(&self, path: &Path) -> Result<N, SyncError> {
        let json = self.get_json(path).await?;
        serde_json::from_slice(&json).map_err(|source| SyncError::Schema {
            op: "Get",
            path: path.to_string(),
            source: SchemaError::Json {
                node: std::any::type_name::<N>(),
                source,
            },
        })
    }

    /// Read the configuration at `path` as a tree of the same type as `like`.
    pub async fn get_like(&self, path: &Path, like: &dyn Tree) -> Result<Box<dyn Tree>, SyncError> {
        let json = self.get_json(path).await?;
        like.decode_like(&json).map_err(|source| SyncError::Schema {
            op: "Get",
            path: path.to_string(),
            source,
        })
    }

    /// Replace the subtree at `path` with `tree`, which is validated first.
    pub async fn replace_subtree(&self, path: &Path, tree: &dyn Tree) -> Result<(), SyncError> {
        let schema_error = |source| SyncError::Schema {
            op: "Replace",
            path: path.to_string(),
            source,
        };
        validate(tree.as_node()).map_err(schema_error)?;
        let json = tree.to_json().map_err(schema_error)?;
        debug!("Replacing {path} with a {}", tree.type_name());
        self.dispatcher()
            .replace(path, self.encoding.encode(json))
            .await
    }

    /// Delete the subtree at `path`.
    pub async fn delete_subtree(&self, path: &Path) -> Result<(), SyncError> {
        debug!("Deleting {path}");
        self.dispatcher().delete(path).await
    }

    /// Write `delta` in bounded-size requests.
    pub async fn apply(&self, delta: &Delta) -> Result<(), SyncError> {
        self.dispatcher().apply(delta).await
    }

    /// Make the subtree at `path` match `desired`, leaving anything under `ignore` alone.
    /// Nothing configured at `path` counts as an empty tree. Returns the delta written.
    pub async fn edit(
        &self,
        path: &Path,
        desired: &dyn Tree,
        ignore: &[Path],
    ) -> Result<Delta, SyncError> {
        validate(desired.as_node()).map_err(|source| SyncError::Schema {
            op: "Edit",
            path: path.to_string(),
            source,
        })?;
        let observed = match self.get_like(path, desired).await {
            Ok(observed) => observed,
            Err(SyncError::ValueNil { .. }) => {
                debug!("Nothing configured at {path} yet");
                desired.empty_like()
            }
            Err(e) => return Err(e),
        };
        let delta = diff(
            path,
            observed.as_node(),
            desired.as_node(),
            ignore,
            self.encoding,
        )?;
        if delta.is_empty() {
            debug!("{path} is up to date");
        } else {
            info!("Updating {path}:\n{delta}");
        }
        self.apply(&delta).await?;
        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::Client;
    use crate::errors::SyncError;
    use crate::params::ApplyParams;
    use gnmi::proto::{GetResponse, Notification, Update};
    use gnmi::{Encoding, Path, RequiredModel, proto};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_utils::nxos::{SRC_IF_ITEMS, SrcIfItems, TIME_ITEMS, TimeItems};
    use test_utils::{FakeDevice, Missing};
    use tonic::Status;
    use tracing_test::traced_test;

    async fn client(device: FakeDevice) -> Client<FakeDevice> {
        Client::negotiate(device, None, ApplyParams::default())
            .await
            .unwrap()
    }

    fn path(p: &str) -> Path {
        Path::parse(p).unwrap()
    }

    fn notification(updates: Vec<Update>) -> Notification {
        Notification {
            update: updates,
            ..Default::default()
        }
    }

    fn update(p: &str, json: &[u8]) -> Update {
        Update {
            path: Some(proto::Path::from(&path(p))),
            val: Some(Encoding::JsonIetf.encode(json.to_vec())),
            duplicates: 0,
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn negotiation_rejects_other_model_versions() {
        let device = FakeDevice::nxos().with_model_version("2022-08-10");
        let required = RequiredModel::new("Cisco-NX-OS-device", "2024-03-26");
        let err = Client::negotiate(device, Some(&required), ApplyParams::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SyncError::Gnmi(gnmi::GnmiError::UnsupportedDevice { .. })));
    }

    #[tokio::test]
    #[traced_test]
    async fn reads_configured_subtree() {
        let device = FakeDevice::nxos().with_config_at(SRC_IF_ITEMS, json!({"srcIf": "mgmt0"}));
        let client = client(device).await;
        assert_eq!(client.encoding(), Encoding::JsonIetf);

        let items: SrcIfItems = client.get(&path(SRC_IF_ITEMS)).await.unwrap();
        assert_eq!(items.src_if.as_deref(), Some("mgmt0"));

        let request = &client.transport().gets()[0];
        assert_eq!(request.encoding, proto::Encoding::JsonIetf as i32);
        assert_eq!(request.r#type, proto::DataType::Config as i32);
    }

    #[tokio::test]
    #[traced_test]
    async fn absent_paths_are_value_nil() {
        for missing in [
            Missing::EmptyNotification,
            Missing::NoNotification,
            Missing::NotFoundStatus,
        ] {
            let client = client(FakeDevice::nxos().with_missing(missing)).await;
            let err = client.get_json(&path(SRC_IF_ITEMS)).await.unwrap_err();
            assert!(err.is_value_nil(), "{missing:?}: {err}");
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn empty_container_is_value_nil() {
        let device = FakeDevice::nxos().with_config_at(SRC_IF_ITEMS, json!({}));
        let client = client(device).await;
        let err = client.get::<SrcIfItems>(&path(SRC_IF_ITEMS)).await.unwrap_err();
        assert!(err.is_value_nil(), "{err}");
    }

    #[tokio::test]
    #[traced_test]
    async fn multiple_sections_are_a_protocol_violation() {
        let client = client(FakeDevice::nxos()).await;
        let two = update(SRC_IF_ITEMS, br#"{"srcIf":"mgmt0"}"#);

        client.transport().answer_gets_with(Ok(GetResponse {
            notification: vec![notification(vec![two.clone()]), notification(vec![])],
        }));
        let err = client.get_json(&path(SRC_IF_ITEMS)).await.unwrap_err();
        assert!(matches!(err, SyncError::ProtocolViolation { op: "Get", .. }), "{err}");

        client.transport().answer_gets_with(Ok(GetResponse {
            notification: vec![notification(vec![two.clone(), two])],
        }));
        let err = client.get_json(&path(SRC_IF_ITEMS)).await.unwrap_err();
        assert!(err.to_string().contains("2 updates"), "{err}");
    }

    #[tokio::test]
    #[traced_test]
    async fn answer_about_another_path_is_not_found() {
        let client = client(FakeDevice::nxos()).await;
        client.transport().answer_gets_with(Ok(GetResponse {
            notification: vec![notification(vec![update(TIME_ITEMS, b"{}")])],
        }));
        let err = client.get_json(&path(SRC_IF_ITEMS)).await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound { .. }), "{err}");
    }

    #[tokio::test]
    #[traced_test]
    async fn answer_under_a_prefix_is_accepted() {
        let client = client(FakeDevice::nxos()).await;
        client.transport().answer_gets_with(Ok(GetResponse {
            notification: vec![Notification {
                prefix: Some(proto::Path::from(&path(TIME_ITEMS))),
                update: vec![update("srcIf-items", br#"{"srcIf":"lo0"}"#)],
                ..Default::default()
            }],
        }));
        let json = client.get_json(&path(SRC_IF_ITEMS)).await.unwrap();
        assert_eq!(json, br#"{"srcIf":"lo0"}"#.to_vec());
    }

    #[tokio::test]
    #[traced_test]
    async fn wrong_value_type_is_reported() {
        let client = client(FakeDevice::nxos()).await;
        client.transport().answer_gets_with(Ok(GetResponse {
            notification: vec![notification(vec![Update {
                path: Some(proto::Path::from(&path(SRC_IF_ITEMS))),
                val: Some(Encoding::Json.encode(b"{}".to_vec())),
                duplicates: 0,
            }])],
        }));
        let err = client.get_json(&path(SRC_IF_ITEMS)).await.unwrap_err();
        assert!(
            matches!(err, SyncError::Gnmi(gnmi::GnmiError::UnexpectedValueType { .. })),
            "{err}"
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn rpc_failures_are_classified() {
        let client = client(FakeDevice::nxos()).await;
        client
            .transport()
            .answer_gets_with(Err(Status::unavailable("link down")));
        let err = client.get_json(&path(SRC_IF_ITEMS)).await.unwrap_err();
        assert!(matches!(err, SyncError::Gnmi(gnmi::GnmiError::DeviceUnavailable(_))));

        client
            .transport()
            .answer_gets_with(Err(Status::permission_denied("read-only user")));
        let err = client.get_json(&path(SRC_IF_ITEMS)).await.unwrap_err();
        assert!(matches!(err, SyncError::Gnmi(gnmi::GnmiError::Rpc { op: "Get", .. })));
    }

    #[tokio::test]
    #[traced_test]
    async fn replace_validates_then_writes() {
        let client = client(FakeDevice::nxos()).await;
        let time = TimeItems {
            logging: Some("enabled".to_string()),
            ..Default::default()
        };
        client.replace_subtree(&path(TIME_ITEMS), &time).await.unwrap();
        assert_eq!(
            client.transport().config_at(TIME_ITEMS),
            Some(json!({"logging": "enabled"}))
        );

        let mut bad = test_utils::nxos::ntp_server("10.0.0.1");
        bad.min_poll = Some(9);
        let time = TimeItems::with_servers([bad]);
        let err = client
            .replace_subtree(&path(TIME_ITEMS), &time)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Schema { op: "Replace", .. }), "{err}");
        assert_eq!(client.transport().sets().len(), 1);
    }
}
